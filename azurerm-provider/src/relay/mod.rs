//! Azure Relay resources
//!
//! - `ids` - typed resource IDs
//! - `models` - API request/response bodies
//! - `client` - Microsoft.Relay API calls
//! - `rights` - listen/send/manage mapping
//! - `validate` - name validators
//! - one module per resource type, plus `data_sources`

pub mod authorization_rule;
pub mod client;
pub mod data_sources;
pub mod hybrid_connection;
pub mod hybrid_connection_authorization_rule;
pub mod ids;
pub mod models;
pub mod namespace;
pub mod namespace_authorization_rule;
pub mod rights;
pub mod validate;
