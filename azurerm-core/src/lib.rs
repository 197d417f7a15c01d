//! Azure Relay provider core
//!
//! Resource model, attribute schemas, operation context and the planning
//! logic shared by the provider, the state store and the CLI.

pub mod context;
pub mod differ;
pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
