//! Azure Resource Manager REST plumbing
//!
//! - `auth` - bearer token acquisition and caching
//! - `client` - request/response handling, long-running operations, paging
//! - `error` - transport and API error types
//! - `resourceids` - ARM resource identifier parsing

pub mod auth;
pub mod client;
pub mod error;
pub mod resourceids;

pub use auth::{ClientSecretCredential, StaticToken, TokenCredential};
pub use client::{ArmClient, ListResult};
pub use error::ArmError;
