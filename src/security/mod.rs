//! Security module for agent-gateway.
//!
//! The gateway runs arbitrary programs on behalf of its callers, so the
//! HTTP surface can be locked down with bearer API keys.
//!
//! ## Example
//!
//! ```rust
//! use agent_gateway::security::ApiKeyStore;
//!
//! let auth = ApiKeyStore::with_keys(["my-secret-key"]);
//! assert!(auth.is_valid("my-secret-key"));
//! ```

pub mod auth;

pub use auth::{auth_middleware, ApiKeyStore};
