//! HTTP surface for agent-gateway.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check (never requires a key)
//! - `GET /api/v1/` - API information
//!
//! ### Commands
//! - `POST /api/v1/execute` - Run a program to completion
//!
//! ### Tunnels
//! - `GET /api/v1/tunnels` - List shared servers
//! - `POST /api/v1/tunnels` - Share a server and wait for its URL
//! - `DELETE /api/v1/tunnels/{name}` - Stop sharing a server
//!
//! ## Example
//!
//! ```no_run
//! use agent_gateway::api::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> agent_gateway::Result<()> {
//!     serve(ServerConfig::new("127.0.0.1", 6280)).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::AppState;
pub use router::{create_router, create_router_with_state, serve, serve_with_state, ServerConfig};
pub use types::{
    ErrorResponse, ExecuteCommandResponse, ListTunnelsResponse, ShareRequest, ShareResponse,
    StopResponse, TunnelSummary,
};
