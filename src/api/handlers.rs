//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::types::{
    ErrorResponse, ExecuteCommandResponse, ListTunnelsResponse, ShareRequest, ShareResponse,
    StopResponse, TunnelSummary,
};
use crate::config::Config;
use crate::error::GatewayError;
use crate::execution::{CommandExecutor, CommandInvocation};
use crate::security::ApiKeyStore;
use crate::tunnel::{ProcessRegistry, SharedTunnels, TunnelManager, TunnelSpec};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<CommandExecutor>,
    pub tunnels: Arc<TunnelManager>,
    pub auth: Arc<ApiKeyStore>,
    /// Program invoked for `share`.
    pub share_program: Arc<str>,
}

impl AppState {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let auth = if config.security.auth.enabled {
            ApiKeyStore::with_keys(config.security.auth.api_keys.iter().cloned())
        } else {
            ApiKeyStore::disabled()
        };

        Self {
            executor: Arc::new(config.command_executor()),
            tunnels: Arc::new(TunnelManager::new(
                Arc::new(ProcessRegistry::new()),
                config.tunnel_monitor(),
                config.executor.env.clone(),
            )),
            auth: Arc::new(auth),
            share_program: Arc::from(config.tunnel.program.as_str()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::DuplicateTunnel(_) => StatusCode::CONFLICT,
        GatewayError::TunnelNotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::StartFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::MonitorTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::MonitorProcessExit { .. } | GatewayError::ExecutionFailure { .. } => {
            StatusCode::BAD_GATEWAY
        }
        GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::Io(_) | GatewayError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: GatewayError) -> ApiError {
    (status_for(&err), Json(ErrorResponse::from(&err)))
}

fn bad_request(message: &str) -> ApiError {
    api_error(GatewayError::InvalidRequest(message.to_string()))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "agent-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Run one external command to completion.
pub async fn execute_command(
    State(state): State<AppState>,
    Json(invocation): Json<CommandInvocation>,
) -> Result<Json<ExecuteCommandResponse>, ApiError> {
    if invocation.program.trim().is_empty() {
        return Err(bad_request("program is required"));
    }

    let result = state.executor.execute(&invocation).await;
    if result.is_start_failure() {
        if let Some(err) = result.error {
            return Err(api_error(err));
        }
    }

    Ok(Json(ExecuteCommandResponse::from_result(&result)))
}

/// List shared tunnels.
pub async fn list_tunnels(
    State(state): State<AppState>,
) -> Result<Json<ListTunnelsResponse>, ApiError> {
    let infos = state.tunnels.registry().describe().map_err(api_error)?;
    let summary = infos
        .iter()
        .map(|info| info.id.clone())
        .collect::<SharedTunnels>()
        .to_string();
    let tunnels: Vec<TunnelSummary> = infos.into_iter().map(Into::into).collect();

    Ok(Json(ListTunnelsResponse {
        count: tunnels.len(),
        tunnels,
        summary,
    }))
}

/// Share a server and wait until its public URL is known.
pub async fn start_tunnel(
    State(state): State<AppState>,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(bad_request("name is required"));
    }

    let spec = TunnelSpec::share(&state.share_program, name, req.port, req.no_auth);
    let started = state.tunnels.start(name, &spec).await.map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(started.into())))
}

/// Stop sharing a server.
pub async fn stop_tunnel(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(bad_request("name is required"));
    }

    state.tunnels.stop(name).await.map_err(api_error)?;
    Ok(Json(StopResponse::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_new() {
        let state = AppState::new();
        assert_eq!(state.tunnels.registry().count(), 0);
        assert_eq!(&*state.share_program, "mcpm");
        assert!(!state.auth.is_enabled());
    }

    #[test]
    fn test_app_state_from_config_with_auth() {
        let mut config = Config::default();
        config.security.auth.enabled = true;
        config.security.auth.api_keys = vec!["k1".into()];

        let state = AppState::from_config(&config);
        assert!(state.auth.is_enabled());
        assert!(state.auth.is_valid("k1"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&GatewayError::DuplicateTunnel("a".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&GatewayError::TunnelNotFound("a".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&GatewayError::MonitorTimeout {
                id: "a".into(),
                output: String::new()
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "OK");
    }

    #[tokio::test]
    async fn test_api_info_endpoint() {
        let json = api_info().await.0;
        assert_eq!(json["name"], "agent-gateway");
        assert_eq!(json["status"], "running");
    }
}
