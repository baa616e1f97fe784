//! API key authentication.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

/// Paths reachable without a key.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Thread-safe API key store.
#[derive(Debug)]
pub struct ApiKeyStore {
    keys: RwLock<HashSet<String>>,
    enabled: bool,
}

impl ApiKeyStore {
    /// Create a store; `enabled == false` lets every request through.
    pub fn new(enabled: bool) -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            enabled,
        }
    }

    /// Create a store with authentication disabled.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Create an enabled store holding `keys`.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new(true);
        for key in keys {
            store.add_key(key);
        }
        store
    }

    /// Add an API key.
    pub fn add_key(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(key.into());
        }
    }

    /// Check if a key is valid.
    pub fn is_valid(&self, key: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    /// Get the number of registered keys.
    pub fn count(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Extract the key from a `Bearer` authorization header.
    pub fn extract_key(header_value: &str) -> Option<&str> {
        header_value.strip_prefix("Bearer ").map(str::trim)
    }
}

impl Default for ApiKeyStore {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Authentication middleware for axum.
pub async fn auth_middleware(
    State(store): State<Arc<ApiKeyStore>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !store.is_enabled() || PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(ApiKeyStore::extract_key)
        .is_some_and(|key| store.is_valid(key));

    if authorized {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        Err(StatusCode::UNAUTHORIZED)
    }
}
