//! API-key gate in front of the row and realtime routes.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::AppState;
use crate::store::ErrorBody;

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_keys: Vec<String>,
}

/// Accepted bearer keys. An empty store leaves the service open.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashSet<String>,
}

impl ApiKeyStore {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Load API keys from config file
    pub fn load(config_path: &Path) -> Self {
        let keys = match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded {} API key(s)", config.api_keys.len());
                    config.api_keys
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                Vec::new()
            }
        };

        Self::new(keys)
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    fn validate(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.api_keys.is_open() {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return unauthorized(
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                )
            }
        },
        None => return unauthorized("missing_auth", "Authorization header required"),
    };

    if state.api_keys.validate(api_key) {
        next.run(request).await
    } else {
        unauthorized("invalid_key", "Invalid API key")
    }
}
