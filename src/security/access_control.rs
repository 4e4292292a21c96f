//! API key authentication.
//! Resolves `X-API-Key` to a principal with a billing tier.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::ApiKeyConfig;
use crate::http::response::error_response;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Context attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPrincipal {
    pub id: String,
    pub tier: String,
}

/// Known keys, built once from config.
#[derive(Debug, Default)]
pub struct ApiKeyRegistry {
    keys: HashMap<String, ApiPrincipal>,
}

impl ApiKeyRegistry {
    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|k| {
                    (
                        k.key.clone(),
                        ApiPrincipal {
                            id: k.id.clone(),
                            tier: k.tier.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn resolve(&self, key: &str) -> Option<&ApiPrincipal> {
        self.keys.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub async fn require_api_key(
    State(registry): State<Arc<ApiKeyRegistry>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let principal = match req.headers().get(API_KEY_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|key| registry.resolve(key.trim()))
            .cloned(),
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing X-API-Key header",
            );
        }
    };

    match principal {
        Some(principal) => {
            tracing::debug!(api_key_id = %principal.id, tier = %principal.tier, "Authenticated");
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "unauthorized", "invalid API key"),
    }
}
