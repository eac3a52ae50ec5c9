// Contrôle d'accès des routes qui modifient la table des bans

use crate::error::ApiError;
use crate::http::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Égalité stricte ; sans secret configuré, rien ne passe.
pub fn key_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => !expected.is_empty() && expected == presented,
        _ => false,
    }
}

pub async fn require_api_key(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !key_matches(app.api_key.as_deref(), presented) {
        if app.api_key.is_none() {
            warn!("[auth] API_KEY non défini - {} refusé", req.uri().path());
        } else {
            warn!("[auth] clé API invalide sur {}", req.uri().path());
        }
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(req).await)
}
