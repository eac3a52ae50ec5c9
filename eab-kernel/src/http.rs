/**
 * API REST EAB - Serveur HTTP du kernel
 *
 * RÔLE :
 * Expose la télémétrie anti-triche : heartbeats clients, détections, bans.
 * Les handlers ne font que vérifier la présence des champs puis délèguent au store.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, routes publiques + POST /ban derrière le middleware x-api-key
 * - Corps JSON illisible = champs manquants -> 400 avec le message de la route
 * - Chaque détection déclenche une alerte webhook détachée (jamais attendue)
 *
 * SÉCURITÉ :
 * - Seul POST /ban est protégé (clé partagée, comparaison stricte)
 * - Heartbeats et détections sont ouverts : les HWID ne sont pas authentifiés
 */

use crate::alerts::AlertDispatcher;
use crate::auth::require_api_key;
use crate::error::ApiError;
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{BanIn, BanStatus, Detection, DetectionIn, DetectionStats, HeartbeatIn, HostStatus};
use crate::store::TelemetryStore;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub store: TelemetryStore,
    pub alerts: AlertDispatcher,
    pub health_tracker: HealthTracker,
    pub api_key: Option<Arc<str>>,
}

pub fn build_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/ban", post(create_ban))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), require_api_key));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/heartbeat", post(heartbeat))
        .route("/detections", get(list_detections).post(log_detection))
        .route("/stats", get(get_stats))
        .route("/ban/{user_id}", get(get_ban_status))
        .route("/status/{hwid}", get(get_status))
        .merge(protected)
        .with_state(app_state)
}

// JSON invalide traité comme un corps vide : la validation de présence tranche
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(b)) => b,
        Err(e) => {
            debug!("[http] corps rejeté: {e}");
            T::default()
        }
    }
}

// POST /heartbeat
async fn heartbeat(
    State(app): State<AppState>,
    body: Result<Json<HeartbeatIn>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = body_or_default(body);
    let last_seen = app
        .store
        .record_heartbeat(input.hwid.as_deref())
        .map_err(|_| ApiError::InvalidInput("HWID required"))?;
    Ok(Json(json!({ "status": "ok", "lastSeen": last_seen })))
}

// POST /detections
async fn log_detection(
    State(app): State<AppState>,
    body: Result<Json<DetectionIn>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = body_or_default(body);
    let detection = app
        .store
        .append_detection(input.hwid.as_deref(), input.kind.as_deref(), input.detail())
        .map_err(|_| ApiError::InvalidInput("Invalid payload"))?;

    info!(
        "[detection] hwid={} type={} detail={} time={}",
        detection.hwid, detection.kind, detection.detail, detection.time
    );
    // fire-and-forget : la réponse ne dépend pas du webhook
    app.alerts.dispatch(detection.clone());

    Ok(Json(json!({ "status": "logged", "detection": detection })))
}

// GET /detections
async fn list_detections(State(app): State<AppState>) -> Json<Vec<Detection>> {
    Json(app.store.list_detections())
}

// GET /stats
async fn get_stats(State(app): State<AppState>) -> Json<DetectionStats> {
    Json(app.store.detection_stats())
}

// POST /ban (derrière require_api_key)
async fn create_ban(
    State(app): State<AppState>,
    body: Result<Json<BanIn>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = body_or_default(body);
    let ban = app
        .store
        .append_ban(input.user_id.as_deref(), input.kind.as_deref(), input.reason())
        .map_err(|_| ApiError::InvalidInput("Missing data"))?;

    info!("[ban] {} banni ({}, expiry={:?})", ban.user_id, ban.kind, ban.expiry);
    Ok(Json(json!({ "status": "banned", "ban": ban })))
}

// GET /ban/{user_id}
async fn get_ban_status(State(app): State<AppState>, Path(user_id): Path<String>) -> Json<BanStatus> {
    Json(app.store.ban_status(&user_id))
}

// GET /status/{hwid}
async fn get_status(State(app): State<AppState>, Path(hwid): Path<String>) -> Json<HostStatus> {
    Json(app.store.status(&hwid))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.store, app.alerts.is_enabled()))
}
