/**
 * EAB KERNEL - Point d'entrée du collecteur de télémétrie anti-triche
 *
 * RÔLE : Bootstrap config, store en mémoire, dispatcher d'alertes, API HTTP.
 *
 * ARCHITECTURE : API REST Axum + état en mémoire (3 tables) + webhook fire-and-forget.
 * UTILITÉ : Les clients envoient heartbeats/détections, les opérateurs consultent
 * status, stats et bans.
 */

mod alerts;
mod auth;
mod config;
mod error;
mod health;
mod http;
mod models;
mod queries;
mod store;
#[cfg(test)]
mod test_support;

use crate::alerts::AlertDispatcher;
use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::store::TelemetryStore;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eab_kernel=info")),
        )
        .init();

    let cfg = load_config().await;

    if cfg.api_key.is_none() {
        warn!("[kernel] API_KEY non défini - POST /ban refusera toutes les requêtes");
    }
    match &cfg.webhook_url {
        Some(_) => info!("[kernel] alertes webhook activées"),
        None => info!("[kernel] pas de WEBHOOK_URL, alertes désactivées"),
    }

    let health_tracker = HealthTracker::new();
    let alerts = AlertDispatcher::new(cfg.webhook_url.clone(), health_tracker.clone());

    // fabrique l'état unique pour Axum
    let app_state = AppState {
        store: TelemetryStore::new(),
        alerts,
        health_tracker,
        api_key: cfg.api_key.as_deref().map(Arc::from),
    };

    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("[kernel] EAB API listening on http://{addr}");
    axum::serve(listener, app).await.context("serveur HTTP arrêté")?;

    Ok(())
}
