/**
 * ALERT DISPATCHER - Notification webhook sur chaque détection
 *
 * RÔLE : Pousse un embed (titre, couleur, 4 champs) vers un webhook externe.
 *
 * FONCTIONNEMENT :
 * - Fire-and-forget : tâche tokio détachée, jamais attendue par le handler HTTP
 * - Pas de webhook configuré = no-op
 * - Échec (réseau, non-2xx) : log + compteur health, aucun retry
 * - Timeout borné par requête
 */

use crate::health::HealthTracker;
use crate::models::Detection;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const ALERT_TITLE: &str = "🚨 EAB Detection";
pub const ALERT_COLOR: u32 = 0xE74C3C;
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone)]
pub struct AlertDispatcher {
    client: reqwest::Client,
    webhook_url: Option<String>,
    health: HealthTracker,
}

impl AlertDispatcher {
    pub fn new(webhook_url: Option<String>, health: HealthTracker) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("[alerts] client HTTP par défaut ({e})");
                reqwest::Client::new()
            });
        Self { client, webhook_url, health }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Lance l'envoi en arrière-plan, jamais attendu par l'appelant.
    pub fn dispatch(&self, detection: Detection) {
        if !self.is_enabled() {
            return;
        }
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.deliver(&detection).await;
        });
    }

    /// Un envoi complet : POST, puis compteur health et log selon le résultat
    async fn deliver(&self, detection: &Detection) {
        let Some(url) = self.webhook_url.as_deref() else { return };

        match send_alert(&self.client, url, detection).await {
            Ok(()) => {
                self.health.mark_alert_delivered();
                debug!("[alerts] alerte envoyée pour {}", detection.hwid);
            }
            Err(e) => {
                self.health.mark_alert_failed();
                warn!("[alerts] échec webhook pour {} ({}): {e}", detection.hwid, detection.kind);
            }
        }
    }
}

async fn send_alert(client: &reqwest::Client, url: &str, detection: &Detection) -> Result<(), AlertError> {
    let response = client.post(url).json(&build_payload(detection)).send().await?;
    if !response.status().is_success() {
        return Err(AlertError::Status(response.status()));
    }
    Ok(())
}

pub fn build_payload(detection: &Detection) -> Value {
    let field = |name: &str, value: &str| json!({ "name": name, "value": value, "inline": true });

    json!({
        "embeds": [{
            "title": ALERT_TITLE,
            "color": ALERT_COLOR,
            "fields": [
                field("HWID", &detection.hwid),
                field("Type", &detection.kind),
                field("Detail", &detection.detail),
                field("Time", &detection.time),
            ],
        }]
    })
}
