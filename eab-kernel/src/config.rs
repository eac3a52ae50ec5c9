use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KernelConfig {
    pub port: u16,
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            webhook_url: None,
            api_key: None, // pas de secret compilé : POST /ban refusé tant que API_KEY absent
        }
    }
}

impl KernelConfig {
    /// Variables d'environnement par-dessus le fichier (vide = non défini)
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => warn!("[config] PORT invalide ({port}), on garde {}", self.port),
            }
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.webhook_url = Some(url);
        }
        if let Some(key) = get("API_KEY") {
            self.api_key = Some(key);
        }
        self
    }
}

async fn load_file(path: &str) -> KernelConfig {
    if !Path::new(path).exists() {
        info!("[config] pas de {path}, usage config par défaut + env");
        return KernelConfig::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    if txt.trim().is_empty() {
        return KernelConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!("[config] config invalide: {e}");
        KernelConfig::default()
    })
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("EAB_KERNEL_CONFIG").unwrap_or_else(|_| "eab.yaml".into());
    load_file(&path).await.apply_env(|key| std::env::var(key).ok())
}
