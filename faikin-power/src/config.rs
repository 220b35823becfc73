use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Configuration du démon, chargée depuis un fichier YAML.
/// `margin_seconds` et `margin_factor` sont des alternatives: si les deux sont
/// renseignés, le facteur l'emporte (voir hold::hold_window).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PowerConfig {
    pub status_prefix: String,
    pub discovery_prefix: String,
    pub margin_seconds: f64,
    pub margin_factor: Option<f64>,
    pub min_power_w: f64,
    pub enable_comp_fallback: bool,
    pub log_level: String,
    pub mqtt: MqttConf,
    pub http_port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            status_prefix: "state".into(),
            discovery_prefix: "homeassistant".into(),
            margin_seconds: 300.0,
            margin_factor: None,
            min_power_w: 0.0,
            enable_comp_fallback: false,
            log_level: "info".into(),
            mqtt: MqttConf { host: "localhost".into(), port: 1883 },
            http_port: 8080,
        }
    }
}

pub async fn load_config() -> PowerConfig {
    let path = std::env::var("FAIKIN_POWER_CONFIG").unwrap_or_else(|_| "power.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return PowerConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            log::error!("[config] {path} invalide: {e}");
            PowerConfig::default()
        })
    } else {
        log::warn!("[config] pas de {path}, usage config par défaut");
        PowerConfig::default()
    }
}
