use serde::Deserialize;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Payload status brut publié par une unité Faikin sur `{status_prefix}/<unit>`.
/// Les champs inconnus sont ignorés; `Wh` peut être absent (message purement
/// compresseur/ventilateur).
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    #[serde(rename = "Wh")]
    pub wh: Option<f64>,
    #[serde(default = "default_up")]
    pub up: bool,
    pub comp: Option<f64>,
    pub fanfreq: Option<f64>,
    // mode arrive parfois en nombre, parfois en chaîne selon le firmware
    pub mode: Option<serde_json::Value>,
    pub id: Option<String>,
}

fn default_up() -> bool {
    true
}

/// Derniers signaux secondaires reçus, conservés uniquement pour l'estimation
/// de repli entre deux ticks d'énergie.
#[derive(Debug, Clone)]
pub struct FallbackRaw {
    pub comp: f64,
    pub fanfreq: Option<f64>,
    pub mode: Option<serde_json::Value>,
}

/// État courant d'une unité découverte. Créé à la première observation,
/// jamais détruit (durée de vie = process).
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub device_id: String,
    pub last_energy_wh: Option<f64>,
    pub last_tick_at: Option<OffsetDateTime>,
    pub last_interval_secs: Option<f64>,
    pub hold_until: Option<OffsetDateTime>,
    pub last_published_w: Option<f64>,
    pub online: bool,
    /// Tag de génération du deadline armé: un deadline qui se réveille avec
    /// une génération périmée est un no-op silencieux.
    pub generation: u64,
    pub fallback_raw: Option<FallbackRaw>,
    pub announced: bool,
}

impl DeviceState {
    pub fn new(device_id: String) -> Self {
        Self {
            device_id,
            last_energy_wh: None,
            last_tick_at: None,
            last_interval_secs: None,
            hold_until: None,
            last_published_w: None,
            online: false,
            generation: 0,
            fallback_raw: None,
            announced: false,
        }
    }

    /// Dernière valeur émise, 0 tant que rien n'a été publié.
    pub fn published_w(&self) -> f64 {
        self.last_published_w.unwrap_or(0.0)
    }

    /// Vrai si une valeur dérivée d'un tick est encore tenue valide à `now`.
    pub fn held_at(&self, now: OffsetDateTime) -> bool {
        matches!(self.hold_until, Some(until) if now < until)
    }
}

pub type UnitsMap = HashMap<String, DeviceState>;
