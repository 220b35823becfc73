/*!
Harness de test pour le moteur d'estimation

Monte un PowerEngine complet sur un MockSink, avec horodatage explicite des
messages pour des scénarios déterministes (combiné à l'horloge tokio en pause
pour les deadlines d'expiration).
*/

use crate::sink::MockSink;
use faikin_power::config::PowerConfig;
use faikin_power::engine::PowerEngine;
use faikin_power::models::StatusPayload;
use faikin_power::state::{new_state, SharedUnits};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// Constructeur de payloads status, valeurs par défaut = message vide d'une
/// unité online.
#[derive(Debug, Clone)]
pub struct StatusBuilder(StatusPayload);

impl StatusBuilder {
    pub fn new() -> Self {
        Self(StatusPayload { wh: None, up: true, comp: None, fanfreq: None, mode: None, id: None })
    }

    pub fn wh(mut self, wh: f64) -> Self {
        self.0.wh = Some(wh);
        self
    }

    pub fn up(mut self, up: bool) -> Self {
        self.0.up = up;
        self
    }

    pub fn comp(mut self, comp: f64) -> Self {
        self.0.comp = Some(comp);
        self
    }

    pub fn fanfreq(mut self, fanfreq: f64) -> Self {
        self.0.fanfreq = Some(fanfreq);
        self
    }

    pub fn mode(mut self, mode: serde_json::Value) -> Self {
        self.0.mode = Some(mode);
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.0.id = Some(id.to_string());
        self
    }

    pub fn build(self) -> StatusPayload {
        self.0
    }
}

impl Default for StatusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Moteur prêt à l'emploi branché sur un MockSink.
pub struct EngineHarness {
    pub sink: MockSink,
    pub engine: PowerEngine,
    pub cfg: Arc<PowerConfig>,
    units: SharedUnits,
}

impl EngineHarness {
    pub fn new(cfg: PowerConfig) -> Self {
        env_logger::try_init().ok(); // init logging pour tests
        let cfg = Arc::new(cfg);
        let sink = MockSink::new();
        let units = new_state(HashMap::new());
        let engine = PowerEngine::new(units.clone(), cfg.clone(), Arc::new(sink.clone()));
        Self { sink, engine, cfg, units }
    }

    pub fn with_defaults() -> Self {
        Self::new(PowerConfig::default())
    }

    /// Injecte un message status pour `unit`, horodaté `at`.
    pub fn status(&self, unit: &str, builder: StatusBuilder, at: OffsetDateTime) {
        self.engine.handle_status(unit, &builder.build(), at);
    }

    pub fn units(&self) -> &SharedUnits {
        &self.units
    }
}
