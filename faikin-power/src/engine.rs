/**
 * MOTEUR D'ESTIMATION - Puissance instantanée depuis le compteur d'énergie vie
 *
 * RÔLE :
 * Détecte les ticks du compteur Wh de chaque unité, calcule ΔWh * 3600 / Δt,
 * publie la valeur et la tient valide pendant une fenêtre bornée (voir hold).
 * Sans nouveau tick dans la fenêtre, la valeur expire à 0. Entre deux ticks,
 * une estimation compresseur optionnelle peut prendre le relais.
 *
 * FONCTIONNEMENT :
 * - Un DeviceState par unité, créé paresseusement à la première observation
 * - Tout l'état sous un seul verrou: messages et réveils de deadline sérialisés
 * - Erreurs par message traitées localement (log), jamais propagées: un payload
 *   malformé n'affecte ni l'unité concernée ni les autres
 */

use crate::config::PowerConfig;
use crate::models::{DeviceState, FallbackRaw, StatusPayload};
use crate::publisher::{publish_power, PowerSink};
use crate::state::SharedUnits;
use crate::{discovery, fallback, hold};
use std::sync::Arc;
use time::OffsetDateTime;

/// Raisons de rejet d'une lecture d'énergie. Jamais fatales: on log et on
/// attend le prochain message valide.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("energy reading is not a finite non-negative number: {0}")]
    MalformedEnergy(f64),
    #[error("counter reset detected ({from} Wh -> {to} Wh), baseline rebased")]
    CounterReset { from: f64, to: f64 },
    #[error("non-positive elapsed time between ticks ({0}s), tick discarded")]
    NonPositiveElapsed(f64),
}

#[derive(Clone)]
pub struct PowerEngine {
    units: SharedUnits,
    cfg: Arc<PowerConfig>,
    sink: Arc<dyn PowerSink>,
}

impl PowerEngine {
    pub fn new(units: SharedUnits, cfg: Arc<PowerConfig>, sink: Arc<dyn PowerSink>) -> Self {
        Self { units, cfg, sink }
    }

    pub fn units(&self) -> &SharedUnits {
        &self.units
    }

    /// Point d'entrée unique du routeur MQTT: traite un payload status décodé
    /// pour `unit`, horodaté `now` à la réception.
    pub fn handle_status(&self, unit: &str, payload: &StatusPayload, now: OffsetDateTime) {
        let mut units = self.units.lock();
        let st = units.entry(unit.to_string()).or_insert_with(|| {
            let device_id = payload.id.clone().unwrap_or_else(|| format!("faikin-{unit}"));
            log::info!("[engine] new unit discovered: {unit} ({device_id})");
            DeviceState::new(device_id)
        });

        discovery::announce(self.sink.as_ref(), &self.cfg, st, unit);
        st.online = payload.up;

        if !payload.up {
            // unité offline: pas de calcul depuis ce message, zéro immédiat
            // et annulation du deadline pour ne pas laisser une valeur rance
            st.generation += 1;
            st.hold_until = None;
            publish_power(self.sink.as_ref(), &self.cfg, st, unit, 0.0);
            log::debug!("[engine] {unit} offline, forced 0 W");
            return;
        }

        if let Some(wh) = payload.wh {
            match self.apply_energy(st, unit, wh, now) {
                Ok(()) => {}
                Err(e @ TickError::CounterReset { .. }) => log::warn!("[engine] {unit}: {e}"),
                Err(e) => log::debug!("[engine] {unit}: {e}"),
            }
        }

        if self.cfg.enable_comp_fallback && (payload.comp.is_some() || payload.fanfreq.is_some()) {
            self.apply_fallback(st, unit, payload, now);
        }
    }

    /// Chemin énergie: baseline, détection de tick, calcul de puissance.
    /// Seul mutateur de last_energy_wh / last_tick_at.
    fn apply_energy(
        &self,
        st: &mut DeviceState,
        unit: &str,
        wh: f64,
        now: OffsetDateTime,
    ) -> Result<(), TickError> {
        if !wh.is_finite() || wh < 0.0 {
            return Err(TickError::MalformedEnergy(wh));
        }

        let (Some(last_wh), Some(last_at)) = (st.last_energy_wh, st.last_tick_at) else {
            // première lecture: baseline seulement, pas de base pour un débit.
            // On publie 0 pour que le capteur existe avec une valeur définie.
            st.last_energy_wh = Some(wh);
            st.last_tick_at = Some(now);
            publish_power(self.sink.as_ref(), &self.cfg, st, unit, 0.0);
            return Ok(());
        };

        let delta_wh = wh - last_wh;
        if delta_wh < 0.0 {
            // reset du compteur: on rebase sans calculer de puissance et sans
            // toucher à la valeur encore tenue ni à son deadline
            st.last_energy_wh = Some(wh);
            st.last_tick_at = Some(now);
            return Err(TickError::CounterReset { from: last_wh, to: wh });
        }
        if delta_wh == 0.0 {
            // pas un tick, cas courant entre deux incréments du compteur
            return Ok(());
        }

        let delta_t = (now - last_at).as_seconds_f64();
        if delta_t <= 0.0 {
            return Err(TickError::NonPositiveElapsed(delta_t));
        }

        let watts = delta_wh * 3600.0 / delta_t;
        st.last_energy_wh = Some(wh);
        st.last_tick_at = Some(now);
        st.last_interval_secs = Some(delta_t);
        publish_power(self.sink.as_ref(), &self.cfg, st, unit, watts);
        hold::arm(
            self.units.clone(),
            self.sink.clone(),
            self.cfg.clone(),
            st,
            unit,
            delta_t,
            now,
        );
        Ok(())
    }

    /// Chemin signaux secondaires: publie une estimation grossière uniquement
    /// hors fenêtre de validité d'un tick. Ne touche jamais aux champs énergie
    /// ni au scheduler.
    fn apply_fallback(&self, st: &mut DeviceState, unit: &str, payload: &StatusPayload, now: OffsetDateTime) {
        let raw = FallbackRaw {
            comp: payload.comp.unwrap_or(0.0),
            fanfreq: payload.fanfreq,
            mode: payload.mode.clone(),
        };
        st.fallback_raw = Some(raw.clone());

        if st.held_at(now) {
            // la valeur dérivée du tick prime tant que sa fenêtre court
            return;
        }
        let estimate = fallback::estimate_power(&raw);
        publish_power(self.sink.as_ref(), &self.cfg, st, unit, estimate);
    }
}
