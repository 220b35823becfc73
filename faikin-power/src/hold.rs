use crate::config::PowerConfig;
use crate::models::DeviceState;
use crate::publisher::{publish_power, PowerSink};
use crate::state::SharedUnits;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task;

/// Fenêtre de validité d'un tick, en secondes: Δt * (1 + margin_factor) si le
/// facteur est configuré, sinon Δt + margin_seconds. Le facteur l'emporte si
/// les deux sont renseignés.
pub fn hold_window(cfg: &PowerConfig, interval_secs: f64) -> f64 {
    match cfg.margin_factor {
        Some(factor) if factor != 0.0 => (interval_secs * (1.0 + factor)).max(0.0),
        _ => (interval_secs + cfg.margin_seconds).max(0.0),
    }
}

/// Arme le deadline d'expiration de l'unité. Le deadline précédent est
/// invalidé par le bump de génération: s'il se réveille quand même, il voit
/// une génération périmée et ne fait rien. Au plus un deadline vivant par
/// unité.
///
/// Au réveil, si aucun tick plus récent n'a re-armé entre-temps, la puissance
/// publiée est forcée à 0. C'est le seul mécanisme qui ramène la valeur à zéro
/// en l'absence de mouvement d'énergie.
pub(crate) fn arm(
    units: SharedUnits,
    sink: Arc<dyn PowerSink>,
    cfg: Arc<PowerConfig>,
    st: &mut DeviceState,
    unit: &str,
    interval_secs: f64,
    now: OffsetDateTime,
) {
    let window = hold_window(&cfg, interval_secs);
    st.generation += 1;
    let generation = st.generation;
    st.hold_until = Some(now + time::Duration::seconds_f64(window));

    let unit = unit.to_string();
    task::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs_f64(window)).await;
        let mut map = units.lock();
        let Some(st) = map.get_mut(&unit) else { return };
        if st.generation != generation {
            // remplacé par un tick plus récent, no-op
            return;
        }
        st.hold_until = None;
        publish_power(sink.as_ref(), &cfg, st, &unit, 0.0);
        log::debug!("[hold] {unit}: window expired, forced 0 W");
    });
}
