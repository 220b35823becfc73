use crate::models::FallbackRaw;
use serde_json::Value;

/// Watts approximatifs par unité de fréquence compresseur. Courbe volontairement
/// grossière, à remplacer par une cartographie mesurée si besoin de fidélité.
const WATTS_PER_COMP_UNIT: f64 = 50.0;

/// Estimation de repli entre deux ticks d'énergie, à partir des signaux
/// instantanés compresseur/ventilateur. Politique remplaçable, pas un modèle
/// physique: unité à l'arrêt ou compresseur à 0 → 0 W, sinon linéaire en comp.
pub fn estimate_power(raw: &FallbackRaw) -> f64 {
    if mode_is_off(raw.mode.as_ref()) {
        return 0.0;
    }
    if !raw.comp.is_finite() || raw.comp <= 0.0 {
        return 0.0;
    }
    raw.comp * WATTS_PER_COMP_UNIT
}

fn mode_is_off(mode: Option<&Value>) -> bool {
    match mode {
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("off") || s == "0"
        }
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(comp: f64, mode: Option<Value>) -> FallbackRaw {
        FallbackRaw { comp, fanfreq: None, mode }
    }

    #[test]
    fn linear_in_comp() {
        assert_eq!(estimate_power(&raw(3.0, None)), 150.0);
        assert_eq!(estimate_power(&raw(0.5, None)), 25.0);
    }

    #[test]
    fn idle_compressor_is_zero() {
        assert_eq!(estimate_power(&raw(0.0, None)), 0.0);
        assert_eq!(estimate_power(&raw(-1.0, None)), 0.0);
    }

    #[test]
    fn non_finite_comp_is_zero() {
        assert_eq!(estimate_power(&raw(f64::NAN, None)), 0.0);
        assert_eq!(estimate_power(&raw(f64::INFINITY, None)), 0.0);
    }

    #[test]
    fn off_mode_forces_zero() {
        assert_eq!(estimate_power(&raw(3.0, Some(json!("off")))), 0.0);
        assert_eq!(estimate_power(&raw(3.0, Some(json!("OFF")))), 0.0);
        assert_eq!(estimate_power(&raw(3.0, Some(json!(0)))), 0.0);
        assert_eq!(estimate_power(&raw(3.0, Some(json!(false)))), 0.0);
        assert_eq!(estimate_power(&raw(3.0, Some(json!("heat")))), 150.0);
        assert_eq!(estimate_power(&raw(3.0, Some(json!(3)))), 150.0);
    }
}
