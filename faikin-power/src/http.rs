/**
 * API STATUS - Inspection read-only de l'état du moteur
 *
 * RÔLE :
 * Expose l'état des unités suivies et le health du moteur pour debug et
 * monitoring. Aucun effet sur l'estimation: l'API ne fait que lire la map.
 *
 * SÉCURITÉ :
 * - Header x-api-key obligatoire sauf /health
 * - FAIKIN_API_KEY vide = API verrouillée (liveness reste accessible)
 */

use crate::health::{EngineHealth, HealthTracker};
use crate::models::DeviceState;
use crate::state::SharedUnits;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct AppState {
    pub units: SharedUnits,
    pub health_tracker: HealthTracker,
}

#[derive(serde::Serialize)]
struct UnitView {
    unit: String,
    online: bool,
    power_w: f64,
    held: bool,                        // une valeur tick est-elle encore valide
    last_energy_wh: Option<f64>,
    last_tick_at: Option<String>,      // RFC3339 pour l'API
    last_interval_seconds: Option<f64>,
    hold_until: Option<String>,
}

fn to_view(unit: &str, st: &DeviceState) -> UnitView {
    let now = OffsetDateTime::now_utc();
    UnitView {
        unit: unit.to_string(),
        online: st.online,
        power_w: st.published_w(),
        held: st.held_at(now),
        last_energy_wh: st.last_energy_wh,
        last_tick_at: st.last_tick_at.and_then(|t| t.format(&Rfc3339).ok()),
        last_interval_seconds: st.last_interval_secs,
        hold_until: st.hold_until.and_then(|t| t.format(&Rfc3339).ok()),
    }
}

async fn require_api_key(req: Request, next: Next) -> Result<Response, StatusCode> {
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let expected = std::env::var("FAIKIN_API_KEY").unwrap_or_default();
    if expected.is_empty() {
        log::warn!("[http] FAIKIN_API_KEY not set - API access denied");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/units", get(get_units))
        .route("/units/{id}", get(get_unit))
        .with_state(app_state)
        .layer(middleware::from_fn(require_api_key))
}

// GET /units (liste)
async fn get_units(State(app): State<AppState>) -> Json<Vec<UnitView>> {
    let list: Vec<UnitView> =
        app.units.lock().iter().map(|(unit, st)| to_view(unit, st)).collect();
    Json(list)
}

// GET /units/:id (détail)
async fn get_unit(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UnitView>, StatusCode> {
    let map = app.units.lock();
    let Some(st) = map.get(&id) else { return Err(StatusCode::NOT_FOUND) };
    Ok(Json(to_view(&id, st)))
}

// GET /system/health (état moteur)
async fn get_system_health(State(app): State<AppState>) -> Json<EngineHealth> {
    Json(app.health_tracker.get_health(&app.units))
}
