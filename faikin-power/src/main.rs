/**
 * FAIKIN POWER - Point d'entrée du démon d'estimation
 *
 * RÔLE : Orchestration de tous les modules : config, MQTT, moteur, health, API.
 * Bootstrap complet avec gestion d'erreurs et logging.
 *
 * ARCHITECTURE : Event-driven via MQTT (status entrants, puissances sortantes)
 * + deadlines tokio par unité + API REST read-only.
 */

use faikin_power::config::load_config;
use faikin_power::engine::PowerEngine;
use faikin_power::health::HealthTracker;
use faikin_power::http::{self, AppState};
use faikin_power::mqtt;
use faikin_power::publisher::MqttSink;
use faikin_power::state::new_state;

use anyhow::Context;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    let cfg = Arc::new(load_config().await);

    env_logger::Builder::new()
        .parse_filters(&cfg.log_level)
        .init();
    log::info!(
        "[main] starting (status_prefix={}, margin={}, fallback={})",
        cfg.status_prefix,
        match cfg.margin_factor {
            Some(f) => format!("factor {f}"),
            None => format!("{}s", cfg.margin_seconds),
        },
        cfg.enable_comp_fallback
    );

    // map partagée des unités, peuplée paresseusement à la découverte
    let units = new_state(HashMap::new());
    let health_tracker = HealthTracker::new();

    // sink sortant + client MQTT partagé listener/writer
    let (sink, outbound_rx) = MqttSink::channel();
    let sink: Arc<dyn faikin_power::publisher::PowerSink> = Arc::new(sink);
    let (client, eventloop) = mqtt::create_mqtt_client(&cfg);

    let engine = PowerEngine::new(units.clone(), cfg.clone(), sink.clone());

    mqtt::spawn_writer(client.clone(), outbound_rx);
    mqtt::spawn_status_listener(eventloop, client, engine, cfg.clone(), health_tracker.clone());

    // publication auto du health moteur
    health_tracker.spawn_health_publisher(units.clone(), sink);

    // API status read-only
    let app = http::build_router(AppState { units, health_tracker });
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    log::info!("[main] listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
