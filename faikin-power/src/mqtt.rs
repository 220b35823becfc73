use crate::config::PowerConfig;
use crate::engine::PowerEngine;
use crate::health::HealthTracker;
use crate::models::StatusPayload;
use crate::publisher::OutboundMessage;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task;

pub fn create_mqtt_client(cfg: &PowerConfig) -> (AsyncClient, EventLoop) {
    let mut opts = MqttOptions::new("faikin-power", &cfg.mqtt.host, cfg.mqtt.port);
    opts.set_keep_alive(Duration::from_secs(15));
    AsyncClient::new(opts, 64)
}

/// Task writer: draine le channel du sink et pousse sur le transport.
/// La publication est fire-and-forget côté moteur; les erreurs sont loggées ici.
pub fn spawn_writer(client: AsyncClient, mut rx: mpsc::UnboundedReceiver<OutboundMessage>) {
    task::spawn(async move {
        while let Some(m) = rx.recv().await {
            if let Err(e) = client.publish(m.topic.clone(), m.qos, m.retain, m.payload).await {
                log::error!("[mqtt] publish {} failed: {e:?}", m.topic);
            }
        }
    });
}

/// Boucle d'écoute des topics status. Résout l'identité de l'unité depuis le
/// topic et passe la main au moteur; un payload indécodable est simplement
/// ignoré. Re-souscrit à chaque (re)connexion, backoff 2s sur erreur transport.
pub fn spawn_status_listener(
    mut eventloop: EventLoop,
    client: AsyncClient,
    engine: PowerEngine,
    cfg: Arc<PowerConfig>,
    health: HealthTracker,
) {
    task::spawn(async move {
        let filter = format!("{}/+", cfg.status_prefix);
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(rumqttc::Incoming::ConnAck(_))) => {
                    health.mark_mqtt_connected();
                    match client.subscribe(filter.as_str(), QoS::AtLeastOnce).await {
                        Ok(()) => log::info!("[mqtt] subscribed to {filter}"),
                        Err(e) => log::error!("[mqtt] subscribe {filter} failed: {e:?}"),
                    }
                }
                Ok(Event::Incoming(rumqttc::Incoming::Publish(p))) => {
                    let Some(unit) = unit_from_topic(&cfg.status_prefix, &p.topic) else {
                        continue;
                    };
                    match serde_json::from_slice::<StatusPayload>(&p.payload) {
                        Ok(payload) => {
                            engine.handle_status(&unit, &payload, OffsetDateTime::now_utc())
                        }
                        Err(e) => log::debug!("[mqtt] payload invalide sur {}: {e}", p.topic),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("[mqtt] erreur transport: {e:?}");
                    health.increment_reconnects();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

/// `state/<unit>` -> `<unit>`. Refuse les topics hors préfixe et les
/// identifiants multi-segments.
fn unit_from_topic(status_prefix: &str, topic: &str) -> Option<String> {
    let rest = topic.strip_prefix(status_prefix)?.strip_prefix('/')?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.to_string())
}
