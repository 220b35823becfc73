use crate::config::PowerConfig;
use crate::models::DeviceState;
use rumqttc::QoS;
use tokio::sync::mpsc;

/// Message sortant prêt à partir sur le transport. Le moteur ne touche jamais
/// au client MQTT directement: il pousse dans un sink fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

/// Sink abstrait de publication. Implémenté par MqttSink en production et par
/// le sink d'enregistrement du devkit en test.
pub trait PowerSink: Send + Sync {
    fn publish(&self, message: OutboundMessage);
}

pub fn power_topic(unit: &str) -> String {
    format!("faikin/{unit}/power_w")
}

/// Émet la puissance courante d'une unité: clamp à 0, plancher min_power_w,
/// arrondi à 0.1 W, topic retained. Les republis de valeur identique sont
/// supprimées (idempotence).
pub fn publish_power(sink: &dyn PowerSink, cfg: &PowerConfig, st: &mut DeviceState, unit: &str, watts: f64) {
    let mut watts = watts.max(0.0);
    if cfg.min_power_w > 0.0 && watts > 0.0 {
        watts = watts.max(cfg.min_power_w);
    }
    let watts = (watts * 10.0).round() / 10.0;
    if st.last_published_w == Some(watts) {
        return;
    }
    st.last_published_w = Some(watts);
    sink.publish(OutboundMessage {
        topic: power_topic(unit),
        payload: format!("{watts:.1}"),
        qos: QoS::AtMostOnce,
        retain: true,
    });
    log::debug!("[publish] {unit}: {watts:.1} W");
}

/// Sink de production: pousse dans un channel drainé par la task writer MQTT
/// (voir mqtt::spawn_writer). L'envoi ne bloque jamais le traitement d'un
/// message ou d'un réveil de deadline.
pub struct MqttSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl MqttSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PowerSink for MqttSink {
    fn publish(&self, message: OutboundMessage) {
        if self.tx.send(message).is_err() {
            log::warn!("[publish] writer MQTT arrêté, message perdu");
        }
    }
}
