/*!
Mock du sink de publication pour développement sans broker

Permet de tester le moteur sans broker MQTT réel: enregistre tous les messages
sortants et offre des assertions sur les puissances publiées par unité.
*/

use faikin_power::publisher::{power_topic, OutboundMessage, PowerSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink d'enregistrement qui remplace MqttSink en test.
#[derive(Clone, Default)]
pub struct MockSink {
    messages: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tous les messages sortants, dans l'ordre d'émission.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }

    /// Messages émis sur un topic précis.
    pub fn messages_on(&self, topic: &str) -> Vec<OutboundMessage> {
        self.messages.lock().iter().filter(|m| m.topic == topic).cloned().collect()
    }

    /// Puissances publiées pour une unité, parsées depuis le payload.
    pub fn powers_for(&self, unit: &str) -> Vec<f64> {
        self.messages_on(&power_topic(unit))
            .iter()
            .map(|m| m.payload.parse().expect("payload puissance non numérique"))
            .collect()
    }

    /// Dernière puissance publiée pour une unité, s'il y en a une.
    pub fn last_power(&self, unit: &str) -> Option<f64> {
        self.powers_for(unit).last().copied()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl PowerSink for MockSink {
    fn publish(&self, message: OutboundMessage) {
        log::info!("[MOCK] publish {} -> {}", message.topic, message.payload);
        self.messages.lock().push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::QoS;

    fn msg(topic: &str, payload: &str) -> OutboundMessage {
        OutboundMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
            qos: QoS::AtMostOnce,
            retain: true,
        }
    }

    #[test]
    fn records_and_filters_messages() {
        let sink = MockSink::new();
        sink.publish(msg("faikin/kitchen/power_w", "600.0"));
        sink.publish(msg("faikin/attic/power_w", "25.0"));
        sink.publish(msg("faikin/kitchen/power_w", "0.0"));

        assert_eq!(sink.messages().len(), 3);
        assert_eq!(sink.powers_for("kitchen"), vec![600.0, 0.0]);
        assert_eq!(sink.last_power("attic"), Some(25.0));
        assert_eq!(sink.last_power("garage"), None);
    }

    #[test]
    fn clear_resets_recording() {
        let sink = MockSink::new();
        sink.publish(msg("faikin/kitchen/power_w", "600.0"));
        sink.clear();
        assert!(sink.messages().is_empty());
    }
}
