use crate::config::PowerConfig;
use crate::models::DeviceState;
use crate::publisher::{power_topic, OutboundMessage, PowerSink};
use rumqttc::QoS;
use serde::Serialize;

/// Payload MQTT Discovery Home Assistant pour le capteur de puissance estimée
/// d'une unité. Publié retained une seule fois par unité découverte.
#[derive(Debug, Serialize)]
pub struct DiscoveryPayload {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub unit_of_measurement: String,
    pub device_class: String,
    pub state_class: String,
    pub icon: String,
    pub availability_topic: String,
    pub availability_template: String,
    pub payload_available: String,
    pub payload_not_available: String,
    pub device: DeviceInfo,
}

#[derive(Debug, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
}

pub fn config_topic(cfg: &PowerConfig, unit: &str) -> String {
    format!("{}/sensor/{unit}_power/config", cfg.discovery_prefix)
}

pub fn build_payload(cfg: &PowerConfig, unit: &str, device_id: &str) -> DiscoveryPayload {
    DiscoveryPayload {
        name: format!("Faikin {unit} Power"),
        unique_id: format!("{device_id}_power"),
        state_topic: power_topic(unit),
        unit_of_measurement: "W".into(),
        device_class: "power".into(),
        state_class: "measurement".into(),
        icon: "mdi:flash".into(),
        // disponibilité liée au flag `up` du topic status de l'unité
        availability_topic: format!("{}/{unit}", cfg.status_prefix),
        availability_template: "{{ (value_json.up | default(true)) | string | lower }}".into(),
        payload_available: "true".into(),
        payload_not_available: "false".into(),
        device: DeviceInfo {
            identifiers: vec![device_id.to_string()],
            manufacturer: "RevK".into(),
            model: "Faikin".into(),
            name: format!("faikin-{unit}"),
            configuration_url: Some(format!("http://{unit}.local/")),
        },
    }
}

/// Annonce l'unité à Home Assistant si ce n'est pas déjà fait (idempotent).
pub fn announce(sink: &dyn PowerSink, cfg: &PowerConfig, st: &mut DeviceState, unit: &str) {
    if st.announced {
        return;
    }
    let payload = build_payload(cfg, unit, &st.device_id);
    match serde_json::to_string(&payload) {
        Ok(json) => {
            sink.publish(OutboundMessage {
                topic: config_topic(cfg, unit),
                payload: json,
                qos: QoS::AtLeastOnce,
                retain: true,
            });
            st.announced = true;
            log::info!("[discovery] published for unit={unit} device_id={}", st.device_id);
        }
        Err(e) => log::error!("[discovery] serialisation payload {unit}: {e}"),
    }
}
