use crate::publisher::{OutboundMessage, PowerSink};
use crate::state::SharedUnits;
use rumqttc::QoS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

pub const HEALTH_TOPIC: &str = "faikin/power/health";

#[derive(Debug, Serialize, Deserialize)]
pub struct EngineHealth {
    pub uptime_seconds: u64,
    pub units_tracked: u32,
    pub mqtt_status: String,
    pub mqtt_reconnects: u32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    mqtt_reconnects: Arc<std::sync::atomic::AtomicU32>,
    mqtt_status: Arc<parking_lot::Mutex<String>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            mqtt_reconnects: Arc::new(std::sync::atomic::AtomicU32::new(0)),
            mqtt_status: Arc::new(parking_lot::Mutex::new("connecting".to_string())),
        }
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.mqtt_reconnects.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn get_health(&self, units: &SharedUnits) -> EngineHealth {
        EngineHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            units_tracked: units.lock().len() as u32,
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: self.mqtt_reconnects.load(std::sync::atomic::Ordering::Relaxed),
        }
    }

    /// Démarre la publication auto du health moteur toutes les 30s.
    pub fn spawn_health_publisher(&self, units: SharedUnits, sink: Arc<dyn PowerSink>) {
        let health_tracker = self.clone();

        task::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                let health = health_tracker.get_health(&units);
                match serde_json::to_string(&health) {
                    Ok(payload) => {
                        sink.publish(OutboundMessage {
                            topic: HEALTH_TOPIC.to_string(),
                            payload,
                            qos: QoS::AtMostOnce,
                            retain: false,
                        });
                        log::debug!(
                            "[health] published (uptime: {}s, units: {})",
                            health.uptime_seconds,
                            health.units_tracked
                        );
                    }
                    Err(e) => log::error!("[health] serialisation: {e}"),
                }
            }
        });
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}
