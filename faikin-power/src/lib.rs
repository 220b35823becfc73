/*!
Moteur d'estimation de puissance Faikin: lecture des compteurs d'énergie vie
publiés en MQTT, détection de ticks, puissance ΔWh/Δt tenue sur fenêtre bornée,
expiration à zéro, estimation compresseur de repli optionnelle.

Le binaire (`main.rs`) branche ce moteur sur un broker MQTT réel; la lib est
aussi consommée telle quelle par les tests d'intégration via `faikin-devkit`.
*/

pub mod config;
pub mod discovery;
pub mod engine;
pub mod fallback;
pub mod health;
pub mod hold;
pub mod http;
pub mod models;
pub mod mqtt;
pub mod publisher;
pub mod state;
