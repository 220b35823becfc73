/*!
Devkit Faikin Power

Outils de développement et de test du moteur d'estimation:
- `MockSink` : sink d'enregistrement sans broker MQTT réel
- `StatusBuilder` / `EngineHarness` : construction de payloads et moteur prêt
  à l'emploi pour les tests d'intégration
*/

pub mod harness;
pub mod sink;

pub use harness::{EngineHarness, StatusBuilder};
pub use sink::MockSink;
