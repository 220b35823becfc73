//! Scénarios bout-en-bout du moteur d'estimation sur horloge tokio en pause:
//! messages status injectés avec horodatage explicite, deadlines d'expiration
//! réelles (tasks tokio), publications observées via le MockSink du devkit.

use faikin_devkit::{EngineHarness, StatusBuilder};
use faikin_power::config::PowerConfig;
use std::time::Duration;
use time::macros::datetime;
use time::OffsetDateTime;

const T0: OffsetDateTime = datetime!(2026-01-01 00:00:00 UTC);

fn at(seconds: i64) -> OffsetDateTime {
    T0 + time::Duration::seconds(seconds)
}

#[tokio::test(start_paused = true)]
async fn kitchen_baseline_tick_then_expiry() {
    let h = EngineHarness::with_defaults();

    // première lecture: baseline seulement, capteur créé à 0
    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0]);

    // tick: 100 Wh sur 600 s -> 600 W, tenu jusqu'à 600 + 600 + 300 = 1500
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    // juste avant la fenêtre: toujours 600
    tokio::time::sleep(Duration::from_secs(899)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    // la fenêtre expire: 0 forcé
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0, 600.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn discovery_announced_once_per_unit() {
    let h = EngineHarness::with_defaults();
    h.status("kitchen", StatusBuilder::new().wh(100.0).id("DAIKIN42"), at(0));
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));

    let configs = h.sink.messages_on("homeassistant/sensor/kitchen_power/config");
    assert_eq!(configs.len(), 1);
    assert!(configs[0].retain);
    let payload: serde_json::Value = serde_json::from_str(&configs[0].payload).unwrap();
    assert_eq!(payload["unique_id"], "DAIKIN42_power");
    assert_eq!(payload["state_topic"], "faikin/kitchen/power_w");
}

#[tokio::test(start_paused = true)]
async fn superseded_deadline_never_zeroes_newer_value() {
    let h = EngineHarness::with_defaults();
    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    // deadline 1: armé maintenant pour dans 900 s (tokio)
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));

    tokio::time::sleep(Duration::from_secs(100)).await;
    // deadline 2 remplace le 1: 50 Wh sur 100 s -> 1800 W, fenêtre 400 s
    h.status("kitchen", StatusBuilder::new().wh(250.0), at(700));
    assert_eq!(h.sink.last_power("kitchen"), Some(1800.0));

    // deadline 2 expire normalement
    tokio::time::sleep(Duration::from_secs(401)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(0.0));

    // nouveau tick avant le réveil (périmé) du deadline 1
    h.status("kitchen", StatusBuilder::new().wh(300.0), at(1200));
    assert_eq!(h.sink.last_power("kitchen"), Some(360.0));

    // le deadline 1 (t tokio = 900) se réveille pendant ce sleep: no-op exigé
    tokio::time::sleep(Duration::from_secs(450)).await;
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0, 600.0, 1800.0, 0.0, 360.0]);
}

#[tokio::test(start_paused = true)]
async fn offline_mid_hold_forces_zero_and_cancels() {
    let h = EngineHarness::with_defaults();
    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));
    h.status("kitchen", StatusBuilder::new().up(false), at(700));
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0, 600.0, 0.0]);

    // le deadline annulé ne produit aucune publication supplémentaire
    tokio::time::sleep(Duration::from_secs(1000)).await;
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0, 600.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn counter_drop_keeps_held_value_until_own_deadline() {
    let h = EngineHarness::with_defaults();
    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));
    // chute du compteur: rebase silencieuse, la valeur tenue reste affichée
    h.status("kitchen", StatusBuilder::new().wh(50.0), at(700));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    tokio::time::sleep(Duration::from_secs(899)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.powers_for("kitchen"), vec![0.0, 600.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn factor_margin_expires_earlier_than_additive_would() {
    let mut cfg = PowerConfig::default();
    cfg.margin_factor = Some(0.5);
    let h = EngineHarness::new(cfg);

    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    // 50 Wh sur 400 s -> 450 W; fenêtre = 400 * 1.5 = 600 s (additif: 700 s)
    h.status("kitchen", StatusBuilder::new().wh(150.0), at(400));
    assert_eq!(h.sink.last_power("kitchen"), Some(450.0));

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(450.0));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(0.0));
}

#[tokio::test(start_paused = true)]
async fn fallback_estimates_only_outside_hold_window() {
    let mut cfg = PowerConfig::default();
    cfg.enable_comp_fallback = true;
    let h = EngineHarness::new(cfg);

    // aucun tick encore: l'estimation compresseur publie directement
    h.status("kitchen", StatusBuilder::new().comp(3.0).fanfreq(20.0), at(0));
    assert_eq!(h.sink.last_power("kitchen"), Some(150.0));

    h.status("kitchen", StatusBuilder::new().wh(100.0), at(10));
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(610));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    // fenêtre active: les signaux compresseur ne publient pas
    h.status("kitchen", StatusBuilder::new().comp(4.0), at(800));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    // expiration (fenêtre 900 s après le tick)
    tokio::time::sleep(Duration::from_secs(901)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(0.0));

    // hors fenêtre: l'estimation reprend
    h.status("kitchen", StatusBuilder::new().comp(4.0), at(1600));
    assert_eq!(h.sink.last_power("kitchen"), Some(200.0));
}

#[tokio::test(start_paused = true)]
async fn two_units_hold_and_expire_independently() {
    let h = EngineHarness::with_defaults();
    h.status("kitchen", StatusBuilder::new().wh(100.0), at(0));
    h.status("attic", StatusBuilder::new().wh(500.0), at(0));
    // kitchen: Δt 600 s -> fenêtre 900 s; attic: Δt 100 s -> fenêtre 400 s
    h.status("kitchen", StatusBuilder::new().wh(200.0), at(600));
    h.status("attic", StatusBuilder::new().wh(510.0), at(100));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));
    assert_eq!(h.sink.last_power("attic"), Some(360.0));

    // attic expire, kitchen tient encore
    tokio::time::sleep(Duration::from_secs(401)).await;
    assert_eq!(h.sink.last_power("attic"), Some(0.0));
    assert_eq!(h.sink.last_power("kitchen"), Some(600.0));

    tokio::time::sleep(Duration::from_secs(500)).await;
    assert_eq!(h.sink.last_power("kitchen"), Some(0.0));
}
