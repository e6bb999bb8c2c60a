use std::fs;
use std::time::Duration;

use game_core::WaterRule;
use runtime::{ConfigError, Runtime, RuntimeConfig};

const DOCUMENT: &str = r#"(
    game_config: (
        water_rule: Wade(cost: 3),
        wins_to_victory: 2,
    ),
    turn_duration_ms: 12000,
    transition_duration_ms: 500,
    combat_round_ms: 2500,
    command_buffer_size: 8,
)"#;

#[test]
fn loads_runtime_config_from_ron_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime.ron");
    fs::write(&path, DOCUMENT).unwrap();

    let config = RuntimeConfig::load(&path).unwrap();

    assert_eq!(config.turn_duration, Duration::from_secs(12));
    assert_eq!(config.transition_duration, Duration::from_millis(500));
    assert_eq!(config.combat_round_interval, Duration::from_millis(2500));
    assert_eq!(config.command_buffer_size, 8);
    assert_eq!(config.event_buffer_size, 100);
    assert_eq!(config.game_config.water_rule, WaterRule::Wade { cost: 3 });
    assert_eq!(config.game_config.wins_to_victory, 2);
    assert_eq!(config.game_config.actions_per_turn, 1);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    fs::write(&path, "(turn_duration_ms: ").unwrap();

    assert!(matches!(
        RuntimeConfig::load(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn written_config_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.ron");
    let config = RuntimeConfig::default().with_turn_duration(Duration::from_millis(750));
    fs::write(&path, ron::to_string(&config).unwrap()).unwrap();

    assert_eq!(RuntimeConfig::load(&path).unwrap(), config);
}

#[tokio::test]
async fn runtime_uses_the_loaded_config() {
    let config = RuntimeConfig::from_ron_str(DOCUMENT).unwrap();
    let runtime = Runtime::builder().config(config.clone()).build();

    assert_eq!(runtime.handle().config(), &config);
    runtime.shutdown().await.unwrap();
}
