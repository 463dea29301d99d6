//! Snapshot and configuration persistence through real files.

use mudcore::demo::demo_world;
use mudcore::{GameConfig, MudError, MudResult, Scheduler, World, WorldSnapshot};
use tempfile::TempDir;

#[test]
fn test_world_survives_save_and_restore() -> MudResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("world.json");

    let mut world = demo_world(21)?;
    let mut scheduler = Scheduler::new(GameConfig::default())?;
    scheduler.run(&mut world, 300);

    let snapshot = world.snapshot();
    snapshot.save(&path)?;
    let loaded = WorldSnapshot::load(&path)?;
    assert_eq!(loaded, snapshot);

    let mut restored = World::restore(&loaded, 21)?;
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.character_count(), world.character_count());
    assert_eq!(restored.object_count(), world.object_count());
    assert_eq!(restored.room_count(), world.room_count());
    // Links are not persisted.
    assert_eq!(restored.session_count(), 0);

    // The restored world keeps running cleanly.
    scheduler.run(&mut restored, 480);
    assert!(restored.check_integrity().is_ok());
    Ok(())
}

#[test]
fn test_snapshot_version_mismatch_is_rejected() -> MudResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("old.json");

    let mut snapshot = demo_world(3)?.snapshot();
    snapshot.version += 1;
    snapshot.save(&path)?;

    assert!(matches!(
        WorldSnapshot::load(&path),
        Err(MudError::InvalidState(_))
    ));
    Ok(())
}

#[test]
fn test_missing_snapshot_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = WorldSnapshot::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(MudError::Io(_))));
}

#[test]
fn test_config_round_trip() -> MudResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("game.json");

    let mut config = GameConfig::default();
    config.tick.pulses_per_second = 8;
    config.idle.void_after = 5;
    config.regen.idle.hit = 25;
    config.save(&path)?;

    assert_eq!(GameConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn test_partial_config_fills_defaults() -> MudResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{ "tick": { "violence_seconds": 2 } }"#)?;

    let config = GameConfig::load(&path)?;
    assert_eq!(config.tick.violence_seconds, 2);
    assert_eq!(config.tick.pulses_per_second, 4);
    assert_eq!(config.idle, GameConfig::default().idle);
    Ok(())
}

#[test]
fn test_invalid_config_file_is_rejected() -> MudResult<()> {
    let dir = TempDir::new()?;
    let zero = dir.path().join("zero.json");
    std::fs::write(&zero, r#"{ "tick": { "tick_seconds": 0 } }"#)?;
    assert!(matches!(GameConfig::load(&zero), Err(MudError::Config(_))));

    let garbled = dir.path().join("garbled.json");
    std::fs::write(&garbled, "{ tick: ")?;
    assert!(matches!(GameConfig::load(&garbled), Err(MudError::Serde(_))));
    Ok(())
}
