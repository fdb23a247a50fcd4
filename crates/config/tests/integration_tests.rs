//! Integration tests for the configuration system

use audiofolio_config::{
    Config, ConfigManager, ConfigSection, LibraryConfig, LogLevel, PlayerConfig, CONFIG_VERSION,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.player.checkpoint_every_ticks = 10;
    modified.library.default_root = Some(PathBuf::from("/media/books"));
    modified.app.log_level = LogLevel::Debug;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded, modified);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_config_validation_integration() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    manager.save(&Config::default())?;
    assert!(manager.validate()?.is_empty());

    let mut invalid = Config::default();
    invalid.player.tick_interval_ms = 50;
    assert!(manager.save(&invalid).is_err());

    Ok(())
}

#[test]
fn test_hand_edited_invalid_values_load_with_warning() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    std::fs::write(
        manager.config_path(),
        "version = 1\n[player]\ncheckpoint_every_ticks = 0\n",
    )?;

    let loaded = manager.load()?;
    assert_eq!(loaded.player.checkpoint_every_ticks, 0);

    let errors = manager.validate()?;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("player.checkpoint_every_ticks"));

    Ok(())
}

#[test]
fn test_atomic_save_keeps_backup() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let mut first = Config::default();
    first.player.seek_step_secs = 20;
    manager.save(&first)?;

    manager.save(&Config::default())?;

    let backup = std::fs::read_to_string(manager.config_path().with_extension("toml.backup"))?;
    let backed_up: Config = toml::from_str(&backup)?;
    assert_eq!(backed_up.player.seek_step_secs, 20);

    Ok(())
}

#[test]
fn test_section_names() {
    assert_eq!(PlayerConfig::default().section_name(), "player");
    assert_eq!(LibraryConfig::default().section_name(), "library");
}
