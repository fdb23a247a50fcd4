//! Configuration manager - main API for config operations

use crate::app_config::LogLevel;
use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration manager
///
/// Resolves the platform config and data directories, and loads or saves
/// `config.toml` through [`ConfigPersistence`].
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager for the platform directories
    ///
    /// - Linux: `~/.config/audiofolio/`
    /// - macOS: `~/Library/Application Support/audiofolio/`
    /// - Windows: `%APPDATA%\audiofolio\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = Self::project_dirs()?;
        let mut manager = Self::with_directory(dirs.config_dir().to_path_buf())?;
        manager.data_dir = dirs.data_dir().to_path_buf();
        Ok(manager)
    }

    /// Creates a config manager rooted at a custom directory
    ///
    /// The directory doubles as the data directory, so relative state paths
    /// resolve next to the config file.
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE_NAME));

        Ok(Self {
            persistence,
            data_dir: config_dir.clone(),
            config_dir,
        })
    }

    /// Creates a config manager for an explicit config file path
    pub fn with_file(config_path: PathBuf) -> ConfigResult<Self> {
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::NoConfigDir {
                reason: format!("{} has no parent directory", config_path.display()),
            })?;

        Ok(Self {
            persistence: ConfigPersistence::new(config_path),
            data_dir: config_dir.clone(),
            config_dir,
        })
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("", "", "audiofolio").ok_or_else(|| ConfigError::NoConfigDir {
            reason: "Could not determine user config directory".to_string(),
        })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Path of `config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.persistence.config_path().to_path_buf()
    }

    /// Resolves `app.state_path` against the data directory
    pub fn state_path(&self, config: &Config) -> PathBuf {
        if config.app.state_path.is_absolute() {
            config.app.state_path.clone()
        } else {
            self.data_dir.join(&config.app.state_path)
        }
    }

    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and writes `config`, keeping the previous file as `.backup`
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, modifies and saves the configuration
    ///
    /// ```rust,no_run
    /// # use audiofolio_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.player.seek_step_secs = 15;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns `Ok(true)` if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Overwrites the config file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every validation message for the stored config
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `AUDIOFOLIO_SECTION_FIELD` overrides
    ///
    /// Recognised variables: `AUDIOFOLIO_LIBRARY_ROOT`,
    /// `AUDIOFOLIO_APP_STATE_PATH`, `AUDIOFOLIO_APP_LOG_LEVEL`,
    /// `AUDIOFOLIO_PLAYER_TICK_INTERVAL_MS` and
    /// `AUDIOFOLIO_PLAYER_CHECKPOINT_EVERY_TICKS`.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = lookup("AUDIOFOLIO_LIBRARY_ROOT") {
        config.library.default_root = Some(PathBuf::from(root));
    }

    if let Some(path) = lookup("AUDIOFOLIO_APP_STATE_PATH") {
        config.app.state_path = PathBuf::from(path);
    }

    if let Some(level) = lookup("AUDIOFOLIO_APP_LOG_LEVEL") {
        config.app.log_level =
            LogLevel::parse(&level).ok_or_else(|| ConfigError::EnvOverride {
                variable: "AUDIOFOLIO_APP_LOG_LEVEL".to_string(),
                value: level.clone(),
            })?;
    }

    if let Some(value) = lookup("AUDIOFOLIO_PLAYER_TICK_INTERVAL_MS") {
        config.player.tick_interval_ms =
            parse_override("AUDIOFOLIO_PLAYER_TICK_INTERVAL_MS", &value)?;
    }

    if let Some(value) = lookup("AUDIOFOLIO_PLAYER_CHECKPOINT_EVERY_TICKS") {
        config.player.checkpoint_every_ticks =
            parse_override("AUDIOFOLIO_PLAYER_CHECKPOINT_EVERY_TICKS", &value)?;
    }

    Ok(())
}

fn parse_override<T: FromStr>(variable: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::EnvOverride {
        variable: variable.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[player\n").expect("write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| config.player.seek_step_secs = 45)
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.player.seek_step_secs, 45);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.player.checkpoint_every_ticks = 5;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_state_path_relative_to_data_dir() {
        let (temp_dir, manager) = setup_test_manager();
        let config = Config::default();
        assert_eq!(manager.state_path(&config), temp_dir.path().join("state.json"));
    }

    #[test]
    fn test_state_path_absolute_kept() {
        let (_temp_dir, manager) = setup_test_manager();
        let mut config = Config::default();
        config.app.state_path = PathBuf::from("/var/lib/audiofolio/state.json");
        assert_eq!(
            manager.state_path(&config),
            PathBuf::from("/var/lib/audiofolio/state.json")
        );
    }

    #[test]
    fn test_with_file_uses_parent_dir() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("custom.toml");
        let manager = ConfigManager::with_file(path.clone()).expect("manager");
        assert_eq!(manager.config_path(), path);
        assert_eq!(manager.config_dir(), &temp_dir.path().to_path_buf());
    }

    #[test]
    fn test_env_overrides_applied() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("AUDIOFOLIO_LIBRARY_ROOT", "/books"),
                ("AUDIOFOLIO_PLAYER_TICK_INTERVAL_MS", "500"),
                ("AUDIOFOLIO_PLAYER_CHECKPOINT_EVERY_TICKS", "10"),
                ("AUDIOFOLIO_APP_LOG_LEVEL", "debug"),
            ]),
        )
        .expect("overrides");

        assert_eq!(config.library.default_root, Some(PathBuf::from("/books")));
        assert_eq!(config.player.tick_interval_ms, 500);
        assert_eq!(config.player.checkpoint_every_ticks, 10);
        assert_eq!(config.app.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let result = apply_env_overrides(
            &mut config,
            env(&[("AUDIOFOLIO_PLAYER_TICK_INTERVAL_MS", "soon")]),
        );
        assert!(matches!(result, Err(ConfigError::EnvOverride { .. })));
    }
}
