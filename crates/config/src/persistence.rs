//! Reading and writing `config.toml`
//!
//! Saves never leave a half-written file behind: the new contents go to a
//! temporary file next to the config and are renamed over it. The file being
//! replaced is kept as `config.toml.backup`, one generation deep.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Loads and saves one config file
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where the previous contents go on save
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.config_path.as_os_str().to_owned();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Reads the config file
    ///
    /// A missing file is the default config. Out-of-range values are only
    /// logged, so a hand-edited file still loads and can be fixed in place.
    pub fn load(&self) -> ConfigResult<Config> {
        let contents = match fs::read_to_string(&self.config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.config_path.clone(),
                    source,
                })
            }
        };

        let config = self.parse(&contents).inspect_err(|_| self.point_at_backup())?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} was written by a newer version (format {}, this build reads {})",
                self.config_path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("Config: {}", error);
            }
        }

        Ok(config)
    }

    fn parse(&self, contents: &str) -> ConfigResult<Config> {
        if contents.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.config_path.clone(),
            });
        }
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })
    }

    fn point_at_backup(&self) {
        let backup = self.backup_path();
        if backup.exists() {
            log::warn!("Previous settings are in {}", backup.display());
        }
    }

    /// Writes `config` if it validates, keeping the old file as the backup
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let contents = toml::to_string_pretty(config)?;

        let dir = match self.config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => {
                return Err(ConfigError::NoConfigDir {
                    reason: format!("{} has no parent directory", self.config_path.display()),
                })
            }
        };
        fs::create_dir_all(&dir).map_err(|e| ConfigError::write(&dir, e))?;

        if self.config_path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.config_path, &backup).map_err(|e| ConfigError::write(&backup, e))?;
            log::debug!("Kept previous config as {}", backup.display());
        }

        self.replace_file(&dir, &contents)
            .map_err(|e| ConfigError::write(&self.config_path, e))?;
        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn replace_file(&self, dir: &Path, contents: &str) -> io::Result<()> {
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.config_path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn persistence_in(temp_dir: &TempDir) -> ConfigPersistence {
        ConfigPersistence::new(temp_dir.path().join("config.toml"))
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = persistence_in(&temp_dir).load().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);

        let mut config = Config::default();
        config.player.checkpoint_every_ticks = 12;
        config.library.default_root = Some(PathBuf::from("/srv/audiobooks"));

        persistence.save(&config).unwrap();
        assert_eq!(persistence.load().unwrap(), config);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        ConfigPersistence::new(config_path.clone())
            .save(&Config::default())
            .unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn test_backup_holds_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);
        assert_eq!(
            persistence.backup_path(),
            temp_dir.path().join("config.toml.backup")
        );

        let mut first = Config::default();
        first.player.seek_step_secs = 10;
        persistence.save(&first).unwrap();
        assert!(!persistence.backup_path().exists());

        let mut second = Config::default();
        second.player.seek_step_secs = 20;
        persistence.save(&second).unwrap();

        let backup = fs::read_to_string(persistence.backup_path()).unwrap();
        let backup: Config = toml::from_str(&backup).unwrap();
        assert_eq!(backup, first);
        assert_eq!(persistence.load().unwrap(), second);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);
        fs::write(persistence.config_path(), "this is not valid TOML {{{").unwrap();

        assert!(matches!(persistence.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_blank_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);
        fs::write(persistence.config_path(), "  \n").unwrap();

        assert!(matches!(persistence.load(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);
        fs::write(persistence.config_path(), "[player]\nseek_step_secs = 15\n").unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.player.seek_step_secs, 15);
        assert_eq!(loaded.player.tick_interval_ms, 1000);
        assert_eq!(loaded.library.cover_file_name, "cover.jpg");
    }

    #[test]
    fn test_out_of_range_values_are_not_saved() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence_in(&temp_dir);

        let mut config = Config::default();
        config.player.checkpoint_every_ticks = 0;

        match persistence.save(&config) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "player.checkpoint_every_ticks");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert!(!persistence.config_path().exists());
    }
}
