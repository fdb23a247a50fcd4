//! Library folder configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_COVER_FILE_NAME: &str = "cover.jpg";

/// Where books live and which files count as chapters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Used when no library root has been selected yet
    pub default_root: Option<PathBuf>,

    /// Chapter file extensions, matched case-insensitively
    pub supported_extensions: Vec<String>,

    pub cover_file_name: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_root: None,
            supported_extensions: vec!["mp3".to_string(), "m4a".to_string()],
            cover_file_name: DEFAULT_COVER_FILE_NAME.to_string(),
        }
    }
}

impl LibraryConfig {
    /// Checks whether a file extension is a supported chapter format
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        self.supported_extensions
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(ext))
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::non_empty_list(
                &self.supported_extensions,
                "library.supported_extensions",
            ),
            Validator::not_empty(&self.cover_file_name, "library.cover_file_name"),
        ];

        for ext in &self.supported_extensions {
            if ext.trim().is_empty() || ext.starts_with('.') {
                results.push(Err(ValidationError::with_value(
                    "library.supported_extensions",
                    "extensions are written without a leading dot",
                    ext,
                )));
            }
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        if other.default_root.is_some() {
            self.default_root = other.default_root;
        }
        self.supported_extensions = other.supported_extensions;
        self.cover_file_name = other.cover_file_name;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LibraryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_supported_extension_case_insensitive() {
        let config = LibraryConfig::default();
        assert!(config.is_supported_extension("MP3"));
        assert!(config.is_supported_extension("m4a"));
        assert!(!config.is_supported_extension("flac"));
    }

    #[test]
    fn test_empty_extensions_invalid() {
        let config = LibraryConfig {
            supported_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dotted_extension_invalid() {
        let config = LibraryConfig {
            supported_extensions: vec![".mp3".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_keeps_root_when_other_unset() {
        let mut base = LibraryConfig {
            default_root: Some(PathBuf::from("/books")),
            ..Default::default()
        };
        base.merge(LibraryConfig::default());
        assert_eq!(base.default_root, Some(PathBuf::from("/books")));
    }
}
