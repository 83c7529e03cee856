//! Settings for the tree engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading settings. These are the only fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("Failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`].
    #[error("Malformed settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An ignore pattern is not a valid glob.
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// User-configured entries hidden from the view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ignored {
    /// Exact file names.
    pub name_exact: Vec<String>,
    /// Glob patterns matched against the file name.
    pub name_glob: Vec<String>,
    /// Glob patterns matched against the full path.
    pub path_glob: Vec<String>,
}

impl Ignored {
    /// Compile the patterns into a matcher.
    pub fn compile(&self) -> Result<IgnoreMatcher, ConfigError> {
        Ok(IgnoreMatcher {
            name_exact: self.name_exact.clone(),
            name_glob: build_globset(&self.name_glob)?,
            path_glob: build_globset(&self.path_glob)?,
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Pattern {
        pattern: patterns.join(","),
        source,
    })
}

/// Compiled form of [`Ignored`].
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    name_exact: Vec<String>,
    name_glob: GlobSet,
    path_glob: GlobSet,
}

impl IgnoreMatcher {
    /// Check if a path is ignored by name or full path.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.name_exact.iter().any(|n| *n == name)
            || self.name_glob.is_match(name.as_ref())
            || self.path_glob.is_match(path)
    }
}

/// Engine settings.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct Settings {
    /// Interval between background refreshes while the host has focus.
    #[builder(default = "2000")]
    pub polling_rate_ms: u64,

    /// Recurse into directories reached through symlinks.
    #[builder(default = "true")]
    pub follow_links: bool,

    /// Reveal the host's current file when it changes.
    #[builder(default = "true")]
    pub follow: bool,

    /// Show dot-prefixed entries.
    #[builder(default = "false")]
    pub show_hidden: bool,

    /// Initial side panel width in columns.
    #[builder(default = "40")]
    pub width: usize,

    /// Restore and save the session blob.
    #[builder(default = "true")]
    pub session: bool,

    /// Override for the session storage directory.
    #[builder(default)]
    pub session_dir: Option<PathBuf>,

    /// Number of walk worker threads (0 = CPU count).
    #[builder(default = "0")]
    pub walk_threads: usize,

    /// Log time-to-first-draw.
    #[builder(default = "false")]
    pub profiling: bool,

    /// Render attempts per redraw before giving up.
    #[builder(default = "3")]
    pub render_retries: usize,

    /// Entries hidden from the view.
    #[builder(default)]
    pub ignore: Ignored,
}

impl SettingsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.polling_rate_ms == Some(0) {
            return Err("Polling rate must be positive".to_string());
        }
        if self.render_retries == Some(0) {
            return Err("Render retries must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            polling_rate_ms: 2000,
            follow_links: true,
            follow: true,
            show_hidden: false,
            width: 40,
            session: true,
            session_dir: None,
            walk_threads: 0,
            profiling: false,
            render_retries: 3,
            ignore: Ignored::default(),
        }
    }
}

impl Settings {
    /// Create a new settings builder.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Default settings file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sidetree").join("settings.toml"))
    }

    /// Load settings from the default location, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        // Fail at startup rather than on first render.
        settings.ignore.compile()?;
        Ok(settings)
    }

    /// Polling interval as a duration.
    pub fn polling_rate(&self) -> Duration {
        Duration::from_millis(self.polling_rate_ms.max(1))
    }

    /// Session storage directory.
    pub fn session_storage(&self) -> PathBuf {
        self.session_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sidetree")
                .join("sessions")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builder() {
        let settings = Settings::builder()
            .polling_rate_ms(500u64)
            .follow_links(false)
            .build()
            .unwrap();

        assert_eq!(settings.polling_rate(), Duration::from_millis(500));
        assert!(!settings.follow_links);
        assert_eq!(settings.render_retries, 3);
    }

    #[test]
    fn test_builder_rejects_zero_polling() {
        assert!(Settings::builder().polling_rate_ms(0u64).build().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let settings = Settings::parse(
            Path::new("settings.toml"),
            "show_hidden = true\n[ignore]\nname_exact = [\".git\"]\n",
        )
        .unwrap();
        assert!(settings.show_hidden);
        assert!(settings.follow_links);
        assert_eq!(settings.ignore.name_exact, vec![".git".to_string()]);
    }

    #[test]
    fn test_parse_malformed_toml() {
        let err = Settings::parse(Path::new("settings.toml"), "width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_ignore_matcher() {
        let ignored = Ignored {
            name_exact: vec!["node_modules".to_string()],
            name_glob: vec!["*.pyc".to_string()],
            path_glob: vec!["/tmp/build/**".to_string()],
        };
        let matcher = ignored.compile().unwrap();

        assert!(matcher.is_ignored(Path::new("/p/node_modules")));
        assert!(matcher.is_ignored(Path::new("/p/x.pyc")));
        assert!(matcher.is_ignored(Path::new("/tmp/build/out/a.o")));
        assert!(!matcher.is_ignored(Path::new("/p/src")));
    }
}
