//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use pw_core::WatchOptions;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decimal places kept on recorded times.
    pub precision: i32,
    /// Render readable timestamps in local time.
    pub local_time: bool,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Write JSON here instead of stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let watch = WatchOptions::default();
        Self {
            precision: watch.precision,
            local_time: watch.local_time,
            pretty: false,
            output: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PW_*)
        figment = figment.merge(Env::prefixed("PW_"));

        let config: Self = figment.extract()?;
        if !WatchOptions::PRECISION_RANGE.contains(&config.precision) {
            return Err(figment::Error::from(format!(
                "precision must be between {} and {}, got {}",
                WatchOptions::PRECISION_RANGE.start(),
                WatchOptions::PRECISION_RANGE.end(),
                config.precision
            )));
        }
        Ok(config)
    }

    /// Recorder settings derived from this configuration.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            precision: self.precision,
            local_time: self.local_time,
            ..WatchOptions::default()
        }
    }
}

/// Returns the platform-specific config directory for pw.
///
/// On Linux: `~/.config/pw`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pw"))
}
