//! Where a bot reads its configuration from.
//!
//! [`ConfigLoader`] layers figment sources so that each one can
//! override the one below it:
//!
//! 1. built-in defaults ([`ColloquyConfig::default`])
//! 2. profile-specific file, e.g. `colloquy.production.toml`
//! 3. main file (`colloquy.toml`, `config.toml`, yaml variants)
//! 4. `COLLOQUY_*` environment variables
//! 5. programmatic overrides passed to [`ConfigLoader::merge`]
//!
//! Files are searched in the working directory and in the user config
//! directory (`~/.config/colloquy` on Linux) unless an explicit file or
//! search path is given. Which formats are recognized depends on the
//! `toml-config` and `yaml-config` features.
//!
//! Environment variables map onto the schema with a `COLLOQUY_` prefix
//! and `__` between nesting levels:
//! `COLLOQUY_FSM__STORAGE=redis://127.0.0.1:6379` sets `fsm.storage`,
//! `COLLOQUY_LOGGING__LEVEL=debug` sets `logging.level`. The active
//! profile comes from `COLLOQUY_PROFILE` unless set on the loader.
//!
//! ```rust,ignore
//! use colloquy_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/colloquy.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ColloquyConfig;

#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["colloquy.toml", "config.toml"];
#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["colloquy.yaml", "colloquy.yml", "config.yaml", "config.yml"];

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<ColloquyConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from one file, still applying env overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ColloquyConfig> {
    ConfigLoader::new().file(path).load()
}

/// Deployment profile selecting which file variants apply.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Custom(name.to_string()),
        }
    }

    /// Reads `COLLOQUY_PROFILE`, falling back to development.
    pub fn from_env() -> Self {
        std::env::var("COLLOQUY_PROFILE")
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder assembling the configuration from files, environment, and
/// programmatic overrides.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    read_env: bool,
    explicit_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            read_env: true,
            explicit_file: None,
        }
    }

    /// Selects the profile, overriding `COLLOQUY_PROFILE`.
    pub fn profile(mut self, name: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(name.as_ref());
        self
    }

    /// Adds a directory to look for configuration files in. Once any
    /// path is added, the default locations are no longer searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Reads exactly this file instead of searching. Missing file is an
    /// error here, while an empty search just falls back to defaults.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skips the `COLLOQUY_*` environment layer.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Layers a partial configuration on top of everything read from
    /// files and the environment.
    pub fn merge(mut self, config: ColloquyConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Resolves all sources into a [`ColloquyConfig`].
    pub fn load(self) -> ConfigResult<ColloquyConfig> {
        let profile = self.profile.clone();
        let figment = self.assemble()?;

        let config: ColloquyConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("invalid configuration: {e}")))?;

        debug!(
            profile = %profile,
            storage = %config.fsm.storage,
            logging_level = %config.logging.level,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn assemble(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ColloquyConfig::default()));

        if let Some(path) = &self.explicit_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Reading configuration file");
            figment = merge_file(figment, path)?;
        } else {
            let candidates = self.candidate_files();
            if candidates.is_empty() {
                warn!("No configuration file found, running on defaults");
            }
            for path in candidates {
                info!(path = %path.display(), "Reading configuration file");
                figment = merge_file(figment, &path)?;
            }
        }

        if self.read_env {
            trace!("Applying COLLOQUY_ environment overrides");
            figment = figment.merge(Env::prefixed("COLLOQUY_").split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Existing configuration files in merge order: for each format,
    /// the profile variant first so the base file wins ties, stopping
    /// at the first directory that has the base file.
    fn candidate_files(&self) -> Vec<PathBuf> {
        let dirs = if self.search_paths.is_empty() {
            default_search_paths()
        } else {
            self.search_paths.clone()
        };

        let mut found = Vec::new();
        for names in enabled_formats() {
            'format: for dir in &dirs {
                for name in *names {
                    if let Some(variant) = self.profile_variant(dir, name) {
                        debug!(path = %variant.display(), "Found profile configuration");
                        found.push(variant);
                    }
                    let base = dir.join(name);
                    if base.exists() {
                        found.push(base);
                        break 'format;
                    }
                }
            }
        }
        found
    }

    /// `colloquy.toml` + `production` → `colloquy.production.toml`, if
    /// that file exists.
    fn profile_variant(&self, dir: &Path, base_name: &str) -> Option<PathBuf> {
        let (stem, ext) = base_name.rsplit_once('.')?;
        let path = dir.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
        path.exists().then_some(path)
    }
}

fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("colloquy"));
    }
    paths
}

fn enabled_formats() -> &'static [&'static [&'static str]] {
    &[
        #[cfg(feature = "toml-config")]
        TOML_NAMES,
        #[cfg(feature = "yaml-config")]
        YAML_NAMES,
    ]
}

/// Dispatches on the extension; formats behind disabled features are
/// rejected rather than silently skipped.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "unsupported or disabled configuration format: .{ext}"
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
