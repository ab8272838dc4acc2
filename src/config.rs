// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::{Result, SdbLockError};
use crate::locking::PollingBackoff;
use crate::paths;
use crate::store::validate_domain_name;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "SDB_LOCK";
const DEFAULT_DOMAIN: &str = "sdb_lock";
const DEFAULT_INITIAL_WAIT_MS: u64 = 500;
const DEFAULT_MAX_WAIT_MS: u64 = 2_000;
const DEFAULT_BACKOFF_FACTOR: u32 = 2;
const DEFAULT_REAP_AGE_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdbLockConfig {
    /// Domain holding the lock items.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Provision the domain when the client starts.
    #[serde(default)]
    pub create_domain: bool,

    #[serde(default)]
    pub locking: LockingConfig,

    #[serde(default)]
    pub reaper: ReaperConfig,

    #[serde(skip)]
    pub(crate) home: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingConfig {
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaperConfig {
    #[serde(default = "default_reap_age_secs")]
    pub default_age_secs: u64,
}

impl Default for SdbLockConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            create_domain: false,
            locking: LockingConfig::default(),
            reaper: ReaperConfig::default(),
            home: PathBuf::new(),
        }
    }
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            initial_wait_ms: DEFAULT_INITIAL_WAIT_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            default_age_secs: DEFAULT_REAP_AGE_SECS,
        }
    }
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_initial_wait_ms() -> u64 {
    DEFAULT_INITIAL_WAIT_MS
}

fn default_max_wait_ms() -> u64 {
    DEFAULT_MAX_WAIT_MS
}

fn default_backoff_factor() -> u32 {
    DEFAULT_BACKOFF_FACTOR
}

fn default_reap_age_secs() -> u64 {
    DEFAULT_REAP_AGE_SECS
}

impl LockingConfig {
    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn backoff(&self) -> PollingBackoff {
        PollingBackoff::new(self.initial_wait(), self.backoff_factor, self.max_wait())
    }
}

impl ReaperConfig {
    pub fn default_age(&self) -> Duration {
        Duration::from_secs(self.default_age_secs)
    }
}

/// Loads configuration from the resolved home directory.
pub fn new_sdb_lock_config() -> Result<SdbLockConfig> {
    let home = paths::resolve_home()?;
    SdbLockConfig::load(&home)
}

impl SdbLockConfig {
    /// Layers built-in defaults, `<home>/config.toml` and `SDB_LOCK_*`
    /// environment variables, in increasing precedence.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = paths::config_file(home);
        if config_path.exists() {
            log::debug!("Loading config from {}", config_path.display());
        } else {
            log::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
        }

        let defaults = Config::try_from(&SdbLockConfig::default())
            .map_err(|e| SdbLockError::ConfigError(format!("Failed to seed defaults: {e}")))?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SdbLockError::ConfigError(format!("Failed to read config.toml: {e}")))?;

        let mut config: SdbLockConfig = settings
            .try_deserialize()
            .map_err(|e| SdbLockError::ConfigError(format!("Failed to parse config: {e}")))?;
        config.home = home.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        let config_path = paths::config_file(home);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| SdbLockError::ConfigError(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, contents)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain)
            .map_err(|_| SdbLockError::InvalidConfig(format!("domain '{}' is invalid", self.domain)))?;

        let locking = &self.locking;
        if locking.initial_wait_ms == 0 {
            return Err(SdbLockError::InvalidConfig(
                "locking.initial_wait_ms must be greater than zero".to_string(),
            ));
        }
        if locking.max_wait_ms < locking.initial_wait_ms {
            return Err(SdbLockError::InvalidConfig(format!(
                "locking.max_wait_ms ({}) must not be below locking.initial_wait_ms ({})",
                locking.max_wait_ms, locking.initial_wait_ms
            )));
        }
        if locking.backoff_factor == 0 {
            return Err(SdbLockError::InvalidConfig(
                "locking.backoff_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn with_home<P: Into<PathBuf>>(mut self, home: P) -> Self {
        self.home = home.into();
        self
    }

    /// Directory the file-backed store keeps domain documents in.
    pub fn domains_dir(&self) -> PathBuf {
        paths::domains_dir(&self.home)
    }
}
