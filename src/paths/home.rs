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
use crate::paths::shared::ensure_directory;
use std::env;
use std::path::{Path, PathBuf};

pub const HOME_ENV_VAR: &str = "SDB_LOCK_HOME";
pub const DEFAULT_HOME_DIR: &str = ".sdb-lock";
pub const DOMAINS_DIR: &str = "domains";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DOCUMENT_EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

/// Resolves the home directory: `SDB_LOCK_HOME` when set and non-empty,
/// otherwise `~/.sdb-lock`.
pub fn resolve_home() -> Result<PathBuf> {
    if let Some(value) = env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
        let path = PathBuf::from(value);
        if path.is_relative() {
            return Ok(env::current_dir()?.join(path));
        }
        return Ok(path);
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_HOME_DIR))
        .ok_or_else(|| {
            SdbLockError::ConfigError(format!(
                "Unable to determine the home directory; set {HOME_ENV_VAR} explicitly"
            ))
        })
}

pub fn config_file(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE_NAME)
}

pub fn domains_dir(home: &Path) -> PathBuf {
    home.join(DOMAINS_DIR)
}

pub fn ensure_domains_dir(home: &Path) -> Result<PathBuf> {
    ensure_directory(domains_dir(home))
}

/// Document holding every item of `domain` inside a store root.
pub fn domain_document_path(store_root: &Path, domain: &str) -> PathBuf {
    store_root.join(format!("{domain}.{DOCUMENT_EXTENSION}"))
}

/// Advisory lock file serializing access to the domain document.
pub fn domain_lock_path(store_root: &Path, domain: &str) -> PathBuf {
    store_root.join(format!("{domain}.{LOCK_EXTENSION}"))
}
