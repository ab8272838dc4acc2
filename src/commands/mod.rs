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

pub mod acquire;
pub mod init;
pub mod list;
pub mod reap;
pub mod run;
pub mod status;
pub mod unlock;

use crate::config::SdbLockConfig;
use crate::error::Result;
use crate::locking::LockClient;
use crate::store::FileStore;
use std::sync::Arc;

/// Opens a client on the file-backed store under the configured home.
pub(crate) fn open_client(config: &SdbLockConfig) -> Result<LockClient> {
    let store = Arc::new(FileStore::new(config.domains_dir()));
    LockClient::from_config(store, config)
}
