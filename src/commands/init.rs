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

use crate::config::SdbLockConfig;
use crate::error::Result;
use crate::locking::LockClient;
use crate::paths;
use crate::store::FileStore;
use log::info;
use std::sync::Arc;

pub struct InitCommand<'a> {
    config: &'a SdbLockConfig,
}

impl<'a> InitCommand<'a> {
    pub fn new(config: &'a SdbLockConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn execute(&self) -> Result<()> {
        let root = paths::ensure_domains_dir(self.config.home())?;
        let client = LockClient::new(Arc::new(FileStore::new(root.clone())), &self.config.domain)?;
        client.create_domain()?;

        info!("Domain '{}' ready under {}", client.domain(), root.display());
        println!("Initialized domain '{}'", client.domain());
        Ok(())
    }
}
