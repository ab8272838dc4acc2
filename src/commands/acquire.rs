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

use crate::commands::open_client;
use crate::config::SdbLockConfig;
use crate::error::{Result, SdbLockError};
use crate::locking::LockClient;
use crate::store::Attribute;
use chrono::Utc;
use log::debug;

/// Takes a lease and leaves it in place for a later `unlock`.
pub struct AcquireCommand {
    client: LockClient,
}

impl AcquireCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
        })
    }

    /// Makes one attempt; a held lease is reported as `ResourceBusy`.
    /// Returns the lease value written.
    pub fn try_lock(&self, resource: &str, attributes: &[Attribute]) -> Result<String> {
        let lease = self
            .client
            .try_lock_at(resource, attributes, Utc::now())?
            .ok_or_else(|| SdbLockError::ResourceBusy(resource.to_string()))?;
        println!("Locked '{resource}' (lease {lease})");
        Ok(lease)
    }

    /// Waits with backoff until the lease is taken.
    pub fn lock(&self, resource: &str, attributes: &[Attribute]) -> Result<String> {
        debug!(
            "Waiting for '{resource}' in domain '{}'",
            self.client.domain()
        );
        let lease = self.client.lock_blocking(resource, attributes)?;
        println!("Locked '{resource}' (lease {lease})");
        Ok(lease)
    }
}
