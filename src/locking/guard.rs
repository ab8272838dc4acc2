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

use crate::error::Result;
use crate::locking::client::LockClient;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseMode {
    /// Delete the item whatever lease it holds.
    Unconditional,
    /// Delete only while the item still holds the lease this guard wrote.
    OwnLease,
}

/// RAII guard that releases a resource lease when dropped.
pub struct LeaseGuard<'a> {
    client: &'a LockClient,
    resource: String,
    lease: Option<String>,
    lease_value: String,
    mode: ReleaseMode,
}

impl<'a> LeaseGuard<'a> {
    pub(crate) fn new(
        client: &'a LockClient,
        resource: &str,
        lease: String,
        mode: ReleaseMode,
    ) -> Self {
        Self {
            client,
            resource: resource.to_string(),
            lease_value: lease.clone(),
            lease: Some(lease),
            mode,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Encoded `lock_time` this guard wrote.
    pub fn lease_value(&self) -> &str {
        &self.lease_value
    }

    /// Releases the lease now. Returns `false` when a guard that only
    /// releases its own lease found the item reaped or re-acquired.
    pub fn release(mut self) -> Result<bool> {
        match self.lease.take() {
            Some(lease) => self.release_lease(&lease),
            None => Ok(false),
        }
    }

    fn release_lease(&self, lease: &str) -> Result<bool> {
        match self.mode {
            ReleaseMode::Unconditional => self.client.unlock(&self.resource),
            ReleaseMode::OwnLease => {
                let released = self.client.unlock_if(&self.resource, lease)?;
                if !released {
                    warn!(
                        "Lease on '{}' taken at {lease} was no longer held at release",
                        self.resource
                    );
                }
                Ok(released)
            }
        }
    }
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take()
            && let Err(err) = self.release_lease(&lease)
        {
            warn!("Failed to release lease on '{}': {err}", self.resource);
        }
    }
}
