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

pub struct UnlockCommand {
    client: LockClient,
}

impl UnlockCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
        })
    }

    /// Releases `resource`. With `expected`, only a lease still holding that
    /// value is removed; a mismatch is reported as `ResourceBusy`.
    pub fn execute(&self, resource: &str, expected: Option<&str>) -> Result<()> {
        match expected {
            Some(expected) => {
                if !self.client.unlock_if(resource, expected)? {
                    return Err(SdbLockError::ResourceBusy(resource.to_string()));
                }
                println!("Unlocked '{resource}' (lease {expected})");
            }
            None => {
                self.client.unlock(resource)?;
                println!("Unlocked '{resource}'");
            }
        }
        Ok(())
    }
}
