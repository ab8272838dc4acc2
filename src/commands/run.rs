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
use log::{debug, info};
use std::process::Command;

/// Runs a child process while holding a lease on a resource.
pub struct RunCommand {
    client: LockClient,
}

impl RunCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
        })
    }

    /// Returns the child's exit code. The lease is released before returning,
    /// whether the child succeeded or not.
    pub fn execute(
        &self,
        resource: &str,
        wait: bool,
        attributes: &[Attribute],
        command: &[String],
    ) -> Result<i32> {
        let Some((program, args)) = command.split_first() else {
            return Err(SdbLockError::CommandFailed {
                command: String::new(),
                details: "no command given".to_string(),
            });
        };

        let guard = if wait {
            self.client.acquire(resource, attributes)?
        } else {
            self.client
                .try_acquire(resource, attributes)?
                .ok_or_else(|| SdbLockError::ResourceBusy(resource.to_string()))?
        };
        debug!("Holding '{resource}' (lease {}) for {program}", guard.lease_value());

        let status = Command::new(program).args(args).status();
        let released = guard.release()?;
        let status = status.map_err(|err| SdbLockError::CommandFailed {
            command: program.clone(),
            details: err.to_string(),
        })?;

        if !released {
            info!("Lease on '{resource}' was reclaimed while {program} was running");
        }

        // Terminated by a signal.
        Ok(status.code().unwrap_or(1))
    }
}
