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
use crate::error::Result;
use crate::locking::LockClient;
use crate::locking::time_format;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct StatusOutput {
    resource: String,
    locked: bool,
    lease: Option<String>,
    locked_at: Option<String>,
    held_secs: Option<i64>,
}

pub struct StatusCommand {
    client: LockClient,
}

impl StatusCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
        })
    }

    pub fn execute(&self, resource: &str, json: bool) -> Result<()> {
        let status = self.status_at(resource, Utc::now())?;

        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }

        match (&status.locked_at, status.held_secs) {
            (Some(locked_at), Some(held)) => {
                println!("'{resource}' locked since {locked_at} ({held}s)")
            }
            _ => println!("'{resource}' is not locked"),
        }
        Ok(())
    }

    pub(crate) fn status_at(&self, resource: &str, now: DateTime<Utc>) -> Result<StatusOutput> {
        let lease = self.client.lease_value(resource)?;
        let locked_at = lease
            .as_deref()
            .map(|value| time_format::decode(resource, value))
            .transpose()?;

        Ok(StatusOutput {
            resource: resource.to_string(),
            locked: lease.is_some(),
            lease,
            locked_at: locked_at.map(|time| time.to_rfc3339()),
            held_secs: locked_at.map(|time| (now - time).num_seconds().max(0)),
        })
    }
}
