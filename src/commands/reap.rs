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
use crate::locking::{LeaseReaper, LockClient};
use std::time::Duration;

pub struct ReapCommand {
    client: LockClient,
    default_age: Duration,
}

impl ReapCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
            default_age: config.reaper.default_age(),
        })
    }

    pub fn execute(&self, older_than: Option<Duration>, json: bool) -> Result<()> {
        let age = older_than.unwrap_or(self.default_age);
        let report = LeaseReaper::new(&self.client, age).run()?;

        if json {
            let mut output = serde_json::to_value(&report)?;
            output["age_secs"] = age.as_secs().into();
            output["duration_ms"] = u64::try_from(report.duration.as_millis())
                .unwrap_or(u64::MAX)
                .into();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if report.unlocked.is_empty() {
            println!("No leases older than {}s", age.as_secs());
        } else {
            println!("Unlocked {} stale lease(s):", report.unlocked.len());
            for resource in &report.unlocked {
                println!("  {resource}");
            }
        }
        let skipped = report.skipped_released + report.skipped_fresh + report.lost_races;
        if skipped > 0 {
            println!("Skipped {skipped} candidate(s) that changed during the sweep");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::InitCommand;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn reaps_abandoned_lease_with_configured_age() {
        let temp = TempDir::new().unwrap();
        let config = SdbLockConfig::default().with_home(temp.path());
        InitCommand::new(&config).unwrap().execute().unwrap();

        let client = open_client(&config).unwrap();
        let abandoned = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        client.try_lock_at("stuck", &[], abandoned).unwrap();
        assert!(client.try_lock("busy", &[]).unwrap());

        ReapCommand::new(&config).unwrap().execute(None, true).unwrap();

        assert_eq!(client.lease_value("stuck").unwrap(), None);
        assert!(client.lease_value("busy").unwrap().is_some());
    }
}
