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
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment, Table};
use log::debug;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub(crate) struct LockedResource {
    resource: String,
    locked_at: String,
    held_secs: i64,
}

pub struct ListCommand {
    client: LockClient,
}

impl ListCommand {
    pub fn new(config: &SdbLockConfig) -> Result<Self> {
        Ok(Self {
            client: open_client(config)?,
        })
    }

    pub fn execute(&self, older_than: Option<Duration>, json: bool) -> Result<()> {
        let entries = self.collect_at(older_than, Utc::now())?;

        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No locked resources in domain '{}'", self.client.domain());
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
        table.set_header(vec![
            Cell::new("Resource"),
            Cell::new("Locked At"),
            Cell::new("Held").set_alignment(CellAlignment::Right),
        ]);
        for entry in &entries {
            table.add_row(vec![
                Cell::new(&entry.resource),
                Cell::new(&entry.locked_at),
                Cell::new(format!("{}s", entry.held_secs)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    /// Lists resources from the query path, then confirms each with a point
    /// read so leases released since the query are left out.
    pub(crate) fn collect_at(
        &self,
        older_than: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LockedResource>> {
        let mut resources = self.client.locked_resources_at(older_than, now)?;
        resources.sort();

        let mut entries = Vec::with_capacity(resources.len());
        for resource in resources {
            let Some(locked_at) = self.client.locked_time(&resource)? else {
                debug!("'{resource}' was released after the query ran");
                continue;
            };
            entries.push(LockedResource {
                held_secs: (now - locked_at).num_seconds().max(0),
                locked_at: locked_at.to_rfc3339(),
                resource,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::InitCommand;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn lists_sorted_and_filtered_by_age() {
        let temp = TempDir::new().unwrap();
        let config = SdbLockConfig::default().with_home(temp.path());
        InitCommand::new(&config).unwrap().execute().unwrap();

        let client = open_client(&config).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        client.try_lock_at("zeta", &[], base).unwrap();
        client
            .try_lock_at("alpha", &[], base + chrono::Duration::seconds(500))
            .unwrap();
        let now = base + chrono::Duration::seconds(600);

        let command = ListCommand::new(&config).unwrap();
        let all = command.collect_at(None, now).unwrap();
        let names: Vec<_> = all.iter().map(|entry| entry.resource.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(all[1].held_secs, 600);

        let old = command
            .collect_at(Some(Duration::from_secs(300)), now)
            .unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].resource, "zeta");
    }
}
