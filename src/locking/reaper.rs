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

//! Reclaims leases abandoned by crashed holders.
//!
//! Candidates come from the store's query path, which may be stale. Each
//! candidate is re-read with a point read and removed only through a delete
//! conditioned on the value just observed, so a lease taken after the query
//! ran is never touched.

use crate::error::Result;
use crate::locking::client::LockClient;
use crate::locking::time_format;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Summary of a reaping sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReapReport {
    /// Resources the query reported as older than the threshold.
    pub candidates: usize,
    /// Resources whose stale lease was deleted.
    pub unlocked: Vec<String>,
    pub skipped_released: usize,
    pub skipped_fresh: usize,
    /// Conditional deletes that lost to a concurrent release or re-acquire.
    pub lost_races: usize,
    #[serde(skip)]
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct LeaseReaper<'a> {
    client: &'a LockClient,
    age: Duration,
}

impl<'a> LeaseReaper<'a> {
    pub fn new(client: &'a LockClient, age: Duration) -> Self {
        Self { client, age }
    }

    pub fn age(&self) -> Duration {
        self.age
    }

    pub fn run(&self) -> Result<ReapReport> {
        self.run_with_now(Utc::now())
    }

    /// Sweeps with `now` as the reference time. The threshold is computed
    /// once, so every candidate is judged against the same cut-off.
    pub fn run_with_now(&self, now: DateTime<Utc>) -> Result<ReapReport> {
        let start = Instant::now();
        let mut report = ReapReport::default();

        let threshold = time_format::threshold(now, self.age)?;
        let candidates = self.client.resources_locked_before(&threshold)?;
        report.candidates = candidates.len();

        for resource in candidates {
            let Some(observed) = self.client.lease_value(&resource)? else {
                debug!("'{resource}' was released before it could be reaped");
                report.skipped_released += 1;
                continue;
            };

            if observed.as_str() >= threshold.as_str() {
                debug!("'{resource}' was re-acquired at {observed}; leaving it alone");
                report.skipped_fresh += 1;
                continue;
            }

            if self.client.unlock_if(&resource, &observed)? {
                info!("Reclaimed stale lease on '{resource}' taken at {observed}");
                report.unlocked.push(resource);
            } else {
                debug!("Lease on '{resource}' changed before it could be reaped");
                report.lost_races += 1;
            }
        }

        report.duration = start.elapsed();
        debug!(
            "Reaper sweep in domain '{}' unlocked {} of {} candidate(s) in {:.3}s (released: {}, fresh: {}, lost races: {})",
            self.client.domain(),
            report.unlocked.len(),
            report.candidates,
            report.duration.as_secs_f64(),
            report.skipped_released,
            report.skipped_fresh,
            report.lost_races
        );
        Ok(report)
    }
}
