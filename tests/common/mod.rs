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

#![allow(dead_code)]

mod test_home;

pub use test_home::TestHomeGuard;

use sdb_lock::locking::{LockClient, PollingBackoff};
use sdb_lock::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub const DOMAIN: &str = "test_locks";

/// Client on a fresh in-memory domain with millisecond backoff.
pub fn memory_client() -> LockClient {
    let store = Arc::new(MemoryStore::with_domain(DOMAIN).unwrap());
    LockClient::new(store, DOMAIN)
        .unwrap()
        .with_backoff(fast_backoff())
}

pub fn fast_backoff() -> PollingBackoff {
    PollingBackoff::new(Duration::from_millis(1), 2, Duration::from_millis(8))
}
