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

use std::cmp;
use std::time::Duration;

/// Exponential backoff used by blocking acquisition between failed attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingBackoff {
    initial: Duration,
    factor: u32,
    cap: Duration,
    current: Duration,
}

impl PollingBackoff {
    pub fn new(initial: Duration, factor: u32, cap: Duration) -> Self {
        Self {
            initial,
            factor: cmp::max(factor, 1),
            cap,
            current: cmp::min(initial, cap),
        }
    }

    /// Returns the current delay and advances the backoff sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next = self.current.saturating_mul(self.factor);
        self.current = cmp::min(next, self.cap);
        delay
    }

    pub fn reset(&mut self) {
        self.current = cmp::min(self.initial, self.cap);
    }

    pub fn peek(&self) -> Duration {
        self.current
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }
}

impl Default for PollingBackoff {
    /// Half a second, doubling, never more than two seconds per wait.
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 2, Duration::from_secs(2))
    }
}
