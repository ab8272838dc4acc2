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

//! Fixed-width encoding of lease timestamps.
//!
//! Stores compare attribute values as strings, so lease times are written as
//! 12-digit zero-padded Unix epoch seconds. Twelve digits cover every second
//! up to the end of year 9999.

use crate::error::{Result, SdbLockError};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Number of digits in an encoded lease value.
pub const ENCODED_WIDTH: usize = 12;

const MAX_ENCODABLE_SECS: i64 = 999_999_999_999;

/// Encodes `time` as a sortable lease value.
pub fn encode(time: DateTime<Utc>) -> Result<String> {
    let secs = time.timestamp();
    if !(0..=MAX_ENCODABLE_SECS).contains(&secs) {
        return Err(SdbLockError::TimeOutOfRange(time.to_rfc3339()));
    }
    Ok(format!("{secs:0width$}", width = ENCODED_WIDTH))
}

/// Decodes a lease value for display. Never compare decoded values; compare
/// the encoded strings instead.
pub fn decode(resource: &str, value: &str) -> Result<DateTime<Utc>> {
    let invalid = || SdbLockError::InvalidLeaseValue {
        resource: resource.to_string(),
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let secs = value.parse::<i64>().map_err(|_| invalid())?;
    DateTime::from_timestamp(secs, 0).ok_or_else(invalid)
}

/// Encoded cut-off for leases older than `age` at `now`.
///
/// Saturates at the epoch: no lease value sorts below the result for ages
/// reaching past 1970.
pub fn threshold(now: DateTime<Utc>, age: Duration) -> Result<String> {
    let cutoff = chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .filter(|cutoff| cutoff.timestamp() >= 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    encode(cutoff)
}
