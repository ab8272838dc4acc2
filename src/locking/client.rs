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

use crate::config::SdbLockConfig;
use crate::error::{Result, SdbLockError};
use crate::locking::backoff::PollingBackoff;
use crate::locking::guard::{LeaseGuard, ReleaseMode};
use crate::locking::reaper::LeaseReaper;
use crate::locking::time_format;
use crate::store::{Attribute, AttributeStore, Condition, QueryPredicate, validate_domain_name};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Attribute whose presence on an item is the lock.
pub const LOCK_TIME: &str = "lock_time";

/// Named distributed lock backed by a conditional-write attribute store.
///
/// The client keeps no lease state between calls; every decision is made by
/// the store's conditional put and delete. Clones share the same store.
#[derive(Clone)]
pub struct LockClient {
    store: Arc<dyn AttributeStore>,
    domain: String,
    backoff: PollingBackoff,
}

impl fmt::Debug for LockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockClient")
            .field("domain", &self.domain)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl LockClient {
    pub fn new(store: Arc<dyn AttributeStore>, domain: impl Into<String>) -> Result<Self> {
        let domain = domain.into();
        validate_domain_name(&domain)?;
        Ok(Self {
            store,
            domain,
            backoff: PollingBackoff::default(),
        })
    }

    /// Builds a client from configuration, provisioning the domain first
    /// when `create_domain` is set.
    pub fn from_config(store: Arc<dyn AttributeStore>, config: &SdbLockConfig) -> Result<Self> {
        let client = Self::new(store, config.domain.clone())?.with_backoff(config.locking.backoff());
        if config.create_domain {
            client.create_domain()?;
        }
        Ok(client)
    }

    pub fn with_backoff(mut self, backoff: PollingBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn backoff(&self) -> &PollingBackoff {
        &self.backoff
    }

    pub fn create_domain(&self) -> Result<()> {
        self.store.create_domain(&self.domain)
    }

    /// Attempts to take the lease once. Returns `false` when another holder
    /// has it.
    pub fn try_lock(&self, resource: &str, extra: &[Attribute]) -> Result<bool> {
        Ok(self.try_lock_at(resource, extra, Utc::now())?.is_some())
    }

    /// Runs `work` while holding the lease, if it can be taken immediately.
    ///
    /// `unlock` runs once after `work` returns, and also when `work` panics.
    /// Returns `None` without running `work` when the lease is held elsewhere.
    pub fn try_lock_with<T, F>(&self, resource: &str, extra: &[Attribute], work: F) -> Result<Option<T>>
    where
        F: FnOnce() -> T,
    {
        let Some(lease) = self.try_lock_at(resource, extra, Utc::now())? else {
            return Ok(None);
        };
        let guard = LeaseGuard::new(self, resource, lease, ReleaseMode::Unconditional);
        let output = work();
        guard.release()?;
        Ok(Some(output))
    }

    /// Blocks until the lease is taken, backing off between attempts.
    ///
    /// There is no limit on attempts or total wait. Store errors end the loop
    /// immediately; only contention is retried.
    pub fn lock(&self, resource: &str, extra: &[Attribute]) -> Result<()> {
        self.lock_blocking(resource, extra).map(|_| ())
    }

    /// Blocking form of [`LockClient::try_lock_with`].
    pub fn lock_with<T, F>(&self, resource: &str, extra: &[Attribute], work: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let lease = self.lock_blocking(resource, extra)?;
        let guard = LeaseGuard::new(self, resource, lease, ReleaseMode::Unconditional);
        let output = work();
        guard.release()?;
        Ok(output)
    }

    /// Non-blocking acquisition returning a guard that releases its own
    /// lease when dropped.
    pub fn try_acquire(&self, resource: &str, extra: &[Attribute]) -> Result<Option<LeaseGuard<'_>>> {
        Ok(self
            .try_lock_at(resource, extra, Utc::now())?
            .map(|lease| LeaseGuard::new(self, resource, lease, ReleaseMode::OwnLease)))
    }

    /// Blocking acquisition returning a guard that releases its own lease
    /// when dropped.
    pub fn acquire(&self, resource: &str, extra: &[Attribute]) -> Result<LeaseGuard<'_>> {
        let lease = self.lock_blocking(resource, extra)?;
        Ok(LeaseGuard::new(self, resource, lease, ReleaseMode::OwnLease))
    }

    /// Removes the lease and any attributes stored with it, whoever holds it.
    ///
    /// This does not check ownership: a caller whose lease was reaped and
    /// re-acquired elsewhere will delete the new holder's lease. Use
    /// [`LockClient::unlock_if`] or a [`LeaseGuard`] when that matters.
    pub fn unlock(&self, resource: &str) -> Result<bool> {
        validate_resource(resource)?;
        let outcome = self
            .store
            .delete(&self.domain, resource, &[], &Condition::Always)?;
        debug!("Unlocked '{resource}' ({outcome:?})");
        Ok(outcome.is_applied())
    }

    /// Removes the lease only if it still holds `expected`.
    pub fn unlock_if(&self, resource: &str, expected: &str) -> Result<bool> {
        validate_resource(resource)?;
        let condition = Condition::equals(LOCK_TIME, expected);
        let outcome = self.store.delete(&self.domain, resource, &[], &condition)?;
        debug!("Conditional unlock of '{resource}' at {expected}: {outcome:?}");
        Ok(outcome.is_applied())
    }

    /// Time the current lease on `resource` was taken, if any.
    pub fn locked_time(&self, resource: &str) -> Result<Option<DateTime<Utc>>> {
        self.lease_value(resource)?
            .map(|value| time_format::decode(resource, &value))
            .transpose()
    }

    /// Raw encoded lease value, read with a consistent point read.
    pub fn lease_value(&self, resource: &str) -> Result<Option<String>> {
        validate_resource(resource)?;
        let mut attributes = self.store.get(&self.domain, resource)?;
        Ok(attributes
            .remove(LOCK_TIME)
            .and_then(|values| values.into_iter().next()))
    }

    /// Resources currently locked, or locked for longer than `age`.
    ///
    /// Backed by the store's query path, which may lag recent writes.
    pub fn locked_resources(&self, age: Option<Duration>) -> Result<Vec<String>> {
        self.locked_resources_at(age, Utc::now())
    }

    pub(crate) fn locked_resources_at(
        &self,
        age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        match age {
            Some(age) => self.resources_locked_before(&time_format::threshold(now, age)?),
            None => self
                .store
                .query(&self.domain, &QueryPredicate::not_null(LOCK_TIME)),
        }
    }

    pub(crate) fn resources_locked_before(&self, threshold: &str) -> Result<Vec<String>> {
        self.store
            .query(&self.domain, &QueryPredicate::less_than(LOCK_TIME, threshold))
    }

    /// Releases leases older than `age`, returning the resources actually
    /// unlocked. See [`LeaseReaper`] for the re-check performed per lease.
    pub fn unlock_old(&self, age: Duration) -> Result<Vec<String>> {
        Ok(LeaseReaper::new(self, age).run()?.unlocked)
    }

    /// Writes a lease stamped with `now` if none exists, returning the value
    /// written.
    pub(crate) fn try_lock_at(
        &self,
        resource: &str,
        extra: &[Attribute],
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        validate_resource(resource)?;
        validate_extra_attributes(extra)?;

        let lease = time_format::encode(now)?;
        let mut attributes = Vec::with_capacity(extra.len() + 1);
        attributes.push(Attribute::new(LOCK_TIME, lease.clone()));
        attributes.extend_from_slice(extra);

        let outcome =
            self.store
                .put(&self.domain, resource, &attributes, &Condition::absent(LOCK_TIME))?;
        if outcome.is_applied() {
            debug!("Locked '{resource}' in domain '{}' at {lease}", self.domain);
            Ok(Some(lease))
        } else {
            trace!("'{resource}' is already locked");
            Ok(None)
        }
    }

    /// Waits until the lease is taken, returning the value written.
    pub(crate) fn lock_blocking(&self, resource: &str, extra: &[Attribute]) -> Result<String> {
        let mut backoff = self.backoff.clone();
        backoff.reset();
        let started = Instant::now();
        let mut attempts: usize = 0;

        loop {
            attempts = attempts.saturating_add(1);
            if let Some(lease) = self.try_lock_at(resource, extra, Utc::now())? {
                if attempts > 1 {
                    debug!(
                        "Acquired '{resource}' after {attempts} attempts in {:.3}s",
                        started.elapsed().as_secs_f64()
                    );
                }
                return Ok(lease);
            }

            let delay = backoff.next_delay();
            debug!(
                "'{resource}' is locked; retrying in {:.3}s (attempt {attempts})",
                delay.as_secs_f64()
            );
            thread::sleep(delay);
        }
    }
}

fn validate_resource(resource: &str) -> Result<()> {
    if resource.is_empty() {
        return Err(SdbLockError::InvalidResourceName(resource.to_string()));
    }
    Ok(())
}

fn validate_extra_attributes(extra: &[Attribute]) -> Result<()> {
    for attribute in extra {
        if attribute.name.is_empty() {
            return Err(SdbLockError::InvalidAttribute(
                "attribute names must not be empty".to_string(),
            ));
        }
        if attribute.name == LOCK_TIME {
            return Err(SdbLockError::InvalidAttribute(format!(
                "'{LOCK_TIME}' is reserved for the lease"
            )));
        }
    }
    Ok(())
}
