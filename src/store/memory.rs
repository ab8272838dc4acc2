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

use crate::error::{Result, SdbLockError};
use crate::store::{
    Attribute, AttributeStore, Attributes, Condition, QueryPredicate, WriteOutcome, apply_delete,
    apply_put, apply_query, validate_domain_name,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Domains = BTreeMap<String, BTreeMap<String, Attributes>>;

/// In-process store. Every operation, including `query`, is strongly
/// consistent.
#[derive(Debug, Default)]
pub struct MemoryStore {
    domains: Mutex<Domains>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `domain` already provisioned.
    pub fn with_domain(domain: &str) -> Result<Self> {
        let store = Self::new();
        store.create_domain(domain)?;
        Ok(store)
    }

    fn lock_domains(&self, domain: &str) -> Result<MutexGuard<'_, Domains>> {
        self.domains.lock().map_err(|_| SdbLockError::Store {
            domain: domain.to_string(),
            details: "memory store mutex poisoned".to_string(),
        })
    }
}

fn items_mut<'a>(
    domains: &'a mut Domains,
    domain: &str,
) -> Result<&'a mut BTreeMap<String, Attributes>> {
    domains
        .get_mut(domain)
        .ok_or_else(|| SdbLockError::DomainNotFound(domain.to_string()))
}

impl AttributeStore for MemoryStore {
    fn create_domain(&self, domain: &str) -> Result<()> {
        validate_domain_name(domain)?;
        let mut domains = self.lock_domains(domain)?;
        domains.entry(domain.to_string()).or_default();
        Ok(())
    }

    fn get(&self, domain: &str, item: &str) -> Result<Attributes> {
        let mut domains = self.lock_domains(domain)?;
        let items = items_mut(&mut domains, domain)?;
        Ok(items.get(item).cloned().unwrap_or_default())
    }

    fn put(
        &self,
        domain: &str,
        item: &str,
        attributes: &[Attribute],
        condition: &Condition,
    ) -> Result<WriteOutcome> {
        let mut domains = self.lock_domains(domain)?;
        let items = items_mut(&mut domains, domain)?;
        Ok(apply_put(items, item, attributes, condition))
    }

    fn delete(
        &self,
        domain: &str,
        item: &str,
        names: &[String],
        condition: &Condition,
    ) -> Result<WriteOutcome> {
        let mut domains = self.lock_domains(domain)?;
        let items = items_mut(&mut domains, domain)?;
        Ok(apply_delete(items, item, names, condition))
    }

    fn query(&self, domain: &str, predicate: &QueryPredicate) -> Result<Vec<String>> {
        let mut domains = self.lock_domains(domain)?;
        let items = items_mut(&mut domains, domain)?;
        Ok(apply_query(items, predicate))
    }
}
