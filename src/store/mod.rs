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

//! Attribute store contract consumed by the lock protocol.
//!
//! A store keeps named items inside domains; each item carries a map of
//! attribute names to string values. Writes may carry a single precondition
//! that the store evaluates atomically with the write.

pub mod file;
pub mod memory;

use crate::error::{Result, SdbLockError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Attribute values of one item, keyed by attribute name.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// A single `(name, value)` pair written by `put`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::str::FromStr for Attribute {
    type Err = SdbLockError;

    /// Parses `NAME=VALUE`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(Attribute::new(name.trim(), value))
            }
            _ => Err(SdbLockError::InvalidAttribute(format!(
                "'{s}' is not in NAME=VALUE form"
            ))),
        }
    }
}

/// Precondition attached to a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// No precondition.
    Always,
    /// The named attribute must not exist on the item.
    Absent { name: String },
    /// The named attribute must currently hold exactly this value.
    Equals { name: String, value: String },
}

impl Condition {
    pub fn absent(name: impl Into<String>) -> Self {
        Condition::Absent { name: name.into() }
    }

    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Equals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Evaluates the condition against the current attributes of an item.
    pub fn holds(&self, attributes: Option<&Attributes>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Absent { name } => attributes
                .and_then(|attrs| attrs.get(name))
                .is_none_or(|values| values.is_empty()),
            Condition::Equals { name, value } => attributes
                .and_then(|attrs| attrs.get(name))
                .is_some_and(|values| values.len() == 1 && values[0] == *value),
        }
    }
}

/// Outcome of a conditional write. A failed precondition is an expected
/// result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    ConditionFailed,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

/// Predicate over a single attribute, evaluated by `query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicate {
    /// `attribute is not null`
    NotNull { name: String },
    /// `attribute < 'value'` under plain string ordering.
    LessThan { name: String, value: String },
}

impl QueryPredicate {
    pub fn not_null(name: impl Into<String>) -> Self {
        QueryPredicate::NotNull { name: name.into() }
    }

    pub fn less_than(name: impl Into<String>, value: impl Into<String>) -> Self {
        QueryPredicate::LessThan {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            QueryPredicate::NotNull { name } => attributes
                .get(name)
                .is_some_and(|values| !values.is_empty()),
            QueryPredicate::LessThan { name, value } => attributes
                .get(name)
                .is_some_and(|values| values.iter().any(|v| v.as_str() < value.as_str())),
        }
    }
}

impl fmt::Display for QueryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPredicate::NotNull { name } => write!(f, "`{name}` is not null"),
            QueryPredicate::LessThan { name, value } => write!(f, "`{name}` < '{value}'"),
        }
    }
}

/// Conditional-write attribute store.
///
/// `get` must be consistent with the latest successful write. `query` may
/// lag behind recent writes. Errors other than a failed precondition are
/// returned as `Err` and never retried by callers in this crate.
pub trait AttributeStore: Send + Sync {
    /// Provisions `domain`. Creating an existing domain is a no-op.
    fn create_domain(&self, domain: &str) -> Result<()>;

    /// Reads every attribute of `item`; empty when the item does not exist.
    fn get(&self, domain: &str, item: &str) -> Result<Attributes>;

    /// Replaces the given attributes on `item` if `condition` holds.
    fn put(
        &self,
        domain: &str,
        item: &str,
        attributes: &[Attribute],
        condition: &Condition,
    ) -> Result<WriteOutcome>;

    /// Removes the named attributes from `item` if `condition` holds. An
    /// empty `names` slice removes the whole item.
    fn delete(
        &self,
        domain: &str,
        item: &str,
        names: &[String],
        condition: &Condition,
    ) -> Result<WriteOutcome>;

    /// Lists names of items matching `predicate`.
    fn query(&self, domain: &str, predicate: &QueryPredicate) -> Result<Vec<String>>;
}

/// Checks a domain name against the characters SimpleDB-style stores accept.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let valid_len = (3..=255).contains(&domain.len());
    let valid_chars = domain
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(SdbLockError::InvalidDomainName(domain.to_string()))
    }
}

/// Applies `put` semantics to an in-memory item map.
pub(crate) fn apply_put(
    items: &mut BTreeMap<String, Attributes>,
    item: &str,
    attributes: &[Attribute],
    condition: &Condition,
) -> WriteOutcome {
    if !condition.holds(items.get(item)) {
        return WriteOutcome::ConditionFailed;
    }

    if attributes.is_empty() {
        return WriteOutcome::Applied;
    }

    let entry = items.entry(item.to_string()).or_default();
    let mut written: Vec<&str> = Vec::new();
    for attribute in attributes {
        let values = entry.entry(attribute.name.clone()).or_default();
        if !written.contains(&attribute.name.as_str()) {
            values.clear();
            written.push(attribute.name.as_str());
        }
        if !values.contains(&attribute.value) {
            values.push(attribute.value.clone());
        }
    }
    WriteOutcome::Applied
}

/// Applies `delete` semantics to an in-memory item map.
pub(crate) fn apply_delete(
    items: &mut BTreeMap<String, Attributes>,
    item: &str,
    names: &[String],
    condition: &Condition,
) -> WriteOutcome {
    if !condition.holds(items.get(item)) {
        return WriteOutcome::ConditionFailed;
    }

    if names.is_empty() {
        items.remove(item);
        return WriteOutcome::Applied;
    }

    if let Some(attrs) = items.get_mut(item) {
        for name in names {
            attrs.remove(name);
        }
        if attrs.is_empty() {
            items.remove(item);
        }
    }
    WriteOutcome::Applied
}

/// Evaluates `query` semantics against an in-memory item map.
pub(crate) fn apply_query(
    items: &BTreeMap<String, Attributes>,
    predicate: &QueryPredicate,
) -> Vec<String> {
    items
        .iter()
        .filter(|(_, attrs)| predicate.matches(attrs))
        .map(|(name, _)| name.clone())
        .collect()
}
