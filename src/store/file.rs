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

//! Attribute store persisted as one JSON document per domain.
//!
//! Every operation holds an advisory lock on a sibling `<domain>.lock` file
//! for its whole read-modify-write cycle, so conditional writes are atomic
//! across processes sharing the directory. Documents are replaced through a
//! temp file and rename, never rewritten in place.

use crate::error::{Result, SdbLockError};
use crate::paths;
use crate::store::{
    Attribute, AttributeStore, Attributes, Condition, QueryPredicate, WriteOutcome, apply_delete,
    apply_put, apply_query, validate_domain_name,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DomainDocument {
    version: u32,
    #[serde(default)]
    items: BTreeMap<String, Attributes>,
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Shared,
    Exclusive,
}

/// File-backed store rooted at a directory holding domain documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs `op` with the domain's advisory lock held.
    fn with_domain_lock<T>(
        &self,
        domain: &str,
        access: Access,
        op: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T> {
        validate_domain_name(domain)?;
        let document_path = paths::domain_document_path(&self.root, domain);
        let lock_path = paths::domain_lock_path(&self.root, domain);

        fs::create_dir_all(&self.root).map_err(|err| SdbLockError::Store {
            domain: domain.to_string(),
            details: format!(
                "Failed to ensure store directory {} exists: {err}",
                self.root.display()
            ),
        })?;

        let lock_file = open_lock_file(&lock_path).map_err(|err| SdbLockError::Store {
            domain: domain.to_string(),
            details: format!("Failed to open lock file {}: {err}", lock_path.display()),
        })?;

        let locked = match access {
            Access::Shared => lock_file.lock_shared(),
            Access::Exclusive => lock_file.lock(),
        };
        locked.map_err(|err| SdbLockError::Store {
            domain: domain.to_string(),
            details: format!("Failed to lock {}: {err}", lock_path.display()),
        })?;
        trace!("Holding {access:?} lock on {}", lock_path.display());

        let result = op(&document_path);

        if let Err(err) = lock_file.unlock() {
            debug!("Failed to unlock {}: {err}", lock_path.display());
        }
        result
    }

    fn read_document(domain: &str, path: &Path) -> Result<DomainDocument> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SdbLockError::DomainNotFound(domain.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let document: DomainDocument = serde_json::from_reader(BufReader::new(file))?;
        if document.version != DOCUMENT_VERSION {
            return Err(SdbLockError::Store {
                domain: domain.to_string(),
                details: format!(
                    "Unsupported document version {} in {}",
                    document.version,
                    path.display()
                ),
            });
        }
        Ok(document)
    }

    fn write_document(path: &Path, document: &DomainDocument) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut staging = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut staging, document)?;
        staging.write_all(b"\n")?;
        staging.as_file().sync_all()?;
        staging.persist(path).map_err(|err| err.error)?;
        Ok(())
    }

    fn mutate(
        &self,
        domain: &str,
        op: impl FnOnce(&mut BTreeMap<String, Attributes>) -> WriteOutcome,
    ) -> Result<WriteOutcome> {
        self.with_domain_lock(domain, Access::Exclusive, |path| {
            let mut document = Self::read_document(domain, path)?;
            let outcome = op(&mut document.items);
            if outcome.is_applied() {
                Self::write_document(path, &document)?;
            }
            Ok(outcome)
        })
    }
}

/// Opens the domain's lock file. A file created here is private to its
/// owner; an existing file keeps whatever mode its creator gave it.
fn open_lock_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

impl AttributeStore for FileStore {
    fn create_domain(&self, domain: &str) -> Result<()> {
        self.with_domain_lock(domain, Access::Exclusive, |path| {
            if path.exists() {
                debug!("Domain '{domain}' already exists at {}", path.display());
                return Ok(());
            }
            let document = DomainDocument {
                version: DOCUMENT_VERSION,
                items: BTreeMap::new(),
            };
            Self::write_document(path, &document)?;
            debug!("Created domain '{domain}' at {}", path.display());
            Ok(())
        })
    }

    fn get(&self, domain: &str, item: &str) -> Result<Attributes> {
        self.with_domain_lock(domain, Access::Shared, |path| {
            let mut document = Self::read_document(domain, path)?;
            Ok(document.items.remove(item).unwrap_or_default())
        })
    }

    fn put(
        &self,
        domain: &str,
        item: &str,
        attributes: &[Attribute],
        condition: &Condition,
    ) -> Result<WriteOutcome> {
        self.mutate(domain, |items| apply_put(items, item, attributes, condition))
    }

    fn delete(
        &self,
        domain: &str,
        item: &str,
        names: &[String],
        condition: &Condition,
    ) -> Result<WriteOutcome> {
        self.mutate(domain, |items| apply_delete(items, item, names, condition))
    }

    fn query(&self, domain: &str, predicate: &QueryPredicate) -> Result<Vec<String>> {
        self.with_domain_lock(domain, Access::Shared, |path| {
            let document = Self::read_document(domain, path)?;
            Ok(apply_query(&document.items, predicate))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn store_with_domain(domain: &str) -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("domains"));
        store.create_domain(domain).unwrap();
        (temp, store)
    }

    #[test]
    fn missing_domain_is_reported() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let err = store.get("locks", "abc").unwrap_err();
        assert!(matches!(err, SdbLockError::DomainNotFound(d) if d == "locks"));
    }

    #[test]
    fn invalid_domain_never_touches_disk() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("domains"));
        let err = store.create_domain("../escape").unwrap_err();
        assert!(matches!(err, SdbLockError::InvalidDomainName(_)));
        assert!(!temp.path().join("domains").exists());
    }

    #[test]
    fn writes_survive_reopen() {
        let (temp, store) = store_with_domain("locks");
        let attrs = [
            Attribute::new("lock_time", "000000000123"),
            Attribute::new("owner", "worker-1"),
        ];
        let outcome = store
            .put("locks", "abc", &attrs, &Condition::absent("lock_time"))
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied);

        let reopened = FileStore::new(temp.path().join("domains"));
        let item = reopened.get("locks", "abc").unwrap();
        assert_eq!(item["lock_time"], vec!["000000000123"]);
        assert_eq!(item["owner"], vec!["worker-1"]);
    }

    #[test]
    fn failed_condition_leaves_document_untouched() {
        let (_temp, store) = store_with_domain("locks");
        store
            .put("locks", "abc", &[Attribute::new("lock_time", "1")], &Condition::Always)
            .unwrap();
        let outcome = store
            .delete(
                "locks",
                "abc",
                &[],
                &Condition::equals("lock_time", "2"),
            )
            .unwrap();
        assert_eq!(outcome, WriteOutcome::ConditionFailed);
        assert_eq!(store.get("locks", "abc").unwrap()["lock_time"], vec!["1"]);
    }

    #[test]
    fn corrupted_document_is_an_error() {
        let (temp, store) = store_with_domain("locks");
        fs::write(temp.path().join("domains").join("locks.json"), b"{not json").unwrap();
        let err = store.get("locks", "abc").unwrap_err();
        assert!(matches!(err, SdbLockError::Json(_)));
    }

    #[test]
    fn concurrent_conditional_puts_have_one_winner() {
        let (_temp, store) = store_with_domain("locks");
        let store = Arc::new(store);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|idx| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Separate handles mimic separate processes sharing the directory.
                    let store = FileStore::new(store.root().to_path_buf());
                    barrier.wait();
                    store
                        .put(
                            "locks",
                            "abc",
                            &[Attribute::new("lock_time", format!("{idx:012}"))],
                            &Condition::absent("lock_time"),
                        )
                        .unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|outcome| outcome.is_applied())
            .count();
        assert_eq!(winners, 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_lock_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, _store) = store_with_domain("locks");
        let lock_path = temp.path().join("domains").join("locks.lock");
        let mode = fs::metadata(&lock_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777 & !0o600, 0);
    }

    #[cfg(unix)]
    #[test]
    fn existing_lock_file_mode_is_left_alone() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, store) = store_with_domain("locks");
        let lock_path = temp.path().join("domains").join("locks.lock");
        fs::set_permissions(&lock_path, fs::Permissions::from_mode(0o644)).unwrap();

        store
            .put("locks", "abc", &[Attribute::new("lock_time", "1")], &Condition::Always)
            .unwrap();
        assert_eq!(store.get("locks", "abc").unwrap()["lock_time"], vec!["1"]);

        let mode = fs::metadata(&lock_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
