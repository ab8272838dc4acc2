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

use crate::error::SdbLockError;
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a SdbLockError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a SdbLockError) -> Self {
        let (suggestion, details) = match error {
            SdbLockError::InvalidResourceName(name) => {
                let suggestion = Some("Resource names must be non-empty strings.".to_string());
                let details = Some(format!("Rejected resource name: '{name}'"));
                (suggestion, details)
            }
            SdbLockError::InvalidAttribute(msg) => {
                let suggestion = Some(
                    "Pass additional attributes as NAME=VALUE (e.g., -a owner=batch-42). The name \
                     'lock_time' is reserved for the lease."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            SdbLockError::InvalidDomainName(name) => {
                let suggestion = Some(
                    "Domain names may contain letters, digits, '_', '-' and '.', and must be 3 to \
                     255 characters long."
                        .to_string(),
                );
                let details = Some(format!("Rejected domain name: '{name}'"));
                (suggestion, details)
            }
            SdbLockError::DomainNotFound(domain) => {
                let enable_cmd = if cfg!(windows) {
                    "set SDB_LOCK_CREATE_DOMAIN=true"
                } else {
                    "export SDB_LOCK_CREATE_DOMAIN=true"
                };
                let suggestion = Some(format!(
                    "Run 'sdb-lock init' to create the domain '{domain}'.\n\nOr create it on \
                     startup: {enable_cmd}"
                ));
                (suggestion, None)
            }
            SdbLockError::InvalidLeaseValue { resource, value } => {
                let suggestion = Some(format!(
                    "The lease on '{resource}' was written by an incompatible client. Remove it \
                     with 'sdb-lock unlock {resource} --expected {value}'."
                ));
                (suggestion, None)
            }
            SdbLockError::ResourceBusy(resource) => {
                let suggestion = Some(format!(
                    "Wait for the current holder to finish, use 'sdb-lock lock {resource}' to \
                     block until it is released, or reclaim stale leases with 'sdb-lock reap'."
                ));
                (suggestion, None)
            }
            SdbLockError::Store { domain, details } => {
                let suggestion = Some(format!(
                    "Check that the store backing domain '{domain}' is reachable and writable."
                ));
                let details = Some(format!("Store failure: {details}"));
                (suggestion, details)
            }
            SdbLockError::ConfigError(msg) | SdbLockError::InvalidConfig(msg) => {
                let suggestion = Some(
                    "Check config.toml in the sdb-lock home directory and any SDB_LOCK_* \
                     environment variables."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            SdbLockError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        if cfg!(unix) {
                            Some("Check permissions of the sdb-lock home directory.".to_string())
                        } else {
                            Some("Run as Administrator or check file permissions.".to_string())
                        }
                    }
                    std::io::ErrorKind::NotFound => Some(
                        "Ensure the file or directory exists and the path is correct.".to_string(),
                    ),
                    _ => None,
                };
                let details = Some(format!("I/O error: {io_err}"));
                (suggestion, details)
            }
            SdbLockError::Json(json_err) => {
                let suggestion = Some(
                    "The domain file is corrupted. Restore it from a backup or remove it and run \
                     'sdb-lock init'."
                        .to_string(),
                );
                let details = Some(format!("JSON error: {json_err}"));
                (suggestion, details)
            }
            _ => (None, None),
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
