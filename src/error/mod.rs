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

mod context;
mod exit_codes;
mod format;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::{format_error_chain, format_error_with_color};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdbLockError {
    #[error("Invalid resource name: {0}")]
    InvalidResourceName(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Domain '{0}' does not exist")]
    DomainNotFound(String),

    #[error("Lease value '{value}' on '{resource}' is not a valid timestamp")]
    InvalidLeaseValue { resource: String, value: String },

    #[error("Time is outside the encodable lease range: {0}")]
    TimeOutOfRange(String),

    #[error("Resource '{0}' is locked by another holder")]
    ResourceBusy(String),

    #[error("Store error in domain '{domain}': {details}")]
    Store { domain: String, details: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Command '{command}' failed: {details}")]
    CommandFailed { command: String, details: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SdbLockError>;
