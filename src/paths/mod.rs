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

pub mod home;
pub mod shared;

pub use home::{
    CONFIG_FILE_NAME, DOMAINS_DIR, HOME_ENV_VAR, config_file, domain_document_path,
    domain_lock_path, domains_dir, ensure_domains_dir, resolve_home,
};
pub use shared::ensure_directory;
