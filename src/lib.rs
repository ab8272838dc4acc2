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

//! Named distributed mutex on top of a conditional-write attribute store.
//!
//! A lease is the `lock_time` attribute on an item named after the resource.
//! It is taken with a put conditioned on the attribute being absent and
//! released by deleting the item. Abandoned leases are reclaimed by the
//! reaper, which only ever deletes the exact value it observed.

pub mod commands;
pub mod config;
pub mod error;
pub mod locking;
pub mod logging;
pub mod paths;
pub mod store;
