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

mod common;

use assert_cmd::Command;
use common::TestHomeGuard;
use predicates::prelude::*;
use predicates::str::contains;

fn sdb_lock(home: &TestHomeGuard) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sdb-lock"));
    cmd.env("SDB_LOCK_HOME", home.path())
        .env_remove("SDB_LOCK_DOMAIN")
        .env_remove("SDB_LOCK_CREATE_DOMAIN")
        .env_remove("RUST_LOG");
    cmd
}

fn initialized_home() -> TestHomeGuard {
    let home = TestHomeGuard::new();
    sdb_lock(&home).arg("init").assert().success();
    home
}

#[test]
fn test_help_lists_subcommands() {
    let home = TestHomeGuard::new();
    sdb_lock(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("try-lock"))
        .stdout(contains("reap"))
        .stdout(contains("--domain"));
}

#[test]
fn test_init_creates_domain_document() {
    let home = TestHomeGuard::new();
    sdb_lock(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialized domain 'sdb_lock'"));
    assert!(home.domains_dir().join("sdb_lock.json").exists());
}

#[test]
fn test_missing_domain_exit_code() {
    let home = TestHomeGuard::new();
    sdb_lock(&home)
        .args(["try-lock", "abc"])
        .assert()
        .code(3)
        .stderr(contains("does not exist"))
        .stderr(contains("sdb-lock init"));
}

#[test]
fn test_try_lock_then_busy() {
    let home = initialized_home();
    sdb_lock(&home)
        .args(["try-lock", "abc", "-a", "owner=ci"])
        .assert()
        .success()
        .stdout(contains("Locked 'abc'"));

    sdb_lock(&home)
        .args(["try-lock", "abc"])
        .assert()
        .code(75)
        .stderr(contains("locked by another holder"));

    sdb_lock(&home).args(["unlock", "abc"]).assert().success();
    sdb_lock(&home).args(["try-lock", "abc"]).assert().success();
}

#[test]
fn test_malformed_attribute_is_rejected() {
    let home = initialized_home();
    sdb_lock(&home)
        .args(["try-lock", "abc", "-a", "no-equals-sign"])
        .assert()
        .failure()
        .stderr(contains("NAME=VALUE"));
}

#[test]
fn test_status_json() {
    let home = initialized_home();
    sdb_lock(&home)
        .args(["status", "abc", "--json"])
        .assert()
        .success()
        .stdout(contains("\"locked\": false"));

    sdb_lock(&home).args(["lock", "abc"]).assert().success();
    sdb_lock(&home)
        .args(["status", "abc", "--json"])
        .assert()
        .success()
        .stdout(contains("\"locked\": true"))
        .stdout(contains("\"lease\""));
}

#[test]
fn test_list_table_and_empty() {
    let home = initialized_home();
    sdb_lock(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No locked resources"));

    sdb_lock(&home).args(["try-lock", "job-1"]).assert().success();
    sdb_lock(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("Resource").and(contains("job-1")));
}

#[test]
fn test_reap_json_keeps_fresh_leases() {
    let home = initialized_home();
    sdb_lock(&home).args(["try-lock", "fresh"]).assert().success();
    sdb_lock(&home)
        .args(["reap", "--older-than", "3600", "--json"])
        .assert()
        .success()
        .stdout(contains("\"unlocked\": []"));
    sdb_lock(&home)
        .args(["try-lock", "fresh"])
        .assert()
        .code(75);
}

#[test]
fn test_conditional_unlock_mismatch() {
    let home = initialized_home();
    sdb_lock(&home).args(["try-lock", "abc"]).assert().success();
    sdb_lock(&home)
        .args(["unlock", "abc", "--expected", "000000000001"])
        .assert()
        .code(75);
}

#[test]
fn test_domain_flag_and_config_file() {
    let home = TestHomeGuard::new();
    home.write_config("domain = \"from_config\"\ncreate_domain = true\n");

    sdb_lock(&home).args(["try-lock", "abc"]).assert().success();
    assert!(home.domains_dir().join("from_config.json").exists());

    sdb_lock(&home)
        .args(["--domain", "other_domain", "try-lock", "abc"])
        .assert()
        .success();
    assert!(home.domains_dir().join("other_domain.json").exists());
}

#[test]
fn test_invalid_config_exit_code() {
    let home = TestHomeGuard::new();
    home.write_config("[locking]\nbackoff_factor = 0\n");
    sdb_lock(&home)
        .arg("list")
        .assert()
        .code(78)
        .stderr(contains("backoff_factor"));
}

#[cfg(unix)]
#[test]
fn test_run_propagates_child_exit_code() {
    let home = initialized_home();
    sdb_lock(&home)
        .args(["run", "job", "--", "sh", "-c", "exit 4"])
        .assert()
        .code(4);
    // The lease was released after the child exited.
    sdb_lock(&home).args(["try-lock", "job"]).assert().success();
}

#[cfg(unix)]
#[test]
fn test_run_refuses_busy_resource() {
    let home = initialized_home();
    sdb_lock(&home).args(["try-lock", "job"]).assert().success();
    sdb_lock(&home)
        .args(["run", "job", "--", "true"])
        .assert()
        .code(75);
}
