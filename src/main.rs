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

use clap::{Parser, Subcommand};
use sdb_lock::commands::acquire::AcquireCommand;
use sdb_lock::commands::init::InitCommand;
use sdb_lock::commands::list::ListCommand;
use sdb_lock::commands::reap::ReapCommand;
use sdb_lock::commands::run::RunCommand;
use sdb_lock::commands::status::StatusCommand;
use sdb_lock::commands::unlock::UnlockCommand;
use sdb_lock::config::new_sdb_lock_config;
use sdb_lock::error::{Result, SdbLockError, format_error_with_color, get_exit_code};
use sdb_lock::logging;
use sdb_lock::store::Attribute;
use std::io::IsTerminal;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sdb-lock")]
#[command(author, version, about = "Distributed locks on a conditional-write attribute store", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Domain holding the lock items (overrides config)
    #[arg(long, global = true, value_name = "DOMAIN")]
    domain: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured domain
    Init,

    /// Take a lease if it is free; exits 75 when it is held elsewhere
    TryLock {
        resource: String,

        /// Extra attribute stored with the lease
        #[arg(short = 'a', long = "attribute", value_name = "NAME=VALUE")]
        attributes: Vec<Attribute>,
    },

    /// Wait until a lease can be taken
    Lock {
        resource: String,

        /// Extra attribute stored with the lease
        #[arg(short = 'a', long = "attribute", value_name = "NAME=VALUE")]
        attributes: Vec<Attribute>,
    },

    /// Release a lease
    #[command(visible_alias = "release")]
    Unlock {
        resource: String,

        /// Only release if the lease still holds this value
        #[arg(long, value_name = "LEASE")]
        expected: Option<String>,
    },

    /// Show when a resource was locked
    Status {
        resource: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List locked resources
    #[command(visible_alias = "ls")]
    List {
        /// Only resources locked longer than this
        #[arg(long, value_name = "SECONDS")]
        older_than: Option<u64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Release leases abandoned by crashed holders
    Reap {
        /// Age in seconds beyond which a lease is considered abandoned
        #[arg(long, value_name = "SECONDS")]
        older_than: Option<u64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run a command while holding a lease
    Run {
        resource: String,

        /// Wait for the lease instead of failing when it is held
        #[arg(short, long)]
        wait: bool,

        /// Extra attribute stored with the lease
        #[arg(short = 'a', long = "attribute", value_name = "NAME=VALUE")]
        attributes: Vec<Attribute>,

        /// Command and arguments to run
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
}

fn exit_with_error(error: &SdbLockError) -> ! {
    let use_color = std::io::stderr().is_terminal();
    eprintln!("{}", format_error_with_color(error, use_color));
    std::process::exit(get_exit_code(error));
}

fn main() {
    let cli = Cli::parse();

    logging::setup_logger(cli.verbose);

    // Load configuration once at startup
    let mut config = match new_sdb_lock_config() {
        Ok(config) => config,
        Err(e) => exit_with_error(&e),
    };
    if let Some(domain) = cli.domain {
        config.domain = domain;
    }

    let result: Result<i32> = (|| {
        match cli.command {
            Commands::Init => InitCommand::new(&config)?.execute()?,
            Commands::TryLock {
                resource,
                attributes,
            } => {
                AcquireCommand::new(&config)?.try_lock(&resource, &attributes)?;
            }
            Commands::Lock {
                resource,
                attributes,
            } => {
                AcquireCommand::new(&config)?.lock(&resource, &attributes)?;
            }
            Commands::Unlock { resource, expected } => {
                UnlockCommand::new(&config)?.execute(&resource, expected.as_deref())?
            }
            Commands::Status { resource, json } => {
                StatusCommand::new(&config)?.execute(&resource, json)?
            }
            Commands::List { older_than, json } => {
                ListCommand::new(&config)?.execute(older_than.map(Duration::from_secs), json)?
            }
            Commands::Reap { older_than, json } => {
                ReapCommand::new(&config)?.execute(older_than.map(Duration::from_secs), json)?
            }
            Commands::Run {
                resource,
                wait,
                attributes,
                command,
            } => {
                return RunCommand::new(&config)?.execute(&resource, wait, &attributes, &command);
            }
        }
        Ok(0)
    })();

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => exit_with_error(&e),
    }
}
