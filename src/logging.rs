use env_logger::{Builder, Env};

/// Default `env_logger` filter for a `-v` count. `RUST_LOG` takes precedence.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "sdb_lock=warn",
        1 => "sdb_lock=info",
        2 => "sdb_lock=debug",
        _ => "sdb_lock=trace",
    }
}

/// Initialize the logger with the specified verbosity level
///
/// # Arguments
/// * `verbose` - Verbosity level (0=warn, 1=info, 2=debug, 3+=trace)
pub fn setup_logger(verbose: u8) {
    let env = Env::default().default_filter_or(default_filter(verbose));

    // A second initialization (embedding, tests) keeps the first logger.
    let _ = Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .try_init();
}
