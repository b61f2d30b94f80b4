//! Logger setup.

use env_logger::Env;

/// Initializes the global logger. The default level is `info`, raised to
/// `debug` with the verbose flag; an explicit `RUST_LOG` always wins.
/// Repeated calls are ignored.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .try_init();
}
