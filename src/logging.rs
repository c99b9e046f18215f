use env_logger::{Builder, Env};
use log::LevelFilter;

/// Installs the global logger. `RUST_LOG` wins over the default level.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    // only fails if a logger is already installed
    let _ = Builder::from_env(env).try_init();
}
