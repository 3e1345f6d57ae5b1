use env_logger::{Env, Target};
use log::LevelFilter;

/// Environment variable holding an `env_logger` filter, e.g. `debug` or `trampoline_core=trace`.
pub const LOG_ENV: &str = "TRAMPOLINE_LOG";

/// Logger configuration used by the launcher.
///
/// The launcher sits between a user and their script, so by default only
/// warnings reach stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { level_filter: LevelFilter::Warn }
    }
}

impl LoggerConfig {
    /// Install the global logger. `TRAMPOLINE_LOG` overrides `level_filter`.
    pub fn init(&self) {
        let env = Env::new().filter_or(LOG_ENV, self.level_filter.as_str());
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .target(Target::Stderr)
            .try_init();
    }
}
