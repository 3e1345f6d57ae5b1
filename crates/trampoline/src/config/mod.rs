pub mod launcher_config;
pub mod logger_config;

pub use launcher_config::LauncherConfig;
