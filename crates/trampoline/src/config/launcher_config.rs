use std::env;

use trampoline_core::archive::{ScanWindow, Signature, TrailerLocator};
use trampoline_core::shebang::{ShebangSource, CONSOLE_SCRIPT_SUFFIX, GUI_SCRIPT_SUFFIX};

use crate::config::logger_config::LoggerConfig;

/// Overrides the default scan window, in bytes.
pub const SCAN_WINDOW_ENV: &str = "TRAMPOLINE_SCAN_WINDOW";

/// Where the launcher reads its shebang from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    AppendedArchive,
    CompanionScript,
}

/// Main configuration of the launcher.
/// Use [`LauncherConfigBuilder`] to build it from code, or [`LauncherConfig::from_env`].
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub(crate) mode: SourceMode,
    /// Fatal errors go to a message box instead of stderr.
    pub(crate) gui: bool,
    pub(crate) window: ScanWindow,
    pub(crate) logger_config: LoggerConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::AppendedArchive,
            gui: false,
            window: ScanWindow::default(),
            logger_config: LoggerConfig::default(),
        }
    }
}

fn parse_usize_env(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.trim().parse::<usize>().ok()).filter(|v| *v > 0)
}

impl LauncherConfig {
    /// Settings from the cargo features, adjusted by the environment.
    pub fn from_env() -> Self {
        let mode = if cfg!(feature = "appended-archive") {
            SourceMode::AppendedArchive
        } else {
            SourceMode::CompanionScript
        };
        let mut builder = LauncherConfigBuilder::new().with_mode(mode).with_gui(cfg!(feature = "gui"));
        if let Some(small) = parse_usize_env(SCAN_WINDOW_ENV) {
            let window = ScanWindow { small, ..ScanWindow::default() };
            builder = builder.with_window(window);
        }
        builder.get()
    }

    pub fn script_suffix(&self) -> &'static str {
        if self.gui {
            GUI_SCRIPT_SUFFIX
        } else {
            CONSOLE_SCRIPT_SUFFIX
        }
    }

    /// The shebang source for this configuration. `signature` must already be activated.
    pub fn source(&self, signature: Signature) -> ShebangSource {
        match self.mode {
            SourceMode::AppendedArchive => ShebangSource::AppendedArchive(TrailerLocator::new(signature, self.window)),
            SourceMode::CompanionScript => ShebangSource::CompanionScript {
                suffix: self.script_suffix().to_string(),
                window: self.window.small,
            },
        }
    }
}

/// `LauncherConfigBuilder` is a convenience builder to create a `LauncherConfig` from code.
pub struct LauncherConfigBuilder {
    config: LauncherConfig,
}

impl LauncherConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_mode(mut self, mode: SourceMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_gui(mut self, gui: bool) -> Self {
        self.config.gui = gui;
        self
    }

    pub fn with_window(mut self, window: ScanWindow) -> Self {
        self.config.window = window;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> LauncherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_suffix_follows_gui_flag() {
        let console = LauncherConfigBuilder::new().with_gui(false).get();
        let gui = LauncherConfigBuilder::new().with_gui(true).get();
        assert_eq!(console.script_suffix(), "-script.py");
        assert_eq!(gui.script_suffix(), "-script.pyw");
    }

    #[test]
    fn source_matches_mode() {
        let window = ScanWindow { small: 512, ..ScanWindow::default() };
        let config = LauncherConfigBuilder::new()
            .with_mode(SourceMode::CompanionScript)
            .with_gui(false)
            .with_window(window)
            .get();
        match config.source(Signature::activate()) {
            ShebangSource::CompanionScript { suffix, window } => {
                assert_eq!(suffix, "-script.py");
                assert_eq!(window, 512);
            }
            other => panic!("unexpected source: {:?}", other),
        }

        let config = LauncherConfigBuilder::new().with_mode(SourceMode::AppendedArchive).get();
        match config.source(Signature::activate()) {
            ShebangSource::AppendedArchive(locator) => assert_eq!(locator.window(), ScanWindow::default()),
            other => panic!("unexpected source: {:?}", other),
        }
    }
}
