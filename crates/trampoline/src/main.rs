#![cfg_attr(all(windows, feature = "gui"), windows_subsystem = "windows")]

mod config;
mod launcher;
mod report;

use std::env;
use std::process;

use anyhow::{Context, Result};
use log::debug;
use trampoline_core::text::unquote;
use trampoline_core::{ResolvedCommand, Resolver, Signature};

use crate::config::LauncherConfig;

fn self_path() -> Result<String> {
    let path = env::current_exe().context("Unable to determine the launcher's own path")?;
    let path = path.to_string_lossy();
    Ok(unquote(&path).to_string())
}

fn run(config: &LauncherConfig, signature: Signature) -> Result<i32> {
    let self_path = self_path()?;
    let forwarded = launcher::forwarded_command_line();
    debug!("launcher {} forwarding {:?}", self_path, forwarded);

    let source = config.source(signature);
    let resolver = Resolver::from_env();
    let command = ResolvedCommand::prepare(&source, &self_path, &forwarded, &resolver)?;
    launcher::run(&command)
}

fn main() {
    // Must happen before any scan of our own image.
    let signature = Signature::activate();

    let config = LauncherConfig::from_env();
    config.logger_config.init();

    match run(&config, signature) {
        Ok(code) => process::exit(code),
        Err(err) => report::fatal(&err, config.gui),
    }
}
