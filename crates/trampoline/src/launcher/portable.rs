use std::env;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use trampoline_core::ResolvedCommand;

/// This process's arguments, minus the program name, joined for display.
pub fn forwarded_command_line() -> String {
    env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

extern "C" fn on_interrupt(_: nix::libc::c_int) {}

/// Keep waiting on SIGINT. The child shares our foreground process group, so
/// the terminal already delivers the interrupt to it. A handler (rather than
/// SIG_IGN) is reset by exec, so the child starts with the default disposition.
fn install_interrupt_relay() -> Result<()> {
    let action = SigAction::new(SigHandler::Handler(on_interrupt), SaFlags::SA_RESTART, SigSet::empty());
    unsafe { sigaction(Signal::SIGINT, &action) }.context("Unable to install the interrupt handler")?;
    Ok(())
}

fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status.code().or_else(|| status.signal().map(|sig| 128 + sig)).unwrap_or(1)
}

/// Start the child, wait for it and return its exit code.
///
/// The directive's argument string is split on whitespace; the launcher's own
/// arguments are passed through unchanged.
pub fn run(command: &ResolvedCommand) -> Result<i32> {
    let cmdline = command.command_line()?;
    install_interrupt_relay()?;

    let mut child = Command::new(&command.executable)
        .args(command.args.split_ascii_whitespace())
        .arg(&command.script)
        .args(env::args_os().skip(1))
        .spawn()
        .with_context(|| format!("Unable to create process using '{}'", cmdline))?;
    debug!("started child process {}", child.id());

    let status = child.wait().context("Failed to get exit code of process")?;
    Ok(exit_code(status))
}
