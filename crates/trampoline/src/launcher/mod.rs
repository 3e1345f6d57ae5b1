//! Starting the interpreter and handing its exit code back.

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::{forwarded_command_line, run};

#[cfg(unix)]
mod portable;
#[cfg(unix)]
pub use self::portable::{forwarded_command_line, run};
