//! Parsing the `#!` line into an interpreter reference and its arguments.

use log::debug;

use crate::error::{Error, Result};
use crate::nls::decode_directive;
use crate::text::{find_exe_suffix, find_terminator, is_space, skip_whitespace, strip_prefix_ignore_case, unquote, EXE_SUFFIX};

/// Interpreter looked up on the executable search path.
pub const ENV_TOKEN: &str = "/usr/bin/env";

/// Placeholder for the directory holding the launcher.
pub const LAUNCHER_DIR: &str = "<launcher_dir>";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Executable {
    /// Used as written.
    Path(String),
    /// Relative to the launcher's own directory.
    LauncherRelative(String),
    /// Bare name for the search path.
    Search(String),
}

/// A parsed shebang line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub executable: Executable,
    /// Everything after the executable, kept verbatim. May be empty.
    pub args: String,
    /// The whole line without its terminator, for diagnostics.
    pub line: String,
}

impl Directive {
    /// Parse raw bytes that start at the marker and contain the line terminator.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let end = find_terminator(raw).ok_or(Error::MissingTerminator)?;
        let line = decode_directive(&raw[..end])?;
        Self::parse_line(&line)
    }

    /// Parse one decoded line, without its terminator.
    pub fn parse_line(line: &str) -> Result<Self> {
        let rest = skip_whitespace(line);
        let rest = rest.strip_prefix('#').ok_or_else(|| Error::MissingHash { line: line.to_string() })?;
        let rest = skip_whitespace(rest);
        let rest = rest.strip_prefix('!').ok_or_else(|| Error::MissingBang { line: line.to_string() })?;
        let rest = skip_whitespace(rest);

        let (executable, args) = if let Some(after) = strip_prefix_ignore_case(rest, ENV_TOKEN) {
            let (name, args) = split_search_name(after, line)?;
            (Executable::Search(name.to_string()), args)
        } else if let Some(after) = rest.strip_prefix(LAUNCHER_DIR) {
            let (exe, args) = split_executable(after, line)?;
            (Executable::LauncherRelative(exe.to_string()), args)
        } else {
            let (exe, args) = split_executable(rest, line)?;
            match exe.strip_prefix(LAUNCHER_DIR) {
                Some(relative) => (Executable::LauncherRelative(unquote(relative).to_string()), args),
                None => (Executable::Path(exe.to_string()), args),
            }
        };

        debug!("shebang executable {:?}, args {:?}", executable, args);
        Ok(Self { executable, args: args.to_string(), line: line.to_string() })
    }
}

/// Split `"<path>.exe" args` or `<path>.exe args` into the unquoted path and the args.
fn split_executable<'a>(s: &'a str, line: &str) -> Result<(&'a str, &'a str)> {
    let at = find_exe_suffix(s).ok_or_else(|| Error::MissingExecutable { line: line.to_string() })?;
    let end = at + EXE_SUFFIX.len();
    let (exe, after) = match s.strip_prefix('"') {
        Some(quoted) => {
            let after = s[end..]
                .strip_prefix('"')
                .ok_or_else(|| Error::MissingClosingQuote { line: line.to_string() })?;
            (&quoted[..end - 1], after)
        }
        None => (&s[..end], &s[end..]),
    };
    if after.starts_with('"') {
        return Err(Error::UnexpectedQuote { line: line.to_string() });
    }
    Ok((exe, skip_whitespace(after)))
}

/// Split the text after the env token into the bare name and the args.
fn split_search_name<'a>(s: &'a str, line: &str) -> Result<(&'a str, &'a str)> {
    if !s.starts_with(is_space) {
        return Err(Error::EnvWithoutWhitespace { line: line.to_string() });
    }
    let s = skip_whitespace(s);
    let end = s.find(is_space).unwrap_or(s.len());
    if end == 0 {
        return Err(Error::EnvWithoutName { line: line.to_string() });
    }
    Ok((&s[..end], skip_whitespace(&s[end..])))
}
