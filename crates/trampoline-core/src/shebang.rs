//! Finding the raw `#!` line, either just before the appended archive or at
//! the top of a companion script.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::debug;

use crate::archive::{read_at, Trailer, TrailerLocator};
use crate::error::{Error, Result};
use crate::text::EXE_SUFFIX;

pub const MARKER: &[u8; 2] = b"#!";

/// Companion script suffix for console launchers.
pub const CONSOLE_SCRIPT_SUFFIX: &str = "-script.py";
/// Companion script suffix for GUI launchers.
pub const GUI_SCRIPT_SUFFIX: &str = "-script.pyw";

/// How the appending tool laid out the archive offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    /// The computed archive start is the first byte of the `#!` line.
    LineStart,
    /// The computed archive start is the first byte after the `#!` line.
    LineEnd,
}

/// Bytes starting at the `#!` marker, running to the end of the scan window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDirective {
    pub offset: u64,
    pub bytes: Vec<u8>,
    pub convention: Option<Convention>,
}

/// Find the directive for an archive whose trailer has already been located.
///
/// The line-start convention is checked first, then the window ending at the
/// archive start is scanned backwards for the marker. The line is assumed not
/// to contain the marker anywhere but at its start, and to fit in `window`.
pub fn extract<R: Read + Seek>(reader: &mut R, trailer: &Trailer, window: usize) -> Result<RawDirective> {
    let start = trailer.archive_start()?;

    let head = read_at(reader, start, window)?;
    if head.starts_with(MARKER) {
        debug!("shebang at archive start 0x{:X}", start);
        return Ok(RawDirective { offset: start, bytes: head, convention: Some(Convention::LineStart) });
    }

    let pos = start.saturating_sub(window as u64);
    let mut buffer = read_at(reader, pos, (start - pos) as usize)?;
    let at = buffer
        .windows(MARKER.len())
        .rposition(|w| w == MARKER)
        .ok_or(Error::ShebangNotFound)?;
    buffer.drain(..at);
    let offset = pos + at as u64;
    debug!("shebang at 0x{:X}, before archive start 0x{:X}", offset, start);
    Ok(RawDirective { offset, bytes: buffer, convention: Some(Convention::LineEnd) })
}

/// Open `path` and extract the directive; the file is closed on return.
pub fn extract_from_file(path: &Path, trailer: &Trailer, window: usize) -> Result<RawDirective> {
    let mut file = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    extract(&mut file, trailer, window)
}

/// Read the head of a companion script. The caller validates the marker.
pub fn read_script_head(path: &Path, window: usize) -> Result<RawDirective> {
    let mut file = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    let bytes = read_at(&mut file, 0, window)?;
    Ok(RawDirective { offset: 0, bytes, convention: None })
}

/// The companion script path: the launcher's `.exe` suffix replaced by `suffix`.
pub fn companion_script_path(self_path: &str, suffix: &str) -> String {
    let stem = match self_path.len().checked_sub(EXE_SUFFIX.len()) {
        Some(at) if self_path.get(at..).is_some_and(|tail| tail.eq_ignore_ascii_case(EXE_SUFFIX)) => {
            &self_path[..at]
        }
        _ => self_path,
    };
    format!("{stem}{suffix}")
}

/// Where a launcher finds its directive.
#[derive(Clone, Debug)]
pub enum ShebangSource {
    /// In the archive appended to the launcher itself.
    AppendedArchive(TrailerLocator),
    /// At the top of `<launcher stem><suffix>` next to the launcher.
    CompanionScript { suffix: String, window: usize },
}

/// A directive together with the script the interpreter should be given.
#[derive(Clone, Debug)]
pub struct Located {
    pub raw: RawDirective,
    pub script: String,
}

impl ShebangSource {
    pub fn locate(&self, self_path: &str) -> Result<Located> {
        match self {
            ShebangSource::AppendedArchive(locator) => {
                let path = Path::new(self_path);
                let trailer = locator.locate_in_file(path)?;
                let raw = extract_from_file(path, &trailer, locator.window().small)?;
                Ok(Located { raw, script: self_path.to_string() })
            }
            ShebangSource::CompanionScript { suffix, window } => {
                let script = companion_script_path(self_path, suffix);
                let raw = read_script_head(Path::new(&script), *window)?;
                Ok(Located { raw, script })
            }
        }
    }
}
