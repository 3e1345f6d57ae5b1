use std::path::PathBuf;

/// Every way discovery, parsing or resolution can fail.
///
/// The launcher never recovers from any of these; the message is shown to the
/// user as is, so each variant carries the offending line or path when there
/// is one.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to read from file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to find an appended archive.")]
    ArchiveNotFound,

    #[error(
        "Archive trailer at 0x{eocd_offset:X} points before the start of the file \
         (cd_size=0x{cd_size:X}, cd_offset=0x{cd_offset:X})"
    )]
    TrailerOutOfRange {
        eocd_offset: u64,
        cd_size: u32,
        cd_offset: u32,
    },

    #[error("Failed to find shebang")]
    ShebangNotFound,

    #[error("Expected to find terminator in shebang line")]
    MissingTerminator,

    #[error("Shebang line is not valid UTF-8")]
    InvalidEncoding,

    #[error("Expected to find '#' at start of shebang line: {line}")]
    MissingHash { line: String },

    #[error("Expected to find '!' following '#' in shebang line: {line}")]
    MissingBang { line: String },

    #[error("Expected to find a command ending in '.exe' in shebang line: {line}")]
    MissingExecutable { line: String },

    #[error("Expected terminating double-quote for executable in shebang line: {line}")]
    MissingClosingQuote { line: String },

    #[error("Terminating quote without starting quote for executable in shebang line: {line}")]
    UnexpectedQuote { line: String },

    #[error("Expected whitespace after '/usr/bin/env' in shebang line: {line}")]
    EnvWithoutWhitespace { line: String },

    #[error("Expected an executable name after '/usr/bin/env' in shebang line: {line}")]
    EnvWithoutName { line: String },

    #[error("Unable to find executable '{name}' on the search path")]
    NotOnPath { name: String },

    #[error("Expected to be able to allocate command line memory ({len} bytes)")]
    CommandLineAlloc { len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
