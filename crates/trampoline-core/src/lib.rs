//! trampoline-core
//!
//! Everything the launcher does before it starts a process: find the archive
//! appended to the launcher, pull the `#!` line out of it, parse that line and
//! resolve the interpreter it names.
//!
//! The flow is [`archive::TrailerLocator`] → [`shebang::extract`] →
//! [`directive::Directive`] → [`resolve::Resolver`], tied together by
//! [`command::ResolvedCommand::prepare`].

pub mod archive;
pub mod command;
pub mod directive;
pub mod error;
pub mod nls;
pub mod resolve;
pub mod shebang;
pub mod text;

pub use archive::{ScanWindow, Signature, Trailer, TrailerLocator};
pub use command::ResolvedCommand;
pub use directive::{Directive, Executable};
pub use error::{Error, Result};
pub use resolve::{PathSearch, Resolver, SystemPath};
pub use shebang::{Convention, RawDirective, ShebangSource};
