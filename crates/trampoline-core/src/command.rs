use log::debug;

use crate::directive::Directive;
use crate::error::{Error, Result};
use crate::resolve::{PathSearch, Resolver};
use crate::shebang::ShebangSource;

/// Everything needed to start the interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub executable: String,
    pub args: String,
    pub script: String,
    /// The launcher's own command line minus its program name, verbatim.
    pub forwarded: String,
}

impl ResolvedCommand {
    /// Run discovery, parsing and resolution for the launcher at `self_path`.
    pub fn prepare<S: PathSearch>(
        source: &ShebangSource,
        self_path: &str,
        forwarded: &str,
        resolver: &Resolver<S>,
    ) -> Result<Self> {
        let located = source.locate(self_path)?;
        let directive = Directive::parse(&located.raw.bytes)?;
        Self::from_directive(&directive, self_path, located.script, forwarded, resolver)
    }

    pub fn from_directive<S: PathSearch>(
        directive: &Directive,
        self_path: &str,
        script: String,
        forwarded: &str,
        resolver: &Resolver<S>,
    ) -> Result<Self> {
        let executable = resolver.resolve(&directive.executable, self_path)?;
        Ok(Self { executable, args: directive.args.clone(), script, forwarded: forwarded.to_string() })
    }

    /// `"<executable>" <args> "<script>" <forwarded>`
    pub fn command_line(&self) -> Result<String> {
        // 3 spaces + 4 quotes + NUL for the native call
        let len = self.executable.len() + self.args.len() + self.script.len() + self.forwarded.len() + 8;
        let mut out = String::new();
        out.try_reserve_exact(len).map_err(|_| Error::CommandLineAlloc { len })?;
        out.push('"');
        out.push_str(&self.executable);
        out.push_str("\" ");
        out.push_str(&self.args);
        out.push_str(" \"");
        out.push_str(&self.script);
        out.push_str("\" ");
        out.push_str(&self.forwarded);
        debug!("command line: {}", out);
        Ok(out)
    }
}
