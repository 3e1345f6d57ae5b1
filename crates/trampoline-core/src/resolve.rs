//! Turning an [`Executable`] reference into a concrete path.

use std::env;
use std::ffi::OsString;
use std::path::{PathBuf, MAIN_SEPARATOR};

use log::{debug, trace};

use crate::directive::Executable;
use crate::error::{Error, Result};

/// Used when `PATHEXT` is not set.
pub const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

/// Something that can find a file name on an executable search path.
pub trait PathSearch {
    fn search(&self, file_name: &str) -> Option<PathBuf>;
}

/// The process's own `PATH`, relative entries resolved against the current directory.
#[derive(Clone, Debug)]
pub struct SystemPath {
    paths: Option<OsString>,
    cwd: PathBuf,
}

impl SystemPath {
    pub fn new(paths: Option<OsString>, cwd: PathBuf) -> Self {
        Self { paths, cwd }
    }

    pub fn from_env() -> Self {
        Self::new(env::var_os("PATH"), env::current_dir().unwrap_or_default())
    }
}

impl PathSearch for SystemPath {
    fn search(&self, file_name: &str) -> Option<PathBuf> {
        which::which_in(file_name, self.paths.as_ref(), &self.cwd).ok()
    }
}

/// Split a `PATHEXT` style list into lower-cased extensions, in order.
pub fn parse_pathext(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Locates bare interpreter names using the registered executable extensions.
#[derive(Clone, Debug)]
pub struct Resolver<S> {
    search: S,
    extensions: Vec<String>,
}

impl Resolver<SystemPath> {
    pub fn from_env() -> Self {
        let pathext = env::var("PATHEXT").ok();
        Self::new(SystemPath::from_env(), pathext.as_deref())
    }
}

impl<S: PathSearch> Resolver<S> {
    pub fn new(search: S, pathext: Option<&str>) -> Self {
        Self { search, extensions: parse_pathext(pathext.unwrap_or(DEFAULT_PATHEXT)) }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Find `name` on the search path.
    ///
    /// A name that already has an extension is searched as is. Otherwise each
    /// registered extension is tried in order and the first hit wins.
    pub fn find_on_path(&self, name: &str) -> Result<String> {
        let found = if name.contains('.') {
            self.search.search(name)
        } else {
            self.extensions.iter().find_map(|ext| {
                let candidate = format!("{name}{ext}");
                trace!("searching for {}", candidate);
                self.search.search(&candidate)
            })
        };
        let path = found.ok_or_else(|| Error::NotOnPath { name: name.to_string() })?;
        debug!("resolved {} to {}", name, path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    /// Concrete path for `executable`, given the launcher's own path.
    pub fn resolve(&self, executable: &Executable, self_path: &str) -> Result<String> {
        match executable {
            Executable::Path(path) => Ok(path.clone()),
            Executable::LauncherRelative(relative) => Ok(join_canonical(launcher_dir(self_path), relative)),
            Executable::Search(name) => self.find_on_path(name),
        }
    }
}

#[inline]
fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Directory part of `path`. A root directory keeps its trailing separator.
pub fn launcher_dir(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(at) => {
            let dir = &path[..at];
            if dir.is_empty() || dir.ends_with(':') {
                &path[..=at]
            } else {
                dir
            }
        }
        None => ".",
    }
}

/// Split off the root: an optional drive letter and up to two leading separators.
fn split_root(path: &str, sep: char) -> (String, &str) {
    let (drive, rest) = match path.as_bytes() {
        [d, b':', ..] if d.is_ascii_alphabetic() => path.split_at(2),
        _ => ("", path),
    };
    let trimmed = rest.trim_start_matches(is_separator);
    let mut root = drive.to_string();
    for _ in 0..(rest.len() - trimmed.len()).min(2) {
        root.push(sep);
    }
    (root, trimmed)
}

/// Join `relative` onto `base` and fold away `.` and `..` components.
///
/// Both `\` and `/` separate components; the output uses the first separator
/// found in `base`. `..` never climbs above the root.
pub fn join_canonical(base: &str, relative: &str) -> String {
    let sep = base.chars().find(|c| is_separator(*c)).unwrap_or(MAIN_SEPARATOR);
    let (root, base) = split_root(base, sep);

    let mut parts: Vec<&str> = Vec::new();
    for part in base.split(is_separator).chain(relative.split(is_separator)) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }

    let mut out = root;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakePath(HashMap<String, PathBuf>);

    impl FakePath {
        fn with(mut self, name: &str, path: &str) -> Self {
            self.0.insert(name.to_string(), PathBuf::from(path));
            self
        }
    }

    impl PathSearch for FakePath {
        fn search(&self, file_name: &str) -> Option<PathBuf> {
            self.0.get(file_name).cloned()
        }
    }

    #[test]
    fn pathext_lowercased_in_order() {
        assert_eq!(parse_pathext(".COM;.EXE;;.Bat; "), vec![".com", ".exe", ".bat"]);
    }

    #[test]
    fn bare_name_tries_extensions_in_order() {
        let search = FakePath::default()
            .with("python3.exe", r"C:\Python\python3.exe")
            .with("python3.cmd", r"C:\shims\python3.cmd");
        let resolver = Resolver::new(search, Some(".COM;.EXE;.CMD"));
        assert_eq!(resolver.find_on_path("python3").unwrap(), r"C:\Python\python3.exe");
    }

    #[test]
    fn name_with_extension_searched_directly() {
        let search = FakePath::default().with("python3.exe", r"C:\Python\python3.exe");
        let resolver = Resolver::new(search, Some(".COM"));
        assert_eq!(resolver.find_on_path("python3.exe").unwrap(), r"C:\Python\python3.exe");
    }

    #[test]
    fn nothing_found() {
        let resolver = Resolver::new(FakePath::default(), None);
        assert!(matches!(resolver.find_on_path("python3"), Err(Error::NotOnPath { .. })));
    }

    #[test]
    fn launcher_relative_resolution() {
        let resolver = Resolver::new(FakePath::default(), None);
        let exe = Executable::LauncherRelative(r"\venv\Scripts\python.exe".into());
        assert_eq!(resolver.resolve(&exe, r"C:\tools\run.exe").unwrap(), r"C:\tools\venv\Scripts\python.exe");
    }

    #[test]
    fn dir_of_launcher() {
        assert_eq!(launcher_dir(r"C:\tools\run.exe"), r"C:\tools");
        assert_eq!(launcher_dir(r"C:\run.exe"), r"C:\");
        assert_eq!(launcher_dir("/run"), "/");
        assert_eq!(launcher_dir("run.exe"), ".");
    }

    #[test]
    fn canonical_join() {
        assert_eq!(join_canonical(r"C:\tools", r"..\envs\.\py\python.exe"), r"C:\envs\py\python.exe");
        assert_eq!(join_canonical(r"C:\", r"..\..\python.exe"), r"C:\python.exe");
        assert_eq!(join_canonical("/opt/tools", "venv/bin/python"), "/opt/tools/venv/bin/python");
        assert_eq!(join_canonical(r"\\server\share\tools", r"py\python.exe"), r"\\server\share\tools\py\python.exe");
    }

    #[cfg(unix)]
    #[test]
    fn system_path_lookup() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let exe = dir.path().join("python3.exe");
        std::fs::write(&exe, b"")?;
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))?;

        let search = SystemPath::new(Some(dir.path().as_os_str().to_owned()), dir.path().to_path_buf());
        let resolver = Resolver::new(search, Some(".COM;.EXE"));
        assert_eq!(resolver.find_on_path("python3")?, exe.to_string_lossy());
        Ok(())
    }
}
