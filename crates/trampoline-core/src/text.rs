//! Small scanning helpers shared by the directive parser and the launcher.
//!
//! Each helper works on an already validated slice and returns either an index
//! into it or a sub-slice of it, so callers never do raw pointer arithmetic.

/// The executable suffix every direct interpreter reference must carry.
pub const EXE_SUFFIX: &str = ".exe";

/// Whitespace as the C locale defines it, minus vertical tab.
#[inline]
pub fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// Drop leading whitespace.
#[inline]
pub fn skip_whitespace(s: &str) -> &str {
    s.trim_start_matches(is_space)
}

/// Index of the first CR or LF byte, if any.
pub fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == b'\r' || b == b'\n')
}

/// Strip `prefix` from the start of `s`, comparing ASCII case-insensitively.
pub fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Byte index of the `.exe` that ends the executable token.
///
/// Occurrences followed by a filename character (`C:\tools.exe\python.exe`)
/// are stepped over; the scan stops at the first one followed by the end of
/// the line, a double quote or whitespace, which is the last occurrence it
/// examined. Matching is ASCII case-insensitive.
pub fn find_exe_suffix(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let n = EXE_SUFFIX.len();
    let mut from = 0;
    while from + n <= bytes.len() {
        let pos = bytes[from..]
            .windows(n)
            .position(|w| w.eq_ignore_ascii_case(EXE_SUFFIX.as_bytes()))?
            + from;
        match bytes.get(pos + n) {
            None | Some(b'"') => return Some(pos),
            Some(c) if c.is_ascii_whitespace() => return Some(pos),
            Some(_) => from = pos + n,
        }
    }
    None
}

/// Remove one pair of surrounding double quotes, if both are present.
pub fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// The raw command line with the program name token removed.
///
/// A quoted program name ends at the next double quote, an unquoted one at the
/// next space. Whitespace after it is skipped. When the name is not
/// terminated there are no arguments and the result is empty.
pub fn skip_program_name(cmdline: &str) -> &str {
    let rest = match cmdline.strip_prefix('"') {
        Some(quoted) => quoted.find('"').map(|i| &quoted[i + 1..]),
        None => cmdline.find(' ').map(|i| &cmdline[i + 1..]),
    };
    rest.map(skip_whitespace).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_is_first_cr_or_lf() {
        assert_eq!(find_terminator(b"#!a.exe\r\n"), Some(7));
        assert_eq!(find_terminator(b"#!a.exe\nx\r"), Some(7));
        assert_eq!(find_terminator(b"#!a.exe"), None);
    }

    #[test]
    fn exe_suffix_skips_path_components() {
        let line = r"C:\tools.exe\bin\python.exe -u";
        let pos = find_exe_suffix(line).unwrap();
        assert_eq!(&line[..pos + 4], r"C:\tools.exe\bin\python.exe");
    }

    #[test]
    fn exe_suffix_case_insensitive_and_quoted() {
        assert_eq!(find_exe_suffix(r#""C:\Py\PYTHON.EXE" -O"#), Some(13));
        assert_eq!(find_exe_suffix("python.Exe"), Some(6));
        assert_eq!(find_exe_suffix("python.exes"), None);
        assert_eq!(find_exe_suffix("python"), None);
    }

    #[test]
    fn prefix_ignore_case() {
        assert_eq!(strip_prefix_ignore_case("/USR/bin/env python", "/usr/bin/env"), Some(" python"));
        assert_eq!(strip_prefix_ignore_case("/usr", "/usr/bin/env"), None);
    }

    #[test]
    fn program_name_removed() {
        assert_eq!(skip_program_name(r#""C:\a b\run.exe"  foo "bar baz""#), r#"foo "bar baz""#);
        assert_eq!(skip_program_name("run.exe -x -y"), "-x -y");
        assert_eq!(skip_program_name("run.exe"), "");
        assert_eq!(skip_program_name(r#""C:\unterminated"#), "");
    }

    #[test]
    fn unquote_needs_both_quotes() {
        assert_eq!(unquote(r#""a b""#), "a b");
        assert_eq!(unquote(r#""a b"#), r#""a b"#);
        assert_eq!(unquote("ab"), "ab");
    }
}
