use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

use crate::error::{Error, Result};

/// Encoding of the directive line as written by the tools that build launchers.
pub const DIRECTIVE_ENCODING: &Encoding = UTF_8;

/// Decode the raw directive bytes into text.
///
/// This is the only place bytes turn into text; everything after it works on `str`.
/// Malformed input is rejected instead of replaced, since a replaced character
/// in an interpreter path would just fail later with a worse message.
pub fn decode_directive(bytes: &[u8]) -> Result<Cow<'_, str>> {
    DIRECTIVE_ENCODING
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(Error::InvalidEncoding)
}
