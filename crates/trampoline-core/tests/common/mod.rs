//! Builds launcher images with a small stored ZIP archive appended.

use trampoline_core::Convention;

pub const LAUNCHER_CODE: &[u8] = b"MZ\x90\0\x03\0\0\0 pretend this is a PE image \0\0\0\0";

/// A one-entry stored ZIP. `base` is added to every offset the archive records.
pub fn zip(name: &str, data: &[u8], base: u32, comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();

    // local file header
    out.extend_from_slice(b"PK\x03\x04");
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // flags, method, time, date
    out.extend_from_slice(&0u32.to_le_bytes()); // crc32, unchecked here
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);

    let cd_offset = base + out.len() as u32;
    let cd_start = out.len();
    out.extend_from_slice(b"PK\x01\x02");
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&[0; 12]); // extra, comment, disk, attrs
    out.extend_from_slice(&base.to_le_bytes()); // local header offset
    out.extend_from_slice(name.as_bytes());
    let cd_size = (out.len() - cd_start) as u32;

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

/// Launcher code, then the shebang, then the archive, laid out for `convention`.
pub fn self_image(shebang: &[u8], convention: Convention, entry: &[u8], comment: &[u8]) -> Vec<u8> {
    let base = match convention {
        Convention::LineStart => shebang.len() as u32,
        Convention::LineEnd => 0,
    };
    let mut out = LAUNCHER_CODE.to_vec();
    out.extend_from_slice(shebang);
    out.extend(zip("__main__.py", entry, base, comment));
    out
}
