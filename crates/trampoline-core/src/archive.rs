//! Locating the ZIP end-of-central-directory record at the tail of the launcher.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::error::{Error, Result};

/// Default scan window: one path-length unit.
pub const SCAN_WINDOW: usize = 260;

/// Fallback scan window. The archive comment can be up to 64K, which can push
/// the record well past the default window.
pub const LARGE_SCAN_WINDOW: usize = 65 * 1024 * 1024;

/// Size of the fixed part of the record, comment length included.
pub const EOCD_LEN: usize = 22;

/// The end-of-central-directory signature.
///
/// Only [`Signature::TEMPLATE`] exists at compile time, and its first byte is
/// zero. The real value is produced by [`Signature::activate`] at startup, so a
/// launcher binary without an archive never matches its own scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature([u8; 4]);

impl Signature {
    pub const TEMPLATE: Signature = Signature([0x00, 0x4B, 0x05, 0x06]);

    /// Fill in the first byte of the template.
    pub fn activate() -> Self {
        let mut bytes = Self::TEMPLATE.0;
        bytes[0] = std::hint::black_box(0x50);
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// Small and large scan windows used by the locator and the extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanWindow {
    pub small: usize,
    pub large: usize,
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self { small: SCAN_WINDOW, large: LARGE_SCAN_WINDOW }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub cd_start_disk: u16,
    pub entries_on_disk: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Parse the fixed part of a record. `bytes` starts at the signature.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < EOCD_LEN {
            return None;
        }
        Some(Self {
            disk_number: LittleEndian::read_u16(&bytes[4..6]),
            cd_start_disk: LittleEndian::read_u16(&bytes[6..8]),
            entries_on_disk: LittleEndian::read_u16(&bytes[8..10]),
            total_entries: LittleEndian::read_u16(&bytes[10..12]),
            cd_size: LittleEndian::read_u32(&bytes[12..16]),
            cd_offset: LittleEndian::read_u32(&bytes[16..20]),
            comment_len: LittleEndian::read_u16(&bytes[20..22]),
        })
    }
}

/// A located record and its absolute file offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trailer {
    pub offset: u64,
    pub record: EndOfCentralDirectory,
}

impl Trailer {
    /// File offset where the archive content begins, as the trailer describes it.
    pub fn archive_start(&self) -> Result<u64> {
        let span = u64::from(self.record.cd_size) + u64::from(self.record.cd_offset);
        self.offset.checked_sub(span).ok_or(Error::TrailerOutOfRange {
            eocd_offset: self.offset,
            cd_size: self.record.cd_size,
            cd_offset: self.record.cd_offset,
        })
    }
}

/// Position of the last signature match that still leaves room for a full record.
///
/// Later matches override earlier ones: the genuine record sits close to the
/// end of the file, while signature-like bytes inside compressed data or the
/// launcher code come earlier.
pub fn find_last_signature(buffer: &[u8], signature: &Signature) -> Option<usize> {
    let limit = buffer.len().checked_sub(EOCD_LEN)?;
    let pat = signature.as_bytes();
    buffer[..limit + pat.len()].windows(pat.len()).rposition(|w| w == pat)
}

/// Read up to `window` bytes ending at end of file. Returns the start offset and the bytes.
pub(crate) fn read_tail<R: Read + Seek>(reader: &mut R, window: usize) -> Result<(u64, Vec<u8>)> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let pos = file_size.saturating_sub(window as u64);
    let buffer = read_at(reader, pos, window)?;
    Ok((pos, buffer))
}

/// Read up to `len` bytes starting at `pos`; short reads at end of file are fine.
pub(crate) fn read_at<R: Read + Seek>(reader: &mut R, pos: u64, len: usize) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(pos))?;
    let mut buffer = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Finds the end-of-central-directory record of an archive appended to a file.
#[derive(Clone, Copy, Debug)]
pub struct TrailerLocator {
    signature: Signature,
    window: ScanWindow,
}

impl TrailerLocator {
    pub fn new(signature: Signature, window: ScanWindow) -> Self {
        Self { signature, window }
    }

    #[inline]
    pub fn window(&self) -> ScanWindow {
        self.window
    }

    pub fn locate<R: Read + Seek>(&self, reader: &mut R) -> Result<Trailer> {
        if let Some(trailer) = self.scan(reader, self.window.small)? {
            return Ok(trailer);
        }
        debug!(
            "no archive trailer in the last {} bytes, retrying with {} bytes",
            self.window.small, self.window.large
        );
        self.scan(reader, self.window.large)?.ok_or(Error::ArchiveNotFound)
    }

    /// Open `path`, locate the trailer and close the file again.
    pub fn locate_in_file(&self, path: &Path) -> Result<Trailer> {
        let mut file = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
        self.locate(&mut file)
    }

    fn scan<R: Read + Seek>(&self, reader: &mut R, window: usize) -> Result<Option<Trailer>> {
        let (pos, buffer) = read_tail(reader, window)?;
        let Some(at) = find_last_signature(&buffer, &self.signature) else {
            return Ok(None);
        };
        let record = EndOfCentralDirectory::parse(&buffer[at..]).ok_or(Error::ArchiveNotFound)?;
        let offset = pos + at as u64;
        trace!("archive trailer at 0x{:X}: {:?}", offset, record);
        Ok(Some(Trailer { offset, record }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(cd_size: u32, cd_offset: u32, comment: &[u8]) -> Vec<u8> {
        let mut out = b"PK\x05\x06".to_vec();
        out.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment);
        out
    }

    #[test]
    fn template_is_not_the_signature() {
        assert_ne!(Signature::TEMPLATE, Signature::activate());
        assert_eq!(Signature::activate().as_bytes(), b"PK\x05\x06");
    }

    #[test]
    fn last_match_wins() {
        let mut data = vec![0u8; 16];
        data.extend(record(1, 2, b""));
        data.extend(record(3, 4, b""));
        let at = find_last_signature(&data, &Signature::activate()).unwrap();
        assert_eq!(at, 16 + EOCD_LEN);
    }

    #[test]
    fn match_without_room_for_record_is_ignored() {
        let mut data = record(7, 8, b"");
        data.extend_from_slice(b"PK\x05\x06\0\0");
        assert_eq!(find_last_signature(&data, &Signature::activate()), Some(0));
    }

    #[test]
    fn template_never_matches() {
        let data = record(1, 2, b"");
        assert_eq!(find_last_signature(&data, &Signature::TEMPLATE), None);
    }

    #[test]
    fn parse_fields() {
        let rec = EndOfCentralDirectory::parse(&record(0x1234, 0x56, b"hi")).unwrap();
        assert_eq!(rec.cd_size, 0x1234);
        assert_eq!(rec.cd_offset, 0x56);
        assert_eq!(rec.comment_len, 2);
        assert_eq!(rec.total_entries, 1);
    }

    #[test]
    fn locate_in_small_window() {
        let mut data = vec![0xAAu8; 1000];
        data.extend(record(10, 20, b""));
        let locator = TrailerLocator::new(Signature::activate(), ScanWindow::default());
        let trailer = locator.locate(&mut Cursor::new(&data)).unwrap();
        assert_eq!(trailer.offset, 1000);
        assert_eq!(trailer.archive_start().unwrap(), 970);
    }

    #[test]
    fn long_comment_needs_large_window() {
        let mut data = vec![0xAAu8; 100];
        data.extend(record(10, 20, &vec![b'c'; 4000]));
        let window = ScanWindow { small: 256, large: 8192 };
        let locator = TrailerLocator::new(Signature::activate(), window);
        let trailer = locator.locate(&mut Cursor::new(&data)).unwrap();
        assert_eq!(trailer.offset, 100);
    }

    #[test]
    fn missing_archive() {
        let data = vec![0u8; 4096];
        let window = ScanWindow { small: 256, large: 8192 };
        let locator = TrailerLocator::new(Signature::activate(), window);
        assert!(matches!(locator.locate(&mut Cursor::new(&data)), Err(Error::ArchiveNotFound)));
    }

    #[test]
    fn trailer_pointing_before_file_start() {
        let trailer = Trailer {
            offset: 10,
            record: EndOfCentralDirectory::parse(&record(8, 8, b"")).unwrap(),
        };
        assert!(matches!(trailer.archive_start(), Err(Error::TrailerOutOfRange { .. })));
    }
}
