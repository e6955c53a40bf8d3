//! Record framing for the store file.
//!
//! ```text
//! record_len: u32 LE   total length, including this field and the CRC
//! kind:       u8       see RecordKind
//! payload:    [u8]     CBOR document
//! crc32:      u32 LE   over every preceding byte of the record
//! ```

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexDefinition;
use crate::snippet::Snippet;

/// The kind of a record in the store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Inserts or replaces a snippet document.
    Put = 1,
    /// Declares a secondary index.
    DeclareIndex = 2,
}

impl RecordKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::DeclareIndex),
            _ => None,
        }
    }
}

/// A framed record, as written to or read from the store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    /// What the payload holds.
    pub kind: RecordKind,
    /// CBOR payload.
    pub payload: Vec<u8>,
}

impl StoreRecord {
    /// Header size: record_len (4) + kind (1).
    pub const HEADER_SIZE: usize = 5;
    /// CRC size.
    pub const CRC_SIZE: usize = 4;
    /// Largest record the store writes or accepts, framing included.
    ///
    /// A length field above this can only come from a damaged header, so
    /// it is reported as corruption rather than taken for a torn write.
    pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

    /// Creates a put record for `snippet`.
    pub fn put(snippet: &Snippet) -> CoreResult<Self> {
        Ok(Self {
            kind: RecordKind::Put,
            payload: codec::encode_document(snippet)?,
        })
    }

    /// Creates an index declaration record.
    pub fn declare_index(definition: &IndexDefinition) -> CoreResult<Self> {
        Ok(Self {
            kind: RecordKind::DeclareIndex,
            payload: codec::encode_document(definition)?,
        })
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::CRC_SIZE
    }

    /// Encodes the record to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encode`] if the record would exceed
    /// [`StoreRecord::MAX_RECORD_SIZE`].
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let record_len = self.encoded_size();
        if record_len > Self::MAX_RECORD_SIZE {
            return Err(CoreError::encode(format!(
                "record of {record_len} bytes exceeds the {} byte limit",
                Self::MAX_RECORD_SIZE
            )));
        }
        let len_field = u32::try_from(record_len)
            .map_err(|_| CoreError::encode(format!("record length {record_len} overflows u32")))?;
        let mut buf = Vec::with_capacity(record_len);

        buf.extend_from_slice(&len_field.to_le_bytes());
        buf.push(self.kind as u8);
        buf.extend_from_slice(&self.payload);

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Decodes the payload as a snippet. `offset` is only used in errors.
    pub fn snippet(&self, offset: u64) -> CoreResult<Snippet> {
        codec::decode_document(&self.payload, offset)
    }

    /// Decodes the payload as an index definition.
    pub fn index_definition(&self, offset: u64) -> CoreResult<IndexDefinition> {
        codec::decode_document(&self.payload, offset)
    }
}

/// Walks the framed records in a byte buffer.
///
/// Yields `(offset, record)` pairs. A trailing record whose bytes are not
/// all present is a torn write: iteration stops there without an error and
/// [`RecordScanner::valid_len`] reports where the intact prefix ends. A
/// record that fails its checksum, or whose length field is below a header
/// or above [`StoreRecord::MAX_RECORD_SIZE`], is corruption and is yielded
/// as an error, after which iteration stops.
pub struct RecordScanner<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> RecordScanner<'a> {
    /// Creates a scanner over `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Length of the prefix made of complete, verified records.
    #[must_use]
    pub fn valid_len(&self) -> u64 {
        self.pos as u64
    }

    fn decode_next(&mut self) -> Option<CoreResult<(u64, StoreRecord)>> {
        let rest = &self.data[self.pos..];
        let offset = self.pos as u64;

        if rest.len() < 4 {
            return None;
        }

        let record_len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        if record_len < StoreRecord::HEADER_SIZE + StoreRecord::CRC_SIZE {
            return Some(Err(CoreError::corrupted(
                offset,
                format!("record length {record_len} is shorter than a header"),
            )));
        }
        if record_len > StoreRecord::MAX_RECORD_SIZE {
            return Some(Err(CoreError::corrupted(
                offset,
                format!("record length {record_len} exceeds the record size limit"),
            )));
        }
        if rest.len() < record_len {
            return None;
        }

        let body_end = record_len - StoreRecord::CRC_SIZE;
        let stored_crc = u32::from_le_bytes([
            rest[body_end],
            rest[body_end + 1],
            rest[body_end + 2],
            rest[body_end + 3],
        ]);
        let computed_crc = crc32fast::hash(&rest[..body_end]);
        if stored_crc != computed_crc {
            return Some(Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored_crc,
                actual: computed_crc,
            }));
        }

        let Some(kind) = RecordKind::from_byte(rest[4]) else {
            return Some(Err(CoreError::corrupted(
                offset,
                format!("unknown record kind {}", rest[4]),
            )));
        };

        let payload = rest[StoreRecord::HEADER_SIZE..body_end].to_vec();
        self.pos += record_len;
        Some(Ok((offset, StoreRecord { kind, payload })))
    }
}

impl Iterator for RecordScanner<'_> {
    type Item = CoreResult<(u64, StoreRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.decode_next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoreRecord {
        StoreRecord::put(&Snippet::new("title", "body")).unwrap()
    }

    #[test]
    fn encode_layout() {
        let record = sample();
        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len(), record.encoded_size());
        assert_eq!(
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            bytes.len()
        );
        assert_eq!(bytes[4], RecordKind::Put as u8);
    }

    #[test]
    fn scanner_reads_back_records() {
        let a = sample();
        let b = StoreRecord::declare_index(&IndexDefinition::created_at()).unwrap();
        let mut data = a.encode().unwrap();
        data.extend(b.encode().unwrap());

        let mut scanner = RecordScanner::new(&data);
        let (off_a, got_a) = scanner.next().unwrap().unwrap();
        let (off_b, got_b) = scanner.next().unwrap().unwrap();
        assert!(scanner.next().is_none());

        assert_eq!((off_a, got_a), (0, a.clone()));
        assert_eq!((off_b, got_b), (a.encoded_size() as u64, b));
        assert_eq!(scanner.valid_len(), data.len() as u64);
    }

    #[test]
    fn torn_tail_is_not_an_error() {
        let a = sample();
        let mut data = a.encode().unwrap();
        let second = sample().encode().unwrap();
        data.extend_from_slice(&second[..second.len() / 2]);

        let mut scanner = RecordScanner::new(&data);
        assert!(scanner.next().unwrap().is_ok());
        assert!(scanner.next().is_none());
        assert_eq!(scanner.valid_len(), a.encoded_size() as u64);
    }

    #[test]
    fn flipped_byte_is_checksum_mismatch() {
        let mut data = sample().encode().unwrap();
        data[7] ^= 0xFF;

        let mut scanner = RecordScanner::new(&data);
        assert!(matches!(
            scanner.next(),
            Some(Err(CoreError::ChecksumMismatch { offset: 0, .. }))
        ));
        assert!(scanner.next().is_none());
        assert_eq!(scanner.valid_len(), 0);
    }

    #[test]
    fn impossible_length_is_corruption() {
        let data = [2u8, 0, 0, 0, 1, 0, 0, 0, 0];
        let mut scanner = RecordScanner::new(&data);
        assert!(matches!(
            scanner.next(),
            Some(Err(CoreError::Corrupted { .. }))
        ));
    }

    #[test]
    fn oversized_length_field_is_corruption_not_torn() {
        let mut data = sample().encode().unwrap();
        data.extend(sample().encode().unwrap());
        data[3] = 0x7F;

        let mut scanner = RecordScanner::new(&data);
        assert!(matches!(
            scanner.next(),
            Some(Err(CoreError::Corrupted { offset: 0, .. }))
        ));
        assert!(scanner.next().is_none());
        assert_eq!(scanner.valid_len(), 0);
    }

    #[test]
    fn oversized_record_is_not_encoded() {
        let record = StoreRecord {
            kind: RecordKind::Put,
            payload: vec![0; StoreRecord::MAX_RECORD_SIZE],
        };
        assert!(matches!(record.encode(), Err(CoreError::Encode { .. })));
    }
}
