//! Fixed 64-byte file header and whole-image validation.
//!
//! ## Format
//!
//! ```text
//! [0..64)                  TableHeader
//! [64..64+32*buckets)      Entry slots
//! [..+data_len)            target-phrase records
//! ```
//!
//! All integers are in host byte order.

use bytemuck::{Pod, Zeroable};

use crate::entry::ENTRY_LEN;
use crate::error::{Result, TableError};

/// Layout revision. Any change to the header, entry or record layout
/// must bump this.
pub const FORMAT_VERSION: u32 = 8;

pub const TABLE_MAGIC: [u8; 4] = *b"PRPT";

pub const HEADER_LEN: usize = std::mem::size_of::<TableHeader>();

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TableHeader {
    pub version: u32,
    pub magic: [u8; 4],
    pub num_scores: u32,
    pub max_probe: u32,
    pub bucket_count: u64,
    pub entry_count: u64,
    pub data_len: u64,
    reserved: [u64; 3],
}

const _: () = assert!(HEADER_LEN == 64);

impl TableHeader {
    pub fn new(num_scores: u32, max_probe: u32, bucket_count: u64, entry_count: u64, data_len: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            magic: TABLE_MAGIC,
            num_scores,
            max_probe,
            bucket_count,
            entry_count,
            data_len,
            reserved: [0; 3],
        }
    }

    /// Byte offset of the data region.
    pub fn data_offset(&self) -> usize {
        HEADER_LEN + self.bucket_count as usize * ENTRY_LEN
    }

    /// Image length implied by the header, or `None` on overflow.
    pub fn image_len(&self) -> Option<u64> {
        self.bucket_count
            .checked_mul(ENTRY_LEN as u64)?
            .checked_add(HEADER_LEN as u64)?
            .checked_add(self.data_len)
    }

    /// Reads and checks the header of a complete image.
    ///
    /// The version is checked first so that an incompatible layout is
    /// reported as such rather than as corruption.
    pub fn validate(image: &[u8]) -> Result<Self> {
        let head = image.get(..HEADER_LEN).ok_or_else(|| {
            TableError::Corrupt(format!(
                "image of {} bytes is smaller than the {} byte header",
                image.len(),
                HEADER_LEN
            ))
        })?;
        let header: TableHeader = bytemuck::pod_read_unaligned(head);

        if header.version != FORMAT_VERSION {
            return Err(TableError::VersionMismatch {
                found: header.version,
                supported: FORMAT_VERSION,
            });
        }
        if header.magic != TABLE_MAGIC {
            return Err(TableError::Corrupt("bad magic".to_string()));
        }
        if header.bucket_count == 0 || !header.bucket_count.is_power_of_two() {
            return Err(TableError::Corrupt(format!(
                "bucket count {} is not a power of two",
                header.bucket_count
            )));
        }
        if header.max_probe as u64 >= header.bucket_count {
            return Err(TableError::Corrupt(format!(
                "max probe {} exceeds bucket count {}",
                header.max_probe, header.bucket_count
            )));
        }
        if header.entry_count > header.bucket_count {
            return Err(TableError::Corrupt(format!(
                "{} entries in {} buckets",
                header.entry_count, header.bucket_count
            )));
        }
        match header.image_len() {
            Some(len) if len == image.len() as u64 => Ok(header),
            implied => Err(TableError::Corrupt(format!(
                "header describes {:?} bytes, image has {}",
                implied,
                image.len()
            ))),
        }
    }
}
