//! Fixed-size hash-table slot.

use bytemuck::{Pod, Zeroable};

/// Size of one slot in the entry region.
pub const ENTRY_LEN: usize = std::mem::size_of::<Entry>();

const OCCUPIED: u32 = 1;

/// One slot of the probing table.
///
/// An all-zero slot is empty. Occupancy lives in `flags`, so a zero key is
/// an ordinary fingerprint.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Entry {
    key: u64,
    bytes_to_read: u32,
    flags: u32,
    value: u64,
    target_index: u64,
}

const _: () = assert!(ENTRY_LEN == 32);
const _: () = assert!(std::mem::align_of::<Entry>() == 8);

impl Entry {
    /// Creates an occupied slot.
    ///
    /// * `value` - byte offset of the key's block in the data region.
    /// * `target_index` - number of target-phrase records in the block.
    /// * `bytes_to_read` - byte length of the block.
    pub fn new(key: u64, value: u64, target_index: u64, bytes_to_read: u32) -> Self {
        Self {
            key,
            bytes_to_read,
            flags: OCCUPIED,
            value,
            target_index,
        }
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn target_index(&self) -> u64 {
        self.target_index
    }

    #[inline]
    pub fn bytes_to_read(&self) -> u32 {
        self.bytes_to_read
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.flags & OCCUPIED != 0
    }
}
