//! Owned, 8-byte aligned table image.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// A complete table image held in memory.
///
/// Backed by `u64` words so the entry region can be viewed as `[Entry]`
/// without copying. `len` is the exact byte length; the last word may carry
/// up to seven bytes of zero slack that are never exposed.
#[derive(Clone, PartialEq, Eq)]
pub struct TableImage {
    words: Vec<u64>,
    len: usize,
}

impl TableImage {
    /// A zero-filled image of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(8)],
            len,
        }
    }

    /// Copies `bytes` into an aligned image.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut image = Self::zeroed(bytes.len());
        image.as_bytes_mut().copy_from_slice(bytes);
        image
    }

    /// Reads exactly `len` bytes from `reader`.
    pub fn read_exact_from<R: Read>(mut reader: R, len: usize) -> Result<Self> {
        let mut image = Self::zeroed(len);
        reader.read_exact(image.as_bytes_mut())?;
        Ok(image)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.len]
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Serializes the image to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::serialize::serialize(self.as_bytes(), path)
    }
}

impl AsRef<[u8]> for TableImage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for TableImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableImage").field("len", &self.len).finish()
    }
}
