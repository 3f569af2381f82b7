//! Read-only table views over a mapped or buffered image.
//!
//! A [`TableView`] owns its backing storage and is `Send + Sync`; share it
//! through an `Arc` and call [`TableView::lookup`] from any number of
//! threads without locking. Dropping the view unmaps the file.

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;

use crate::entry::{Entry, ENTRY_LEN};
use crate::error::{Result, TableError};
use crate::fingerprint::{fingerprint_phrase, fingerprint_tokens};
use crate::header::{TableHeader, HEADER_LEN};
use crate::image::TableImage;
use crate::probing::find_in_slots;
use crate::record::TargetPhrases;

/// How [`load_with`] brings the file into memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Map the file read-only, reading it into a buffer if mapping fails.
    #[default]
    Map,
    /// Read the whole file into an aligned buffer.
    Read,
}

enum Backing {
    Mapped(Mmap),
    Owned(TableImage),
}

impl Backing {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(m) => &m[..],
            Backing::Owned(image) => image.as_bytes(),
        }
    }
}

/// Loads the table at `path`, which must be exactly `expected_size` bytes.
pub fn load(path: impl AsRef<Path>, expected_size: u64) -> Result<TableView> {
    load_with(path, expected_size, LoadMode::Map)
}

pub fn load_with(path: impl AsRef<Path>, expected_size: u64, mode: LoadMode) -> Result<TableView> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TableError::NotFound(path.to_path_buf()),
        _ => TableError::Io(e),
    })?;

    let actual = file.metadata()?.len();
    if actual != expected_size {
        return Err(TableError::SizeMismatch {
            expected: expected_size,
            actual,
        });
    }
    let len = usize::try_from(actual)
        .map_err(|_| TableError::InvalidArgument(format!("{} bytes do not fit in memory", actual)))?;

    let backing = match mode {
        LoadMode::Map => match map_file(&file, len) {
            Ok(mmap) => Backing::Mapped(mmap),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "mmap failed, reading table into memory");
                Backing::Owned(TableImage::read_exact_from(&file, len)?)
            }
        },
        LoadMode::Read => Backing::Owned(TableImage::read_exact_from(&file, len)?),
    };

    let view = TableView::new(backing)?;
    tracing::debug!(
        path = %path.display(),
        bytes = len,
        entries = view.entry_count(),
        mapped = view.is_mapped(),
        "loaded probing table"
    );
    Ok(view)
}

fn map_file(file: &File, len: usize) -> io::Result<Mmap> {
    // SAFETY: tables are written once through a rename and never modified in
    // place; the map is read-only and its length is checked below.
    let mmap = unsafe { Mmap::map(file)? };
    if mmap.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("mapped {} of {} bytes", mmap.len(), len),
        ));
    }
    Ok(mmap)
}

/// A loaded, immutable probing table.
pub struct TableView {
    backing: Backing,
    header: TableHeader,
}

impl TableView {
    fn new(backing: Backing) -> Result<Self> {
        let header = TableHeader::validate(backing.as_bytes())?;
        let slots = &backing.as_bytes()[HEADER_LEN..header.data_offset()];
        bytemuck::try_cast_slice::<u8, Entry>(slots)
            .map_err(|e| TableError::Corrupt(format!("entry region: {}", e)))?;
        Ok(Self { backing, header })
    }

    /// Validates an in-memory image without touching disk.
    pub fn from_image(image: TableImage) -> Result<Self> {
        Self::new(Backing::Owned(image))
    }

    /// The entry slots, including empty ones.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        let bytes = self.backing.as_bytes();
        // SAFETY: `new` checked that the header's bucket count fits the image
        // and that the region at HEADER_LEN is aligned for `Entry`. The backing
        // is never mutated or moved out from under `self`, and `Entry` is Pod.
        unsafe {
            std::slice::from_raw_parts(
                bytes.as_ptr().add(HEADER_LEN).cast::<Entry>(),
                self.header.bucket_count as usize,
            )
        }
    }

    /// Finds the entry stored for `key`.
    #[inline]
    pub fn lookup(&self, key: u64) -> Option<Entry> {
        find_in_slots(self.entries(), self.header.max_probe, key)
    }

    pub fn lookup_phrase(&self, source: &str) -> Option<Entry> {
        self.lookup(fingerprint_phrase(source))
    }

    pub fn lookup_tokens(&self, source: &[u32]) -> Option<Entry> {
        self.lookup(fingerprint_tokens(source))
    }

    /// Iterates the target-phrase records referenced by `entry`.
    pub fn target_phrases(&self, entry: &Entry) -> Result<TargetPhrases<'_>> {
        let data = self.data_region();
        let start = usize::try_from(entry.value()).unwrap_or(usize::MAX);
        let needed = entry.bytes_to_read() as usize;
        let block = start
            .checked_add(needed)
            .and_then(|end| data.get(start..end))
            .ok_or(TableError::RecordBounds {
                offset: start,
                needed,
                available: data.len(),
            })?;
        Ok(TargetPhrases::new(block, entry.target_index(), self.num_scores()))
    }

    pub fn data_region(&self) -> &[u8] {
        &self.backing.as_bytes()[self.header.data_offset()..]
    }

    /// The full image exactly as stored on disk.
    pub fn as_bytes(&self) -> &[u8] {
        self.backing.as_bytes()
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.backing.as_bytes().len()
    }

    /// True if the table holds no keys. The image itself never is.
    pub fn is_empty(&self) -> bool {
        self.header.entry_count == 0
    }

    pub fn entry_count(&self) -> u64 {
        self.header.entry_count
    }

    pub fn bucket_count(&self) -> u64 {
        self.header.bucket_count
    }

    pub fn num_scores(&self) -> usize {
        self.header.num_scores as usize
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }
}

impl std::fmt::Debug for TableView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableView")
            .field("header", &self.header)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<TableView>;
};

const _: () = assert!(ENTRY_LEN % 8 == 0 && HEADER_LEN % 8 == 0);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use crate::record::TargetPhrase;

    fn small_image() -> TableImage {
        let mut b = TableBuilder::new(0);
        b.add(0, &TargetPhrase::new(vec![10], vec![])).unwrap();
        b.add(42, &TargetPhrase::new(vec![20, 21], vec![])).unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn from_image_lookup() {
        let view = TableView::from_image(small_image()).unwrap();
        assert!(!view.is_mapped());
        assert_eq!(view.entry_count(), 2);

        let e = view.lookup(0).expect("zero key is a real key");
        let words: Vec<u32> = view
            .target_phrases(&e)
            .unwrap()
            .flat_map(|r| r.unwrap().words())
            .collect();
        assert_eq!(words, vec![10]);
        assert_eq!(view.lookup(42).unwrap().target_index(), 1);
        assert_eq!(view.lookup(7), None);
    }

    #[test]
    fn entries_cover_all_buckets() {
        let view = TableView::from_image(small_image()).unwrap();
        assert_eq!(view.entries().len() as u64, view.bucket_count());
        assert_eq!(view.entries().iter().filter(|e| e.is_occupied()).count(), 2);
    }

    #[test]
    fn entries_view_the_image_in_place() {
        let view = TableView::from_image(small_image()).unwrap();
        let base = view.as_bytes().as_ptr() as usize;
        assert_eq!(view.entries().as_ptr() as usize, base + HEADER_LEN);
        assert_eq!(
            bytemuck::cast_slice::<Entry, u8>(view.entries()),
            &view.as_bytes()[HEADER_LEN..view.header().data_offset()]
        );
    }

    #[test]
    fn lookup_agrees_with_slot_scan() {
        let mut b = TableBuilder::with_capacity(500, 0);
        for k in 0..500u64 {
            b.add(k.wrapping_mul(0x9E37_79B9_7F4A_7C15), &TargetPhrase::default()).unwrap();
        }
        let view = TableView::from_image(b.finish().unwrap()).unwrap();
        let occupied: Vec<Entry> = view.entries().iter().copied().filter(|e| e.is_occupied()).collect();
        assert_eq!(occupied.len(), 500);
        for e in &occupied {
            assert_eq!(view.lookup(e.key()), Some(*e));
        }
    }

    #[test]
    fn out_of_range_entry_is_rejected() {
        let view = TableView::from_image(small_image()).unwrap();
        let bogus = Entry::new(1, 1 << 40, 1, 16);
        assert!(matches!(
            view.target_phrases(&bogus),
            Err(TableError::RecordBounds { .. })
        ));
        let overflow = Entry::new(1, u64::MAX, 1, 16);
        assert!(view.target_phrases(&overflow).is_err());
    }

    #[test]
    fn read_mode_matches_map_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.prpt");
        let image = small_image();
        image.write_to(&path).unwrap();

        let mapped = load_with(&path, image.len() as u64, LoadMode::Map).unwrap();
        let read = load_with(&path, image.len() as u64, LoadMode::Read).unwrap();
        assert!(mapped.is_mapped());
        assert!(!read.is_mapped());
        assert_eq!(mapped.as_bytes(), read.as_bytes());
        assert_eq!(mapped.lookup(42), read.lookup(42));
    }
}
