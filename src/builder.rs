//! Offline construction of a table image.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use ahash::AHasher;

use crate::entry::{Entry, ENTRY_LEN};
use crate::error::{Result, TableError};
use crate::fingerprint::{fingerprint_phrase, fingerprint_tokens};
use crate::header::{TableHeader, HEADER_LEN};
use crate::image::TableImage;
use crate::probing::{bucket_count_for, LinearProbe, ProbingIndex, ProbingIndexMut, DEFAULT_LOAD_FACTOR};
use crate::record::TargetPhrase;

/// Encoded records staged for one source key.
#[derive(Debug, Default)]
struct Block {
    bytes: Vec<u8>,
    count: u64,
}

/// Collects target phrases per source key and lays them out as one image.
///
/// Single-threaded by construction: every mutation takes `&mut self`, and
/// [`finish`](Self::finish) consumes the builder.
#[derive(Debug)]
pub struct TableBuilder {
    blocks: HashMap<u64, Block, BuildHasherDefault<AHasher>>,
    num_scores: usize,
    load_factor: f64,
}

impl TableBuilder {
    /// Creates a builder for phrases carrying `num_scores` scores each.
    pub fn new(num_scores: usize) -> Self {
        Self::with_capacity(0, num_scores)
    }

    /// Creates a builder with room for `size_hint` source keys before it
    /// reallocates.
    pub fn with_capacity(size_hint: usize, num_scores: usize) -> Self {
        Self {
            blocks: HashMap::with_capacity_and_hasher(size_hint, Default::default()),
            num_scores,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Sets the fraction of slots the finished table may fill.
    ///
    /// Must lie strictly between 0 and 1; checked in [`finish`](Self::finish).
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn num_scores(&self) -> usize {
        self.num_scores
    }

    /// Number of distinct source keys staged so far.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends a target phrase to the block of `source_key`.
    pub fn add(&mut self, source_key: u64, phrase: &TargetPhrase) -> Result<()> {
        // Validate before touching the map so a rejected phrase leaves no empty block.
        let record_len = phrase.header(self.num_scores)?.record_len(self.num_scores);
        let staged = self.blocks.get(&source_key).map_or(0, |b| b.bytes.len());
        if staged + record_len > u32::MAX as usize {
            return Err(TableError::InvalidArgument(format!(
                "target phrases of key {:#018x} exceed {} bytes",
                source_key,
                u32::MAX
            )));
        }
        let block = self.blocks.entry(source_key).or_default();
        phrase.encode_into(&mut block.bytes, self.num_scores)?;
        block.count += 1;
        Ok(())
    }

    /// Appends a target phrase under the fingerprint of `source`.
    pub fn add_phrase(&mut self, source: &str, phrase: &TargetPhrase) -> Result<u64> {
        let key = fingerprint_phrase(source);
        self.add(key, phrase)?;
        Ok(key)
    }

    /// Appends a target phrase under the fingerprint of a token sequence.
    pub fn add_tokens(&mut self, source: &[u32], phrase: &TargetPhrase) -> Result<u64> {
        let key = fingerprint_tokens(source);
        self.add(key, phrase)?;
        Ok(key)
    }

    /// Lays out header, entry slots and data region.
    ///
    /// Blocks are written in ascending key order, so the same input always
    /// yields the same bytes.
    pub fn finish(self) -> Result<TableImage> {
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(TableError::InvalidArgument(format!(
                "load factor {} outside (0, 1)",
                self.load_factor
            )));
        }
        let num_scores = u32::try_from(self.num_scores)
            .map_err(|_| TableError::InvalidArgument(format!("{} scores per phrase", self.num_scores)))?;

        let mut keys: Vec<u64> = self.blocks.keys().copied().collect();
        keys.sort_unstable();

        let bucket_count = bucket_count_for(keys.len(), self.load_factor);
        let data_len: usize = self.blocks.values().map(|b| b.bytes.len()).sum();
        let data_offset = HEADER_LEN + bucket_count * ENTRY_LEN;
        let mut image = TableImage::zeroed(data_offset + data_len);

        let max_probe = {
            let (head, rest) = image.as_bytes_mut().split_at_mut(HEADER_LEN);
            let (slot_bytes, data) = rest.split_at_mut(bucket_count * ENTRY_LEN);
            let slots: &mut [Entry] = bytemuck::try_cast_slice_mut(slot_bytes)
                .map_err(|e| TableError::Corrupt(format!("entry region: {}", e)))?;
            let mut table = LinearProbe::new(slots, 0)?;

            let mut offset = 0usize;
            for key in &keys {
                let block = &self.blocks[key];
                let len = block.bytes.len();
                data[offset..offset + len].copy_from_slice(&block.bytes);
                // Block length was capped at u32::MAX in add().
                table.insert(Entry::new(*key, offset as u64, block.count, len as u32))?;
                offset += len;
            }

            let max_probe = table.max_probe();
            let header = TableHeader::new(
                num_scores,
                max_probe,
                bucket_count as u64,
                keys.len() as u64,
                data_len as u64,
            );
            head.copy_from_slice(bytemuck::bytes_of(&header));
            max_probe
        };

        tracing::info!(
            entries = keys.len(),
            buckets = bucket_count,
            max_probe,
            data_len,
            bytes = image.len(),
            "built probing table"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FORMAT_VERSION;

    fn phrase(words: &[u32]) -> TargetPhrase {
        TargetPhrase::new(words.to_vec(), vec![0.5])
    }

    #[test]
    fn empty_builder_yields_valid_header() {
        let image = TableBuilder::new(1).finish().unwrap();
        let header = TableHeader::validate(image.as_bytes()).unwrap();
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.entry_count, 0);
        assert_eq!(header.bucket_count, 32);
        assert_eq!(header.data_len, 0);
        assert_eq!(image.len(), 64 + 32 * 32);
    }

    #[test]
    fn groups_targets_per_source() {
        let mut b = TableBuilder::new(1);
        b.add(1, &phrase(&[1])).unwrap();
        b.add(1, &phrase(&[2, 3])).unwrap();
        b.add(2, &phrase(&[4])).unwrap();
        assert_eq!(b.len(), 2);

        let image = b.finish().unwrap();
        let header = TableHeader::validate(image.as_bytes()).unwrap();
        assert_eq!(header.entry_count, 2);
        assert_eq!(header.data_len, (8 + 4 + 4) + (8 + 8 + 4) + (8 + 4 + 4));
    }

    #[test]
    fn rejected_phrase_leaves_builder_untouched() {
        let mut b = TableBuilder::new(2);
        assert!(b.add(5, &phrase(&[1])).is_err());
        assert!(b.is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let build = |order: &[u64]| {
            let mut b = TableBuilder::new(1);
            for &k in order {
                b.add(k, &phrase(&[k as u32])).unwrap();
            }
            b.finish().unwrap()
        };
        assert_eq!(build(&[3, 1, 2]).as_bytes(), build(&[1, 2, 3]).as_bytes());
    }

    #[test]
    fn invalid_load_factor() {
        for lf in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                TableBuilder::new(0).load_factor(lf).finish(),
                Err(TableError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn lower_load_factor_means_more_buckets() {
        let mut b = TableBuilder::with_capacity(100, 0).load_factor(0.25);
        for k in 0..100 {
            b.add(k, &TargetPhrase::default()).unwrap();
        }
        let image = b.finish().unwrap();
        assert_eq!(TableHeader::validate(image.as_bytes()).unwrap().bucket_count, 512);
    }
}
