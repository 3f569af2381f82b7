//! Open-addressing probe over a flat slice of [`Entry`] slots.
//!
//! The table is sized once, filled once at build time and then only probed.
//! Bucket counts are powers of two so the home slot is a mask of the slot
//! hash; collisions walk forward one slot at a time.

use crate::entry::Entry;
use crate::error::{Result, TableError};
use crate::fingerprint::slot_hash;

pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
const MIN_TABLE_LEN: usize = 32;

#[inline]
fn next_pow2(n: usize) -> usize {
    if n < 2 {
        return 2;
    }
    n.next_power_of_two()
}

/// Number of buckets needed to hold `entries` keys at `load_factor`.
pub fn bucket_count_for(entries: usize, load_factor: f64) -> usize {
    let min_cap = (entries as f64 / load_factor).ceil() as usize;
    next_pow2(min_cap.max(MIN_TABLE_LEN))
}

/// Searches `slots` for `key`, looking at no more than `max_probe + 1` slots.
///
/// `slots.len()` must be a non-zero power of two.
#[inline]
pub(crate) fn find_in_slots(slots: &[Entry], max_probe: u32, key: u64) -> Option<Entry> {
    let mask = slots.len().wrapping_sub(1);
    debug_assert!(slots.len().is_power_of_two());
    let mut idx = (slot_hash(key) as usize) & mask;
    for _ in 0..=max_probe {
        let e = slots.get(idx)?;
        if !e.is_occupied() {
            return None;
        }
        if e.key() == key {
            return Some(*e);
        }
        idx = (idx + 1) & mask;
    }
    None
}

/// Read side of a probing table.
pub trait ProbingIndex {
    fn bucket_count(&self) -> usize;

    /// Longest distance from a home slot to where its key landed.
    fn max_probe(&self) -> u32;

    /// Finds the slot holding `key`.
    fn probe(&self, key: u64) -> Option<Entry>;
}

/// Build side of a probing table.
pub trait ProbingIndexMut: ProbingIndex {
    /// Places `entry` in the first free slot of its probe sequence.
    fn insert(&mut self, entry: Entry) -> Result<()>;
}

/// Linear probing over any slot storage.
///
/// `S` is `&mut [Entry]` while building and `&[Entry]` over a loaded image.
#[derive(Debug)]
pub struct LinearProbe<S> {
    slots: S,
    mask: usize,
    max_probe: u32,
}

impl<S: AsRef<[Entry]>> LinearProbe<S> {
    /// Wraps `slots`, whose length must be a non-zero power of two.
    pub fn new(slots: S, max_probe: u32) -> Result<Self> {
        let len = slots.as_ref().len();
        if len == 0 || !len.is_power_of_two() {
            return Err(TableError::InvalidArgument(format!(
                "bucket count {} is not a power of two",
                len
            )));
        }
        Ok(Self {
            slots,
            mask: len - 1,
            max_probe,
        })
    }

    #[inline]
    fn home(&self, key: u64) -> usize {
        (slot_hash(key) as usize) & self.mask
    }

    pub fn into_inner(self) -> S {
        self.slots
    }
}

impl<S: AsRef<[Entry]>> ProbingIndex for LinearProbe<S> {
    fn bucket_count(&self) -> usize {
        self.mask + 1
    }

    fn max_probe(&self) -> u32 {
        self.max_probe
    }

    fn probe(&self, key: u64) -> Option<Entry> {
        find_in_slots(self.slots.as_ref(), self.max_probe, key)
    }
}

impl<S: AsRef<[Entry]> + AsMut<[Entry]>> ProbingIndexMut for LinearProbe<S> {
    fn insert(&mut self, entry: Entry) -> Result<()> {
        let buckets = self.bucket_count();
        let mut idx = self.home(entry.key());
        let slots = self.slots.as_mut();
        for dist in 0..buckets {
            let slot = &mut slots[idx];
            if !slot.is_occupied() {
                *slot = entry;
                self.max_probe = self.max_probe.max(dist as u32);
                return Ok(());
            }
            if slot.key() == entry.key() {
                return Err(TableError::DuplicateKey(entry.key()));
            }
            idx = (idx + 1) & self.mask;
        }
        Err(TableError::TableFull { buckets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_slots(n: usize) -> Vec<Entry> {
        vec![Entry::default(); n]
    }

    #[test]
    fn sizing_respects_load_factor() {
        assert_eq!(bucket_count_for(0, 0.75), 32);
        assert_eq!(bucket_count_for(24, 0.75), 32);
        assert_eq!(bucket_count_for(25, 0.75), 64);
        assert_eq!(bucket_count_for(1000, 0.5), 2048);
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut slots = empty_slots(12);
        assert!(matches!(
            LinearProbe::new(slots.as_mut_slice(), 0),
            Err(TableError::InvalidArgument(_))
        ));
    }

    #[test]
    fn insert_then_probe() {
        let mut slots = empty_slots(64);
        let mut table = LinearProbe::new(slots.as_mut_slice(), 0).unwrap();
        for k in 0..40u64 {
            table.insert(Entry::new(k, k * 10, 1, 8)).unwrap();
        }
        for k in 0..40u64 {
            let e = table.probe(k).unwrap();
            assert_eq!(e.value(), k * 10);
        }
        assert_eq!(table.probe(1000), None);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut slots = empty_slots(32);
        let mut table = LinearProbe::new(slots.as_mut_slice(), 0).unwrap();
        table.insert(Entry::new(7, 0, 1, 0)).unwrap();
        assert!(matches!(
            table.insert(Entry::new(7, 1, 1, 0)),
            Err(TableError::DuplicateKey(7))
        ));
    }

    #[test]
    fn full_table_is_reported() {
        let mut slots = empty_slots(2);
        let mut table = LinearProbe::new(slots.as_mut_slice(), 0).unwrap();
        table.insert(Entry::new(1, 0, 0, 0)).unwrap();
        table.insert(Entry::new(2, 0, 0, 0)).unwrap();
        assert!(matches!(
            table.insert(Entry::new(3, 0, 0, 0)),
            Err(TableError::TableFull { buckets: 2 })
        ));
    }

    #[test]
    fn read_only_probe_honors_recorded_bound() {
        let mut slots = empty_slots(32);
        let max_probe = {
            let mut table = LinearProbe::new(slots.as_mut_slice(), 0).unwrap();
            for k in 0..24u64 {
                table.insert(Entry::new(k, k, 1, 0)).unwrap();
            }
            table.max_probe()
        };
        let view = LinearProbe::new(slots.as_slice(), max_probe).unwrap();
        for k in 0..24u64 {
            assert_eq!(view.probe(k).map(|e| e.value()), Some(k));
        }
        assert_eq!(view.probe(99), None);
    }
}
