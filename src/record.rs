//! Target-phrase records in the data region.
//!
//! ## Layout
//!
//! ```text
//! header:     align_index u16 | word_count u16 | property_len u16 | padding u16
//! properties: [u8; property_len]
//! words:      [u32; word_count]     host byte order
//! scores:     [f32; num_scores]     host byte order, num_scores is per table
//! ```
//!
//! Records are packed back to back, so nothing after the header is aligned;
//! words and scores are read with unaligned copies.

use bytemuck::{Pod, Zeroable};

use crate::error::{Result, TableError};
use crate::property::{PhraseProperties, COUNTS_KEY};
use crate::stats::{CountPolicy, PhraseStatistics};

pub const RECORD_HEADER_LEN: usize = std::mem::size_of::<TargetPhraseHeader>();

/// Fixed metadata prefix of a target-phrase record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TargetPhraseHeader {
    pub align_index: u16,
    pub word_count: u16,
    pub property_len: u16,
    padding: u16,
}

const _: () = assert!(RECORD_HEADER_LEN == 8);

impl TargetPhraseHeader {
    pub fn new(align_index: u16, word_count: u16, property_len: u16) -> Self {
        Self {
            align_index,
            word_count,
            property_len,
            padding: 0,
        }
    }

    /// Total encoded length of a record with this header.
    pub fn record_len(&self, num_scores: usize) -> usize {
        RECORD_HEADER_LEN + self.property_len as usize + 4 * self.word_count as usize + 4 * num_scores
    }
}

/// An owned target phrase, as handed to the table builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetPhrase {
    pub align_index: u16,
    pub words: Vec<u32>,
    pub scores: Vec<f32>,
    pub properties: Vec<u8>,
}

impl TargetPhrase {
    pub fn new(words: Vec<u32>, scores: Vec<f32>) -> Self {
        Self {
            words,
            scores,
            ..Default::default()
        }
    }

    pub fn with_align_index(mut self, align_index: u16) -> Self {
        self.align_index = align_index;
        self
    }

    pub fn with_properties(mut self, properties: impl Into<Vec<u8>>) -> Self {
        self.properties = properties.into();
        self
    }

    /// Checks that the phrase fits the record layout of a table with
    /// `num_scores` scores per phrase, returning its header.
    pub fn header(&self, num_scores: usize) -> Result<TargetPhraseHeader> {
        let word_count = u16::try_from(self.words.len()).map_err(|_| {
            TableError::InvalidArgument(format!("{} words exceed u16::MAX", self.words.len()))
        })?;
        let property_len = u16::try_from(self.properties.len()).map_err(|_| {
            TableError::InvalidArgument(format!(
                "{} property bytes exceed u16::MAX",
                self.properties.len()
            ))
        })?;
        if self.scores.len() != num_scores {
            return Err(TableError::InvalidArgument(format!(
                "phrase has {} scores, table expects {}",
                self.scores.len(),
                num_scores
            )));
        }
        Ok(TargetPhraseHeader::new(self.align_index, word_count, property_len))
    }

    /// Appends the encoded record to `out`, returning its length.
    pub fn encode_into(&self, out: &mut Vec<u8>, num_scores: usize) -> Result<usize> {
        let header = self.header(num_scores)?;
        let start = out.len();
        out.extend_from_slice(bytemuck::bytes_of(&header));
        out.extend_from_slice(&self.properties);
        for w in &self.words {
            out.extend_from_slice(&w.to_ne_bytes());
        }
        for s in &self.scores {
            out.extend_from_slice(&s.to_ne_bytes());
        }
        Ok(out.len() - start)
    }
}

/// A record borrowed from a table's data region.
#[derive(Debug, Clone, Copy)]
pub struct TargetPhraseRecord<'a> {
    header: TargetPhraseHeader,
    properties: &'a [u8],
    words: &'a [u8],
    scores: &'a [u8],
}

impl<'a> TargetPhraseRecord<'a> {
    /// Decodes the record at the start of `buf`.
    ///
    /// Returns the record and the number of bytes it spans. Fails if `buf`
    /// is shorter than the header says.
    pub fn decode(buf: &'a [u8], num_scores: usize) -> Result<(Self, usize)> {
        let head = buf.get(..RECORD_HEADER_LEN).ok_or(TableError::RecordBounds {
            offset: 0,
            needed: RECORD_HEADER_LEN,
            available: buf.len(),
        })?;
        let header: TargetPhraseHeader = bytemuck::pod_read_unaligned(head);
        let len = header.record_len(num_scores);
        if buf.len() < len {
            return Err(TableError::RecordBounds {
                offset: 0,
                needed: len,
                available: buf.len(),
            });
        }

        let (properties, rest) = buf[RECORD_HEADER_LEN..len].split_at(header.property_len as usize);
        let (words, scores) = rest.split_at(4 * header.word_count as usize);
        Ok((
            Self {
                header,
                properties,
                words,
                scores,
            },
            len,
        ))
    }

    #[inline]
    pub fn header(&self) -> TargetPhraseHeader {
        self.header
    }

    #[inline]
    pub fn align_index(&self) -> u16 {
        self.header.align_index
    }

    #[inline]
    pub fn word_count(&self) -> usize {
        self.header.word_count as usize
    }

    /// Exactly `property_len` bytes of property data.
    #[inline]
    pub fn properties(&self) -> &'a [u8] {
        self.properties
    }

    pub fn property_text(&self) -> Result<&'a str> {
        std::str::from_utf8(self.properties)
            .map_err(|e| TableError::MalformedProperty(format!("invalid UTF-8: {}", e)))
    }

    pub fn words(&self) -> impl ExactSizeIterator<Item = u32> + 'a {
        self.words
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
    }

    pub fn scores(&self) -> impl ExactSizeIterator<Item = f32> + 'a {
        self.scores
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// Parses the `Counts` property, if the record carries one.
    pub fn counts(&self, policy: CountPolicy) -> Result<Option<PhraseStatistics>> {
        match PhraseProperties::find(self.property_text()?, COUNTS_KEY)? {
            Some(raw) => Ok(Some(PhraseStatistics::parse_with(raw, policy)?)),
            None => Ok(None),
        }
    }

    pub fn to_phrase(&self) -> TargetPhrase {
        TargetPhrase {
            align_index: self.header.align_index,
            words: self.words().collect(),
            scores: self.scores().collect(),
            properties: self.properties.to_vec(),
        }
    }
}

/// The records of one entry's block, in insertion order.
#[derive(Debug, Clone)]
pub struct TargetPhrases<'a> {
    block: &'a [u8],
    pos: usize,
    remaining: u64,
    num_scores: usize,
}

impl<'a> TargetPhrases<'a> {
    pub(crate) fn new(block: &'a [u8], count: u64, num_scores: usize) -> Self {
        Self {
            block,
            pos: 0,
            remaining: count,
            num_scores,
        }
    }
}

impl<'a> Iterator for TargetPhrases<'a> {
    type Item = Result<TargetPhraseRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match TargetPhraseRecord::decode(&self.block[self.pos..], self.num_scores) {
            Ok((record, len)) => {
                self.pos += len;
                self.remaining -= 1;
                Some(Ok(record))
            }
            Err(TableError::RecordBounds { needed, available, .. }) => {
                self.remaining = 0;
                Some(Err(TableError::RecordBounds {
                    offset: self.pos,
                    needed,
                    available,
                }))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, usize::try_from(self.remaining).ok())
    }
}
