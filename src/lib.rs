//! probing_pt_rs: a write-once, memory-mappable probing hash index for
//! phrase-table lookups.
//!
//! Offline, a [`TableBuilder`] collects target phrases per source-phrase
//! fingerprint and lays them out as one [`TableImage`]: a header, a flat
//! array of [`Entry`] slots filled by linear probing, and the packed
//! target-phrase records. [`serialize`] writes that image verbatim.
//!
//! Online, [`load`] maps the file read-only, checks size and format
//! version, and returns a [`TableView`] whose [`lookup`](TableView::lookup)
//! can be called concurrently from any number of threads.
//!
//! ```no_run
//! use probing_pt_rs::{load, TableBuilder, TargetPhrase};
//!
//! let mut builder = TableBuilder::new(1);
//! builder.add_phrase("das haus", &TargetPhrase::new(vec![17, 4], vec![-0.7]))?;
//! let image = builder.finish()?;
//! image.write_to("table.prpt")?;
//!
//! let view = load("table.prpt", image.len() as u64)?;
//! let entry = view.lookup_phrase("das haus").expect("present");
//! for record in view.target_phrases(&entry)? {
//!     let record = record?;
//!     println!("{:?} {:?}", record.words().collect::<Vec<_>>(), record.scores().collect::<Vec<_>>());
//! }
//! # Ok::<(), probing_pt_rs::TableError>(())
//! ```

pub mod builder;
pub mod entry;
pub mod error;
pub mod fingerprint;
pub mod header;
pub mod image;
pub mod loader;
pub mod probing;
pub mod property;
pub mod record;
pub mod serialize;
pub mod stats;

pub use builder::TableBuilder;
pub use entry::{Entry, ENTRY_LEN};
pub use error::{CountField, Result, StatsError, TableError};
pub use fingerprint::{fingerprint_phrase, fingerprint_tokens};
pub use header::{TableHeader, FORMAT_VERSION, HEADER_LEN};
pub use image::TableImage;
pub use loader::{load, load_with, LoadMode, TableView};
pub use probing::{LinearProbe, ProbingIndex, ProbingIndexMut};
pub use property::PhraseProperties;
pub use record::{TargetPhrase, TargetPhraseHeader, TargetPhraseRecord, TargetPhrases};
pub use serialize::serialize;
pub use stats::{CountPolicy, PhraseStatistics};
