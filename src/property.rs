//! Phrase properties stored in a record's trailing bytes.
//!
//! Properties use the phrase-table convention `{{Key value}}`, repeated and
//! separated by whitespace:
//!
//! ```text
//! {{Counts 12 8 4}} {{SourceLabels 2 1 X}}
//! ```

use crate::error::{Result, TableError};

/// Property key under which count statistics are stored.
pub const COUNTS_KEY: &str = "Counts";

/// Iterator over `(key, value)` pairs of a property string.
#[derive(Debug, Clone)]
pub struct PhraseProperties<'a> {
    rest: &'a str,
}

impl<'a> PhraseProperties<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Value of the first property named `key`.
    pub fn find(text: &'a str, key: &str) -> Result<Option<&'a str>> {
        for prop in Self::new(text) {
            let (k, v) = prop?;
            if k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

impl<'a> Iterator for PhraseProperties<'a> {
    type Item = Result<(&'a str, &'a str)>;

    fn next(&mut self) -> Option<Self::Item> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let Some(body) = trimmed.strip_prefix("{{") else {
            self.rest = "";
            return Some(Err(TableError::MalformedProperty(format!(
                "expected '{{{{' at {:?}",
                trimmed
            ))));
        };
        let Some(end) = body.find("}}") else {
            self.rest = "";
            return Some(Err(TableError::MalformedProperty(
                "unterminated property".to_string(),
            )));
        };
        self.rest = &body[end + 2..];

        let inner = body[..end].trim();
        let (key, value) = match inner.find(char::is_whitespace) {
            Some(split) => (&inner[..split], inner[split..].trim()),
            None => (inner, ""),
        };
        if key.is_empty() {
            return Some(Err(TableError::MalformedProperty(
                "property without a key".to_string(),
            )));
        }
        Some(Ok((key, value)))
    }
}
