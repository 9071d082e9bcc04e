//! String interning for country, region and city names.
//!
//! The vendor dataset repeats the same few thousand names across millions of
//! rows. Records store a `u32` index into a [`StringTable`] instead, and the
//! table is written once at the end of the artifact.

use ahash::AHashMap;

use crate::binary::MAX_STRING_LEN;
use crate::{Error, Result};

/// Renames applied before interning, normalizing known dataset quirks.
pub const DEFAULT_RENAMES: &[(&str, &str)] = &[
    ("United States of America", "United States"),
    ("-", "Unknown"),
];

/// Ordered, deduplicated table of strings.
///
/// Indices are assigned in first-seen order and are only meaningful for the
/// table (and artifact) that produced them.
#[derive(Debug, Clone)]
pub struct StringTable {
    values: Vec<String>,
    index: AHashMap<String, u32>,
    renames: AHashMap<String, String>,
}

impl StringTable {
    /// Create an empty table with the [`DEFAULT_RENAMES`] applied.
    pub fn new() -> Self {
        let mut table = Self::without_renames();
        for (from, to) in DEFAULT_RENAMES {
            table.add_rename(from, to);
        }
        table
    }

    /// Create an empty table that stores values verbatim.
    pub fn without_renames() -> Self {
        Self {
            values: Vec::new(),
            index: AHashMap::new(),
            renames: AHashMap::new(),
        }
    }

    /// Register an additional rename.
    ///
    /// Renames are applied once; the replacement is not itself renamed.
    pub fn add_rename(&mut self, from: &str, to: &str) {
        self.renames.insert(from.to_string(), to.to_string());
    }

    /// Intern a value and return its index.
    ///
    /// Two values that rename to the same string get the same index.
    pub fn intern(&mut self, value: &str) -> Result<u32> {
        let value = self.renames.get(value).map(String::as_str).unwrap_or(value);

        if let Some(&index) = self.index.get(value) {
            return Ok(index);
        }

        if value.len() > MAX_STRING_LEN {
            return Err(Error::StringTooLong(value.len()));
        }
        let index =
            u32::try_from(self.values.len()).map_err(|_| Error::TooManyEntries("string"))?;

        self.values.push(value.to_string());
        self.index.insert(value.to_string(), index);
        Ok(index)
    }

    /// Look up the value stored at `index`.
    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.values.get(index as usize).map(String::as_str)
    }

    /// Number of unique values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in index order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Forget every value at index `len` or above.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.values.len() {
            return;
        }
        for value in self.values.drain(len..) {
            self.index.remove(&value);
        }
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
