//! Artifact writer.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

use super::format::*;
use crate::interner::StringTable;
use crate::{Error, Result};

/// Intermediate representation of the tables before serialization.
///
/// The string table is owned here and threaded through every parse step, so
/// separate builds never share interning state.
#[derive(Debug, Default)]
pub struct IntermediateTables {
    /// IPv4 ranges in input order
    pub v4: Vec<RangeV4>,
    /// IPv6 ranges in input order
    pub v6: Vec<RangeV6>,
    /// Interned country/region/city names
    pub strings: StringTable,
}

impl IntermediateTables {
    /// Create empty tables with the default renames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty tables around a preconfigured string table.
    pub fn with_strings(strings: StringTable) -> Self {
        Self {
            v4: Vec::new(),
            v6: Vec::new(),
            strings,
        }
    }

    /// Current table sizes, for [`IntermediateTables::rollback`].
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            v4: self.v4.len(),
            v6: self.v6.len(),
            strings: self.strings.len(),
        }
    }

    /// Drop everything added since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.v4.truncate(checkpoint.v4);
        self.v6.truncate(checkpoint.v6);
        self.strings.truncate(checkpoint.strings);
    }

    /// Header describing these tables.
    pub fn header(&self) -> Result<ArtifactHeader> {
        Ok(ArtifactHeader {
            v4_count: count(self.v4.len(), "IPv4")?,
            v6_count: count(self.v6.len(), "IPv6")?,
            string_count: count(self.strings.len(), "string")?,
        })
    }
}

/// Table sizes at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    v4: usize,
    v6: usize,
    strings: usize,
}

fn count(len: usize, table: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooManyEntries(table))
}

/// Gzip-compressing artifact writer.
#[derive(Debug)]
pub struct ArtifactWriter {
    level: Compression,
}

impl ArtifactWriter {
    /// Create a new writer with the default compression level.
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Create a writer with a specific compression level.
    pub fn with_level(level: Compression) -> Self {
        Self { level }
    }

    /// Stream the tables into `sink` and return the sink once the gzip
    /// trailer has been written.
    pub fn write<W: Write>(&self, tables: &IntermediateTables, sink: W) -> Result<W> {
        let header = tables.header()?;
        let mut encoder = GzEncoder::new(sink, self.level);

        encoder.write_all(&header.encode())?;

        for record in &tables.v4 {
            encoder.write_all(&record.encode())?;
        }

        for record in &tables.v6 {
            encoder.write_all(&record.encode())?;
        }

        for value in tables.strings.values() {
            let len = u8::try_from(value.len()).map_err(|_| Error::StringTooLong(value.len()))?;
            encoder.write_all(&[len])?;
            encoder.write_all(value.as_bytes())?;
        }

        Ok(encoder.finish()?)
    }

    /// Write the tables into an in-memory buffer.
    pub fn to_vec(&self, tables: &IntermediateTables) -> Result<Vec<u8>> {
        self.write(tables, Vec::with_capacity(1024 * 1024))
    }
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new()
    }
}
