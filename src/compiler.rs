//! Offline compiler: vendor CSV in, gzip artifact out.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::binary::{ArtifactWriter, IntermediateTables};
use crate::converter::CsvParser;
use crate::interner::StringTable;
use crate::metadata::{checksum_hex, ArtifactMetadata};
use crate::{AddressFamily, Result};

/// Accumulates parsed ranges and writes them as one artifact.
///
/// Each compiler owns its string table, so two compilers in the same
/// process never share interning state.
#[derive(Debug, Default)]
pub struct Compiler {
    tables: IntermediateTables,
    writer: ArtifactWriter,
}

impl Compiler {
    /// Create a compiler with the default renames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler around a preconfigured string table.
    pub fn with_string_table(strings: StringTable) -> Self {
        Self {
            tables: IntermediateTables::with_strings(strings),
            writer: ArtifactWriter::new(),
        }
    }

    /// Parse one CSV source into the tables. Returns the number of rows.
    ///
    /// A malformed row aborts the whole parse and discards every row and
    /// string that source added, so the tables hold only complete sources.
    pub fn add_csv<R: Read>(&mut self, family: AddressFamily, source: R) -> Result<usize> {
        let started = Instant::now();
        let checkpoint = self.tables.checkpoint();
        let rows = match CsvParser::parse_into(&mut self.tables, family, source) {
            Ok(rows) => rows,
            Err(e) => {
                self.tables.rollback(checkpoint);
                return Err(e);
            }
        };
        log::info!(
            "Parsed {} {} rows in {:?} ({} distinct strings)",
            rows,
            family,
            started.elapsed(),
            self.tables.strings.len()
        );
        Ok(rows)
    }

    /// Parse a CSV file.
    pub fn add_csv_file(&mut self, family: AddressFamily, path: &Path) -> Result<usize> {
        log::debug!("Reading {} source {:?}", family, path);
        self.add_csv(family, fs::File::open(path)?)
    }

    /// Tables accumulated so far.
    pub fn tables(&self) -> &IntermediateTables {
        &self.tables
    }

    /// Serialize the artifact into an arbitrary sink.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<W> {
        self.writer.write(&self.tables, sink)
    }

    /// Write the artifact to `path` atomically and record its sidecar.
    ///
    /// The artifact goes to a temporary file in the destination directory
    /// first, so an interrupted build leaves any previous artifact intact.
    pub fn write_file(&self, path: &Path) -> Result<ArtifactMetadata> {
        let started = Instant::now();
        let header = self.tables.header()?;
        let data = self.writer.to_vec(&self.tables)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&data)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        let meta = ArtifactMetadata::built_now(header, checksum_hex(&data));
        meta.save(ArtifactMetadata::sidecar_path(path))?;

        log::info!(
            "Wrote {:?}: {} IPv4 ranges, {} IPv6 ranges, {} strings, {} bytes in {:?}",
            path,
            header.v4_count,
            header.v6_count,
            header.string_count,
            data.len(),
            started.elapsed()
        );
        Ok(meta)
    }
}
