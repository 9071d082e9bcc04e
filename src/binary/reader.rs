//! Artifact reader and the loaded, immutable lookup tables.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use super::format::*;
use crate::{AddressFamily, Error, Result};

/// Upper bound on up-front allocation, so a corrupt header cannot request
/// gigabytes before the first short read is detected.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Streaming decoder for a gzip-compressed artifact.
pub struct ArtifactReader<R: Read> {
    inner: BufReader<GzDecoder<R>>,
}

impl<R: Read> ArtifactReader<R> {
    /// Wrap a compressed artifact source.
    pub fn new(source: R) -> Self {
        Self {
            inner: BufReader::with_capacity(1 << 20, GzDecoder::new(source)),
        }
    }

    /// Decode and validate all three tables.
    pub fn read_tables(mut self) -> Result<GeoTables> {
        let header = ArtifactHeader::decode(&self.read_array("header")?);

        let mut v4 = Vec::with_capacity((header.v4_count as usize).min(PREALLOC_LIMIT));
        for _ in 0..header.v4_count {
            v4.push(RangeV4::decode(&self.read_array("IPv4 records")?));
        }

        let mut v6 = Vec::with_capacity((header.v6_count as usize).min(PREALLOC_LIMIT));
        for _ in 0..header.v6_count {
            v6.push(RangeV6::decode(&self.read_array("IPv6 records")?));
        }

        let mut strings = Vec::with_capacity((header.string_count as usize).min(PREALLOC_LIMIT));
        for index in 0..header.string_count as usize {
            let [len] = self.read_array::<1>("string table")?;
            let mut raw = vec![0u8; len as usize];
            self.read_exact(&mut raw, "string table")?;
            let value = String::from_utf8(raw).map_err(|_| Error::InvalidUtf8 { index })?;
            strings.push(value);
        }

        self.expect_end()?;

        let tables = GeoTables { v4, v6, strings };
        tables.validate()?;
        Ok(tables)
    }

    fn read_array<const N: usize>(&mut self, section: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf, section)?;
        Ok(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8], section: &'static str) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated { section },
            _ => Error::Io(e),
        })
    }

    fn expect_end(&mut self) -> Result<()> {
        let mut probe = [0u8; 1];
        match self.inner.read(&mut probe)? {
            0 => Ok(()),
            _ => Err(Error::TrailingData),
        }
    }
}

/// Loaded lookup tables.
///
/// Built once by the loader and never mutated afterwards; share it behind an
/// `Arc` for concurrent readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoTables {
    v4: Vec<RangeV4>,
    v6: Vec<RangeV6>,
    strings: Vec<String>,
}

impl GeoTables {
    /// Load an artifact file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        log::debug!("Loading artifact {:?}", path);
        Self::from_reader(file)
    }

    /// Load an artifact already held in memory, e.g. via `include_bytes!`.
    pub fn from_gz_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(data)
    }

    /// Load an artifact from any compressed byte source.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let started = Instant::now();
        let tables = ArtifactReader::new(source).read_tables()?;

        log::info!(
            "Parsed {} IPv4 ranges, {} IPv6 ranges and {} strings",
            tables.v4.len(),
            tables.v6.len(),
            tables.strings.len()
        );
        log::info!("Geolocation tables ready in {:?}", started.elapsed());

        Ok(tables)
    }

    /// Assemble tables directly, applying the same checks as the loader.
    pub fn from_parts(v4: Vec<RangeV4>, v6: Vec<RangeV6>, strings: Vec<String>) -> Result<Self> {
        for (len, table) in [(v4.len(), "IPv4"), (v6.len(), "IPv6"), (strings.len(), "string")] {
            if len > u32::MAX as usize {
                return Err(Error::TooManyEntries(table));
            }
        }
        let tables = Self { v4, v6, strings };
        tables.validate()?;
        Ok(tables)
    }

    /// IPv4 ranges in ascending order.
    pub fn v4(&self) -> &[RangeV4] {
        &self.v4
    }

    /// IPv6 ranges in ascending order.
    pub fn v6(&self) -> &[RangeV6] {
        &self.v6
    }

    /// String table in index order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Look up a string by index.
    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Header describing these tables.
    pub fn header(&self) -> ArtifactHeader {
        // Both constructors bound every count to u32.
        ArtifactHeader {
            v4_count: self.v4.len() as u32,
            v6_count: self.v6.len() as u32,
            string_count: self.strings.len() as u32,
        }
    }

    fn validate(&self) -> Result<()> {
        check_table(&self.v4, AddressFamily::V4, self.strings.len())?;
        check_table(&self.v6, AddressFamily::V6, self.strings.len())
    }
}

/// Every index must resolve and starts must be strictly ascending.
fn check_table<T: RangeRecord>(
    records: &[T],
    family: AddressFamily,
    string_count: usize,
) -> Result<()> {
    for record in records {
        for index in record.text_indices() {
            if index as usize >= string_count {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: string_count,
                });
            }
        }
    }

    if let Some(position) = records
        .windows(2)
        .position(|pair| pair[0].range_start() >= pair[1].range_start())
    {
        return Err(Error::UnorderedRange {
            family,
            position: position as u64 + 1,
        });
    }

    Ok(())
}
