//! ipgeo - IP address to location lookup.
//!
//! Compiles a vendor IP-range CSV dataset into a compact gzip artifact and
//! answers "which country, region, city and UTC offset does this address
//! belong to" with a binary search over the loaded ranges.
//!
//! # Features
//!
//! - **Compact artifact**: fixed-width range records plus a deduplicated
//!   string table, gzip compressed
//! - **IPv4 and IPv6**: separate ascending tables, one floor search each
//! - **Validated loading**: truncation, dangling string references and
//!   out-of-order ranges are rejected before any query runs
//! - **Thread-safe queries**: a loaded [`Locator`] is immutable and cheap to
//!   clone
//! - **Vendor download**: fetch and extract the vendor's zipped CSV exports
//!
//! # Quick Start
//!
//! ```ignore
//! use ipgeo::{AddressFamily, Compiler, Locator};
//! use std::fs::File;
//! use std::path::Path;
//!
//! // Offline: compile the vendor CSV
//! let mut compiler = Compiler::new();
//! compiler.add_csv(AddressFamily::V4, File::open("IP2LOCATION-LITE-DB11.CSV")?)?;
//! compiler.write_file(Path::new("DatabaseGeolocate.kani.gz"))?;
//!
//! // At startup: load once, then query from any thread
//! let locator = Locator::open(Path::new("DatabaseGeolocate.kani.gz"))?;
//! let record = locator.lookup_v4("8.8.8.8");
//! ```
//!
//! # Lookup Semantics
//!
//! Every range record covers the addresses from its start up to the next
//! record's start. A lookup returns the last record whose start is not above
//! the queried address; unparsable input is a miss rather than an error.

mod error;
mod family;
mod interner;
mod offset;

pub mod binary;
pub mod compiler;
pub mod converter;
pub mod locator;
pub mod metadata;
pub mod vendor;

// Re-export core types
pub use error::{Error, Result};
pub use family::AddressFamily;
pub use interner::{StringTable, DEFAULT_RENAMES};
pub use offset::{format_utc_offset, parse_utc_offset};

// Re-export the build and query entry points
pub use binary::{GeoTables, RangeV4, RangeV6};
pub use compiler::Compiler;
pub use locator::{floor_search, Location, Locator};
pub use metadata::ArtifactMetadata;
pub use vendor::{VendorClient, VendorConfig, VendorProduct};
