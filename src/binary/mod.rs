//! Compiled artifact format shared by the compiler and the loader.
//!
//! The artifact is a single gzip stream. Its uncompressed body is a fixed
//! header followed by three tightly packed sections:
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |     HEADER       |  12 bytes: v4_count, v6_count, string_count (u32 LE)
//! +------------------+
//! |   IPv4 RANGES    |  v4_count * 20 bytes
//! +------------------+
//! |   IPv6 RANGES    |  v6_count * 32 bytes
//! +------------------+
//! |   STRING TABLE   |  string_count * (1 byte length + bytes)
//! +------------------+
//! ```
//!
//! There is no magic or version field; the layout is the contract between
//! `ipgeo-gen` and the loader.

mod format;
mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

pub use format::*;
pub use reader::{ArtifactReader, GeoTables};
pub use writer::{ArtifactWriter, Checkpoint, IntermediateTables};
