//! Source dataset converters.

mod ip2location;

pub use ip2location::{CsvParser, REQUIRED_FIELDS};
