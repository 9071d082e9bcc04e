//! IP2Location-style CSV parser.
//!
//! Rows look like
//! `"16777216","16777471","AU","Australia","Queensland","Brisbane","-27.46","153.02","4000","+10:00"`.
//! Only the range start, the three names and the UTC offset are kept.
//!
//! Rows must arrive in ascending range order per address family; the parser
//! checks this but never sorts.

use std::io::Read;

use crate::binary::{IntermediateTables, RangeV4, RangeV6};
use crate::offset::parse_utc_offset;
use crate::{AddressFamily, Error, Result};

/// Minimum number of fields per row.
pub const REQUIRED_FIELDS: usize = 10;

const FIELD_RANGE_START: usize = 0;
const FIELD_COUNTRY: usize = 3;
const FIELD_REGION: usize = 4;
const FIELD_CITY: usize = 5;
const FIELD_UTC_OFFSET: usize = 9;

/// Vendor CSV parser.
pub struct CsvParser;

impl CsvParser {
    /// Parse every row of `reader` into `tables` and return the row count.
    ///
    /// The first malformed row aborts the parse.
    pub fn parse_into<R: Read>(
        tables: &mut IntermediateTables,
        family: AddressFamily,
        reader: R,
    ) -> Result<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = 0;
        let mut record = csv::StringRecord::new();

        while csv_reader.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(rows as u64 + 1);
            Self::parse_row(tables, family, &record, line)?;
            rows += 1;
        }

        log::debug!("Parsed {} {} rows", rows, family);
        Ok(rows)
    }

    fn parse_row(
        tables: &mut IntermediateTables,
        family: AddressFamily,
        record: &csv::StringRecord,
        line: u64,
    ) -> Result<()> {
        if record.len() < REQUIRED_FIELDS {
            return Err(Error::malformed(
                line,
                format!(
                    "expected at least {} fields, found {}",
                    REQUIRED_FIELDS,
                    record.len()
                ),
            ));
        }

        let start = field(record, FIELD_RANGE_START);
        let offset = field(record, FIELD_UTC_OFFSET);
        let timezone_offset = parse_utc_offset(offset)
            .ok_or_else(|| Error::malformed(line, format!("invalid UTC offset {:?}", offset)))?;

        let strings = &mut tables.strings;
        let country_index = strings.intern(field(record, FIELD_COUNTRY))?;
        let region_index = strings.intern(field(record, FIELD_REGION))?;
        let city_index = strings.intern(field(record, FIELD_CITY))?;

        match family {
            AddressFamily::V4 => {
                let range_start: u32 = start
                    .parse()
                    .map_err(|e| Error::malformed(line, format!("range start {:?}: {}", start, e)))?;
                if let Some(prev) = tables.v4.last() {
                    if range_start <= prev.range_start {
                        return Err(Error::UnorderedRange {
                            family,
                            position: line,
                        });
                    }
                }
                tables.v4.push(RangeV4 {
                    range_start,
                    country_index,
                    region_index,
                    city_index,
                    timezone_offset,
                });
            }
            AddressFamily::V6 => {
                let value: u128 = start
                    .parse()
                    .map_err(|e| Error::malformed(line, format!("range start {:?}: {}", start, e)))?;
                let range_start = value.to_be_bytes();
                if let Some(prev) = tables.v6.last() {
                    if range_start <= prev.range_start {
                        return Err(Error::UnorderedRange {
                            family,
                            position: line,
                        });
                    }
                }
                tables.v6.push(RangeV6 {
                    range_start,
                    country_index,
                    region_index,
                    city_index,
                    timezone_offset,
                });
            }
        }

        Ok(())
    }
}

/// Field text with any stray wrapping quotes removed.
fn field(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default().trim().trim_matches('"')
}
