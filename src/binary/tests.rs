//! Round-trip and corruption tests for the artifact format.
//!
//! Each corruption case must fail the load outright; a partially loaded
//! table is never returned.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use super::format::*;
use super::reader::GeoTables;
use super::writer::{ArtifactWriter, IntermediateTables};
use crate::{AddressFamily, Error};

/// Helper to load tables from freshly written ones
fn write_and_read(tables: &IntermediateTables) -> GeoTables {
    let data = ArtifactWriter::new()
        .to_vec(tables)
        .expect("Failed to write artifact");
    GeoTables::from_gz_bytes(&data).expect("Failed to read artifact")
}

/// Gzip an arbitrary body, bypassing the writer's checks.
fn gzip(body: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).unwrap();
    encoder.finish().unwrap()
}

fn body_of(tables: &IntermediateTables) -> Vec<u8> {
    let data = ArtifactWriter::new().to_vec(tables).unwrap();
    let mut body = Vec::new();
    GzDecoder::new(&data[..]).read_to_end(&mut body).unwrap();
    body
}

fn sample_tables() -> IntermediateTables {
    let mut tables = IntermediateTables::new();
    let us = tables.strings.intern("United States of America").unwrap();
    let ca = tables.strings.intern("California").unwrap();
    let la = tables.strings.intern("Los Angeles").unwrap();
    let jp = tables.strings.intern("Japan").unwrap();
    let tk = tables.strings.intern("Tokyo").unwrap();
    let unknown = tables.strings.intern("-").unwrap();

    tables.v4.push(RangeV4 {
        range_start: 0,
        country_index: unknown,
        region_index: unknown,
        city_index: unknown,
        timezone_offset: 0,
    });
    tables.v4.push(RangeV4 {
        range_start: 0x0100_0000,
        country_index: us,
        region_index: ca,
        city_index: la,
        timezone_offset: -28800,
    });
    tables.v4.push(RangeV4 {
        range_start: 0x0101_0000,
        country_index: jp,
        region_index: tk,
        city_index: tk,
        timezone_offset: 32400,
    });

    tables.v6.push(RangeV6 {
        range_start: [0; 16],
        country_index: unknown,
        region_index: unknown,
        city_index: unknown,
        timezone_offset: 0,
    });
    tables.v6.push(RangeV6 {
        range_start: 0x2400_4000_u128.wrapping_shl(96).to_be_bytes(),
        country_index: jp,
        region_index: tk,
        city_index: tk,
        timezone_offset: 32400,
    });

    tables
}

// ============================================================================
// Round-trip Tests
// ============================================================================

#[test]
fn test_empty_tables_round_trip() {
    let loaded = write_and_read(&IntermediateTables::new());

    assert!(loaded.v4().is_empty());
    assert!(loaded.v6().is_empty());
    assert!(loaded.strings().is_empty());
    assert_eq!(loaded.header(), ArtifactHeader::default());
}

#[test]
fn test_records_and_strings_round_trip() {
    let tables = sample_tables();
    let loaded = write_and_read(&tables);

    assert_eq!(loaded.v4(), tables.v4.as_slice());
    assert_eq!(loaded.v6(), tables.v6.as_slice());
    assert_eq!(loaded.strings(), tables.strings.values());
    assert_eq!(loaded.header(), tables.header().unwrap());
}

#[test]
fn test_renamed_strings_survive_round_trip() {
    let loaded = write_and_read(&sample_tables());

    assert_eq!(loaded.resolve(0), Some("United States"));
    assert_eq!(loaded.resolve(5), Some("Unknown"));
    assert_eq!(loaded.resolve(6), None);
}

#[test]
fn test_non_ascii_strings_round_trip() {
    let mut tables = IntermediateTables::new();
    let idx = tables.strings.intern("São Paulo").unwrap();
    let long = tables.strings.intern(&"é".repeat(127)).unwrap();
    tables.v4.push(RangeV4 {
        range_start: 0,
        country_index: idx,
        region_index: idx,
        city_index: long,
        timezone_offset: -10800,
    });

    let loaded = write_and_read(&tables);
    assert_eq!(loaded.resolve(idx), Some("São Paulo"));
    assert_eq!(loaded.resolve(long).map(str::len), Some(254));
}

#[test]
fn test_ipv6_only_round_trip() {
    let mut tables = IntermediateTables::new();
    let idx = tables.strings.intern("Somewhere").unwrap();
    tables.v6.push(RangeV6 {
        range_start: u128::MAX.to_be_bytes(),
        country_index: idx,
        region_index: idx,
        city_index: idx,
        timezone_offset: i32::MIN,
    });

    let loaded = write_and_read(&tables);
    assert!(loaded.v4().is_empty());
    assert_eq!(loaded.v6(), tables.v6.as_slice());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geo.kani.gz");
    let file = std::fs::File::create(&path).unwrap();
    ArtifactWriter::new().write(&sample_tables(), file).unwrap();

    let loaded = GeoTables::open(&path).unwrap();
    assert_eq!(loaded.v4().len(), 3);
    assert_eq!(loaded.v6().len(), 2);
}

// ============================================================================
// Corruption Tests
// ============================================================================

#[test]
fn test_not_gzip_is_rejected() {
    let result = GeoTables::from_gz_bytes(b"definitely not a gzip stream");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_empty_input_is_rejected() {
    assert!(GeoTables::from_gz_bytes(&[]).is_err());
}

#[test]
fn test_truncated_header() {
    let result = GeoTables::from_gz_bytes(&gzip(&[1, 0, 0, 0, 0, 0]));
    assert!(matches!(
        result,
        Err(Error::Truncated { section: "header" })
    ));
}

#[test]
fn test_truncated_v4_section() {
    let mut body = body_of(&sample_tables());
    body.truncate(HEADER_SIZE + V4_RECORD_SIZE + 3);

    let result = GeoTables::from_gz_bytes(&gzip(&body));
    assert!(matches!(
        result,
        Err(Error::Truncated {
            section: "IPv4 records"
        })
    ));
}

#[test]
fn test_truncated_string_table() {
    let mut body = body_of(&sample_tables());
    body.pop();

    let result = GeoTables::from_gz_bytes(&gzip(&body));
    assert!(matches!(
        result,
        Err(Error::Truncated {
            section: "string table"
        })
    ));
}

#[test]
fn test_inflated_counts_are_rejected() {
    let mut body = body_of(&sample_tables());
    // Claim one more string than is present.
    let declared = u32::from_le_bytes([body[8], body[9], body[10], body[11]]);
    body[8..12].copy_from_slice(&(declared + 1).to_le_bytes());

    assert!(matches!(
        GeoTables::from_gz_bytes(&gzip(&body)),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn test_trailing_data_is_rejected() {
    let mut body = body_of(&sample_tables());
    body.extend_from_slice(&[3, b'x', b'y', b'z']);

    assert!(matches!(
        GeoTables::from_gz_bytes(&gzip(&body)),
        Err(Error::TrailingData)
    ));
}

#[test]
fn test_huge_declared_count_fails_without_allocating() {
    let header = ArtifactHeader {
        v4_count: u32::MAX,
        v6_count: 0,
        string_count: 0,
    };

    assert!(matches!(
        GeoTables::from_gz_bytes(&gzip(&header.encode())),
        Err(Error::Truncated {
            section: "IPv4 records"
        })
    ));
}

#[test]
fn test_dangling_string_index_is_rejected() {
    let mut tables = sample_tables();
    tables.v4[1].city_index = 99;

    let data = ArtifactWriter::new().to_vec(&tables).unwrap();
    assert!(matches!(
        GeoTables::from_gz_bytes(&data),
        Err(Error::IndexOutOfRange { index: 99, len: 6 })
    ));
}

#[test]
fn test_unordered_ranges_are_rejected() {
    let mut tables = sample_tables();
    tables.v4.swap(1, 2);

    let data = ArtifactWriter::new().to_vec(&tables).unwrap();
    assert!(matches!(
        GeoTables::from_gz_bytes(&data),
        Err(Error::UnorderedRange {
            family: AddressFamily::V4,
            position: 2
        })
    ));
}

#[test]
fn test_duplicate_ipv6_starts_are_rejected() {
    let mut tables = sample_tables();
    tables.v6[1].range_start = tables.v6[0].range_start;

    let data = ArtifactWriter::new().to_vec(&tables).unwrap();
    assert!(matches!(
        GeoTables::from_gz_bytes(&data),
        Err(Error::UnorderedRange {
            family: AddressFamily::V6,
            position: 1
        })
    ));
}

#[test]
fn test_invalid_utf8_string_is_rejected() {
    let mut body = ArtifactHeader {
        v4_count: 0,
        v6_count: 0,
        string_count: 2,
    }
    .encode()
    .to_vec();
    body.extend_from_slice(&[2, b'o', b'k']);
    body.extend_from_slice(&[2, 0xff, 0xfe]);

    assert!(matches!(
        GeoTables::from_gz_bytes(&gzip(&body)),
        Err(Error::InvalidUtf8 { index: 1 })
    ));
}

#[test]
fn test_from_parts_applies_loader_checks() {
    let record = RangeV4 {
        range_start: 5,
        ..Default::default()
    };

    assert!(GeoTables::from_parts(vec![record], vec![], vec!["A".to_string()]).is_ok());
    assert!(matches!(
        GeoTables::from_parts(vec![record], vec![], vec![]),
        Err(Error::IndexOutOfRange { index: 0, len: 0 })
    ));
    assert!(matches!(
        GeoTables::from_parts(vec![record, record], vec![], vec!["A".to_string()]),
        Err(Error::UnorderedRange { .. })
    ));
}
