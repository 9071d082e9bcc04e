//! Artifact layout constants and fixed-width record codecs.
//!
//! Every multi-byte integer is little-endian except the IPv6 range start,
//! which is stored as its raw 16 big-endian bytes.

/// Header size in bytes (three u32 counts).
pub const HEADER_SIZE: usize = 12;

/// Encoded IPv4 record size in bytes.
pub const V4_RECORD_SIZE: usize = 20;

/// Encoded IPv6 record size in bytes.
pub const V6_RECORD_SIZE: usize = 32;

/// Longest string the one-byte length prefix can describe.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Artifact header (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtifactHeader {
    /// Number of IPv4 records
    pub v4_count: u32,
    /// Number of IPv6 records
    pub v6_count: u32,
    /// Number of strings
    pub string_count: u32,
}

impl ArtifactHeader {
    /// Encode as `v4_count | v6_count | string_count`.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.v4_count.to_le_bytes());
        out[4..8].copy_from_slice(&self.v6_count.to_le_bytes());
        out[8..12].copy_from_slice(&self.string_count.to_le_bytes());
        out
    }

    /// Decode from exactly [`HEADER_SIZE`] bytes.
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            v4_count: le_u32(bytes, 0),
            v6_count: le_u32(bytes, 4),
            string_count: le_u32(bytes, 8),
        }
    }
}

/// Common view over IPv4 and IPv6 range records.
pub trait RangeRecord {
    /// Ordered key the floor search compares against.
    type Key: Ord;

    /// Inclusive lower bound of the range.
    fn range_start(&self) -> Self::Key;

    /// Country, region and city string indices, in that order.
    fn text_indices(&self) -> [u32; 3];

    /// Seconds east of UTC.
    fn timezone_offset(&self) -> i32;
}

/// IPv4 range record (20 bytes encoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeV4 {
    /// First address of the range
    pub range_start: u32,
    /// Country name index
    pub country_index: u32,
    /// Region name index
    pub region_index: u32,
    /// City name index
    pub city_index: u32,
    /// Seconds east of UTC
    pub timezone_offset: i32,
}

impl RangeV4 {
    pub fn encode(&self) -> [u8; V4_RECORD_SIZE] {
        let mut out = [0u8; V4_RECORD_SIZE];
        out[0..4].copy_from_slice(&self.range_start.to_le_bytes());
        out[4..8].copy_from_slice(&self.country_index.to_le_bytes());
        out[8..12].copy_from_slice(&self.region_index.to_le_bytes());
        out[12..16].copy_from_slice(&self.city_index.to_le_bytes());
        out[16..20].copy_from_slice(&self.timezone_offset.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; V4_RECORD_SIZE]) -> Self {
        Self {
            range_start: le_u32(bytes, 0),
            country_index: le_u32(bytes, 4),
            region_index: le_u32(bytes, 8),
            city_index: le_u32(bytes, 12),
            timezone_offset: le_u32(bytes, 16) as i32,
        }
    }
}

impl RangeRecord for RangeV4 {
    type Key = u32;

    fn range_start(&self) -> u32 {
        self.range_start
    }

    fn text_indices(&self) -> [u32; 3] {
        [self.country_index, self.region_index, self.city_index]
    }

    fn timezone_offset(&self) -> i32 {
        self.timezone_offset
    }
}

/// IPv6 range record (32 bytes encoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeV6 {
    /// First address of the range (big-endian)
    pub range_start: [u8; 16],
    /// Country name index
    pub country_index: u32,
    /// Region name index
    pub region_index: u32,
    /// City name index
    pub city_index: u32,
    /// Seconds east of UTC
    pub timezone_offset: i32,
}

impl RangeV6 {
    pub fn encode(&self) -> [u8; V6_RECORD_SIZE] {
        let mut out = [0u8; V6_RECORD_SIZE];
        out[0..16].copy_from_slice(&self.range_start);
        out[16..20].copy_from_slice(&self.country_index.to_le_bytes());
        out[20..24].copy_from_slice(&self.region_index.to_le_bytes());
        out[24..28].copy_from_slice(&self.city_index.to_le_bytes());
        out[28..32].copy_from_slice(&self.timezone_offset.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; V6_RECORD_SIZE]) -> Self {
        let mut range_start = [0u8; 16];
        range_start.copy_from_slice(&bytes[0..16]);
        Self {
            range_start,
            country_index: le_u32(bytes, 16),
            region_index: le_u32(bytes, 20),
            city_index: le_u32(bytes, 24),
            timezone_offset: le_u32(bytes, 28) as i32,
        }
    }
}

impl RangeRecord for RangeV6 {
    // Lexicographic order on big-endian bytes is numeric u128 order.
    type Key = [u8; 16];

    fn range_start(&self) -> [u8; 16] {
        self.range_start
    }

    fn text_indices(&self) -> [u32; 3] {
        [self.country_index, self.region_index, self.city_index]
    }

    fn timezone_offset(&self) -> i32 {
        self.timezone_offset
    }
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
