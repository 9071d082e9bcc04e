//! Query engine over loaded tables.
//!
//! A [`Locator`] is only ever built from fully loaded [`GeoTables`], so a
//! query can never observe a half-initialized table. Clones share the same
//! tables and may be handed to any number of threads.
//!
//! # Example
//!
//! ```ignore
//! use ipgeo::Locator;
//!
//! let locator = Locator::open("DatabaseGeolocate.kani.gz".as_ref())?;
//! if let Some(location) = locator.locate("203.0.113.7") {
//!     println!("{} (UTC{})", location, location.utc_offset());
//! }
//! ```

use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::sync::Arc;

use crate::binary::{GeoTables, RangeRecord, RangeV4, RangeV6};
use crate::offset::format_utc_offset;
use crate::Result;

/// Text shown for an index the tables cannot resolve.
const UNKNOWN: &str = "Unknown";

/// Read-only IP range lookup.
#[derive(Debug, Clone)]
pub struct Locator {
    tables: Arc<GeoTables>,
}

impl Locator {
    /// Take ownership of loaded tables.
    pub fn new(tables: GeoTables) -> Self {
        Self::from_shared(Arc::new(tables))
    }

    /// Share tables already behind an `Arc`.
    pub fn from_shared(tables: Arc<GeoTables>) -> Self {
        Self { tables }
    }

    /// Load an artifact file and build a locator over it.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(GeoTables::open(path)?))
    }

    /// The underlying tables.
    pub fn tables(&self) -> &Arc<GeoTables> {
        &self.tables
    }

    /// Find the IPv4 range containing a dotted-decimal address.
    ///
    /// Unparsable input is a miss, not an error.
    pub fn lookup_v4(&self, address: &str) -> Option<RangeV4> {
        let addr: Ipv4Addr = address.parse().ok()?;
        self.lookup_ipv4(addr)
    }

    /// Find the IPv6 range containing an address in any standard text form.
    ///
    /// Dotted IPv4 text is searched as its IPv4-mapped form
    /// (`::ffff:a.b.c.d`).
    pub fn lookup_v6(&self, address: &str) -> Option<RangeV6> {
        let addr = match address.parse::<IpAddr>().ok()? {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        self.lookup_ipv6(addr)
    }

    /// Find the IPv4 range containing `addr`.
    pub fn lookup_ipv4(&self, addr: Ipv4Addr) -> Option<RangeV4> {
        floor_search(self.tables.v4(), &u32::from(addr)).copied()
    }

    /// Find the IPv6 range containing `addr`.
    pub fn lookup_ipv6(&self, addr: Ipv6Addr) -> Option<RangeV6> {
        floor_search(self.tables.v6(), &addr.octets()).copied()
    }

    /// Text for a string index taken from a record of these tables.
    pub fn resolve_text(&self, index: u32) -> &str {
        // Loading guarantees every record index resolves.
        self.tables.resolve(index).unwrap_or(UNKNOWN)
    }

    /// Resolve an address of either family to a location.
    pub fn locate(&self, address: &str) -> Option<Location<'_>> {
        let ip: IpAddr = address.parse().ok()?;
        self.locate_ip(ip)
    }

    /// Like [`Locator::lookup_v4`], resolved to a location.
    pub fn locate_v4(&self, address: &str) -> Option<Location<'_>> {
        self.lookup_v4(address).map(|r| self.location_of(&r))
    }

    /// Like [`Locator::lookup_v6`], resolved to a location.
    pub fn locate_v6(&self, address: &str) -> Option<Location<'_>> {
        self.lookup_v6(address).map(|r| self.location_of(&r))
    }

    /// Resolve a parsed address to a location.
    pub fn locate_ip(&self, ip: IpAddr) -> Option<Location<'_>> {
        match ip {
            IpAddr::V4(addr) => self.lookup_ipv4(addr).map(|r| self.location_of(&r)),
            IpAddr::V6(addr) => self.lookup_ipv6(addr).map(|r| self.location_of(&r)),
        }
    }

    /// Resolve the names of a record taken from these tables.
    pub fn location_of<T: RangeRecord>(&self, record: &T) -> Location<'_> {
        let [country, region, city] = record.text_indices();
        Location {
            country: self.resolve_text(country),
            region: self.resolve_text(region),
            city: self.resolve_text(city),
            timezone_offset: record.timezone_offset(),
        }
    }
}

/// Resolved location of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location<'a> {
    pub country: &'a str,
    pub region: &'a str,
    pub city: &'a str,
    /// Seconds east of UTC
    pub timezone_offset: i32,
}

impl Location<'_> {
    /// Offset as `+HH:MM`.
    pub fn utc_offset(&self) -> String {
        format_utc_offset(self.timezone_offset)
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.city, self.region, self.country)
    }
}

/// Last record whose start is `<= key`, or `None` when `key` precedes the
/// first record.
///
/// `records` must be strictly ascending by start.
pub fn floor_search<'a, T: RangeRecord>(records: &'a [T], key: &T::Key) -> Option<&'a T> {
    let after = records.partition_point(|record| record.range_start() <= *key);
    after.checked_sub(1).map(|index| &records[index])
}
