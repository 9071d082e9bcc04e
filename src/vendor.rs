//! Vendor dataset download.
//!
//! The vendor serves each product as a zip archive containing a single CSV.
//! Its download endpoint answers `200 OK` with a short text body when the
//! token or product is wrong, so a body below [`MIN_RESPONSE_BYTES`] is
//! treated as a failure regardless of status.

use std::io::{Cursor, Read};
use std::time::Duration;

use crate::{AddressFamily, Error, Result};

/// Default vendor download endpoint.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://www.ip2location.com/download/";

/// Environment variable holding the download token.
pub const TOKEN_ENV_VAR: &str = "API_KEY_IP2LOCATION";

/// Smallest body accepted as an archive.
pub const MIN_RESPONSE_BYTES: usize = 1024;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A downloadable dataset product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProduct {
    /// Product code passed as the `file` query parameter
    pub code: String,
    /// Name of the CSV member inside the archive
    pub member: String,
    /// Address family of the rows
    pub family: AddressFamily,
}

impl VendorProduct {
    /// DB11 LITE, IPv4 ranges.
    pub fn db11_lite_v4() -> Self {
        Self {
            code: "DB11LITECSV".to_string(),
            member: "IP2LOCATION-LITE-DB11.CSV".to_string(),
            family: AddressFamily::V4,
        }
    }

    /// DB11 LITE, IPv6 ranges.
    pub fn db11_lite_v6() -> Self {
        Self {
            code: "DB11LITECSVIPV6".to_string(),
            member: "IP2LOCATION-LITE-DB11.IPV6.CSV".to_string(),
            family: AddressFamily::V6,
        }
    }
}

/// Vendor download configuration.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    /// Download endpoint
    pub base_url: String,
    /// Download token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Smallest acceptable response body
    pub min_response_bytes: usize,
    /// Products to fetch, in compile order
    pub products: Vec<VendorProduct>,
}

impl VendorConfig {
    /// Configuration for the IPv4 DB11 LITE product with the given token.
    pub fn with_token(token: &str) -> Self {
        Self {
            base_url: DEFAULT_DOWNLOAD_URL.to_string(),
            token: token.to_string(),
            timeout: DEFAULT_TIMEOUT,
            min_response_bytes: MIN_RESPONSE_BYTES,
            products: vec![VendorProduct::db11_lite_v4()],
        }
    }

    /// Read the token from [`TOKEN_ENV_VAR`].
    pub fn from_env() -> Result<Self> {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::with_token(token.trim())),
            _ => Err(Error::MissingToken(TOKEN_ENV_VAR)),
        }
    }

    /// Also fetch the IPv6 product.
    pub fn include_ipv6(mut self) -> Self {
        if !self.products.iter().any(|p| p.family == AddressFamily::V6) {
            self.products.push(VendorProduct::db11_lite_v6());
        }
        self
    }

    /// Override the download endpoint.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

/// Blocking vendor client.
pub struct VendorClient {
    config: VendorConfig,
    client: reqwest::blocking::Client,
}

impl VendorClient {
    /// Build a client for the given configuration.
    pub fn new(config: VendorConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(Error::MissingToken(TOKEN_ENV_VAR));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &VendorConfig {
        &self.config
    }

    /// Download a product archive. No retries.
    pub fn fetch_archive(&self, product: &VendorProduct) -> Result<Vec<u8>> {
        log::info!("Downloading {} archive ({})", product.family, product.code);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("token", self.config.token.as_str()), ("file", product.code.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        let body = response.bytes()?;
        check_response_size(body.len(), self.config.min_response_bytes)?;

        log::info!("Downloaded {} archive: {} bytes", product.family, body.len());
        Ok(body.to_vec())
    }

    /// Download a product and return its CSV member.
    pub fn fetch_csv(&self, product: &VendorProduct) -> Result<Vec<u8>> {
        let archive = self.fetch_archive(product)?;
        extract_member(&archive, &product.member)
    }
}

/// Reject bodies too small to be a real archive.
pub fn check_response_size(size: usize, minimum: usize) -> Result<()> {
    if size < minimum {
        return Err(Error::ResponseTooSmall { size, minimum });
    }
    Ok(())
}

/// Extract a named member from a zip archive.
pub fn extract_member(archive: &[u8], member: &str) -> Result<Vec<u8>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut file = zip.by_name(member)?;

    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;

    log::debug!("Extracted {} ({} bytes)", member, data.len());
    Ok(data)
}
