//! Sidecar metadata for compiled artifacts.
//!
//! Written next to the artifact as `<artifact>.meta` after a successful
//! compile, so callers can check freshness and integrity without decoding
//! the artifact itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::binary::ArtifactHeader;
use crate::error::{Error, Result};

/// Build information for a compiled artifact.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ArtifactMetadata {
    #[serde(with = "system_time_serde")]
    pub last_built: Option<SystemTime>,
    /// Lowercase hex SHA-256 of the compressed artifact
    pub sha256: Option<String>,
    pub ipv4_ranges: u32,
    pub ipv6_ranges: u32,
    pub strings: u32,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let duration = t.duration_since(UNIX_EPOCH).unwrap_or_default();
                Some(duration.as_secs()).serialize(serializer)
            }
            None => None::<u64>.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)))
    }
}

impl ArtifactMetadata {
    /// Metadata for an artifact built now.
    pub fn built_now(header: ArtifactHeader, sha256: String) -> Self {
        Self {
            last_built: Some(SystemTime::now()),
            sha256: Some(sha256),
            ipv4_ranges: header.v4_count,
            ipv6_ranges: header.v6_count,
            strings: header.string_count,
        }
    }

    /// Path of the sidecar for an artifact.
    pub fn sidecar_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_owned();
        name.push(".meta");
        PathBuf::from(name)
    }

    /// Load metadata from a file.
    ///
    /// Returns default metadata if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the sidecar belonging to an artifact.
    pub fn load_for(artifact: &Path) -> Result<Self> {
        Self::load(Self::sidecar_path(artifact))
    }

    /// Save metadata to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check if a rebuild is due based on the given interval.
    ///
    /// Returns `true` if no build time is recorded or the elapsed time
    /// since the last build reaches the interval.
    pub fn needs_update(&self, interval: Duration) -> bool {
        match self.last_built {
            None => true,
            Some(last) => {
                let elapsed = SystemTime::now().duration_since(last).unwrap_or(Duration::MAX);
                elapsed >= interval
            }
        }
    }

    /// Whether the recorded checksum matches `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.sha256
            .as_deref()
            .is_some_and(|recorded| recorded.eq_ignore_ascii_case(&checksum_hex(data)))
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn checksum_hex(data: &[u8]) -> String {
    hex_digest(Sha256::digest(data).as_slice())
}

fn hex_digest(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
