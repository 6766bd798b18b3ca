// ─── Version List Manifest ───
// Wire model of piston-meta's version_manifest_v2. The index processor owns
// how the document is obtained (cache vs remote); this stays a pure shape.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Every version Mojang publishes, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// One published version: where its JSON lives and what it should hash to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw).map_err(CoreError::from)
    }

    /// Entry for a version id, or the listed-versions error that callers
    /// treat as fatal.
    pub fn entry(&self, version_id: &str) -> CoreResult<&VersionEntry> {
        self.versions
            .iter()
            .find(|entry| entry.id == version_id)
            .ok_or_else(|| CoreError::VersionNotFound(version_id.to_string()))
    }
}
