use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const RESOURCES_CDN: &str = "https://resources.download.minecraft.net";

/// Asset index JSON: logical object names mapped to hashes and sizes.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// Object store path: `<assets>/objects/<hash[0:2]>/<hash>`.
    pub fn store_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir
            .join("objects")
            .join(&self.hash[..2])
            .join(&self.hash)
    }

    /// CDN URL: `<cdn>/<hash[0:2]>/<hash>`.
    pub fn remote_url(&self) -> String {
        format!("{}/{}/{}", RESOURCES_CDN, &self.hash[..2], self.hash)
    }
}
