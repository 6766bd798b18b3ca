// ─── Mojang Index Processor ───
// Validates the vendor-side file set for one game version: asset objects,
// libraries, the client jar and the log configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{IndexProcessor, StageFn};
use crate::asset::{Asset, HashAlgorithm};
use crate::assets::AssetIndex;
use crate::error::{CoreError, CoreResult};
use crate::paths::{ensure_dir, write_atomic, LauncherPaths};
use crate::util::hash::validate_local_file;
use crate::version::{VersionJson, VersionManifest};

const STAGES: u32 = 4;

pub struct MojangIndexProcessor {
    client: Client,
    paths: LauncherPaths,
    version_id: String,
    version_json: Option<VersionJson>,
    asset_index: Option<AssetIndex>,
}

impl MojangIndexProcessor {
    pub fn new(client: Client, paths: LauncherPaths, version_id: impl Into<String>) -> Self {
        Self {
            client,
            paths,
            version_id: version_id.into(),
            version_json: None,
            asset_index: None,
        }
    }

    // ── Document loading ────────────────────────────────

    /// Cached-with-remote-fallback: a local copy whose sha1 matches the
    /// known hash wins; otherwise the remote copy is fetched, persisted and
    /// parsed. With no known hash the remote copy is preferred and the
    /// local one only covers an unreachable endpoint.
    async fn load_document(
        &self,
        local: &Path,
        url: &str,
        sha1: Option<&str>,
    ) -> CoreResult<String> {
        if let Some(expected) = sha1 {
            if validate_local_file(local, HashAlgorithm::Sha1, expected).await? {
                debug!("Using cached {:?}", local);
                return tokio::fs::read_to_string(local)
                    .await
                    .map_err(|e| CoreError::io(local, e));
            }
        }

        match self.fetch_text(url).await {
            Ok(raw) => {
                self.persist(local, raw.as_bytes()).await?;
                Ok(raw)
            }
            Err(e) if sha1.is_none() && local.exists() => {
                warn!("Remote {} unreachable, using stale cache: {}", url, e);
                tokio::fs::read_to_string(local)
                    .await
                    .map_err(|e| CoreError::io(local, e))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_text(&self, url: &str) -> CoreResult<String> {
        let raw = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(raw)
    }

    async fn persist(&self, path: &Path, bytes: &[u8]) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }
        write_atomic(path, bytes).await
    }

    fn manifest_cache_path(&self) -> PathBuf {
        self.paths.versions_dir().join("version_manifest_v2.json")
    }

    // ── Validation stages ───────────────────────────────

    async fn validate_assets(&self) -> CoreResult<Vec<Asset>> {
        let index = self
            .asset_index
            .as_ref()
            .ok_or(CoreError::ValidationPending)?;
        let assets_dir = self.paths.assets_dir();

        let mut invalid = Vec::new();
        for (logical, object) in &index.objects {
            let path = object.store_path(&assets_dir);
            if !validate_local_file(&path, HashAlgorithm::Sha1, &object.hash).await? {
                invalid.push(Asset::new(
                    logical.clone(),
                    object.remote_url(),
                    object.size,
                    object.hash.clone(),
                    HashAlgorithm::Sha1,
                    path,
                ));
            }
        }
        Ok(invalid)
    }

    async fn validate_libraries(&self) -> CoreResult<Vec<Asset>> {
        let version = self
            .version_json
            .as_ref()
            .ok_or(CoreError::ValidationPending)?;
        let libraries_dir = self.paths.libraries_dir();

        let mut invalid = Vec::new();
        for library in &version.libraries {
            if !library.is_allowed_for_current_os() {
                debug!("Skipping library (OS rule): {}", library.name);
                continue;
            }
            let Some(artifact) = library.effective_artifact() else {
                continue;
            };
            let path = libraries_dir.join(&artifact.path);
            if !validate_local_file(&path, HashAlgorithm::Sha1, &artifact.sha1).await? {
                invalid.push(Asset::new(
                    library.name.clone(),
                    artifact.url.clone(),
                    artifact.size,
                    artifact.sha1.clone(),
                    HashAlgorithm::Sha1,
                    path,
                ));
            }
        }
        Ok(invalid)
    }

    async fn validate_client(&self) -> CoreResult<Vec<Asset>> {
        let version = self
            .version_json
            .as_ref()
            .ok_or(CoreError::ValidationPending)?;
        let Some(client) = version.downloads.as_ref().and_then(|d| d.client.as_ref()) else {
            return Ok(Vec::new());
        };

        let path = self.paths.version_jar(&self.version_id);
        if validate_local_file(&path, HashAlgorithm::Sha1, &client.sha1).await? {
            return Ok(Vec::new());
        }
        Ok(vec![Asset::new(
            format!("{}.jar", self.version_id),
            client.url.clone(),
            client.size,
            client.sha1.clone(),
            HashAlgorithm::Sha1,
            path,
        )])
    }

    async fn validate_log_config(&self) -> CoreResult<Vec<Asset>> {
        let version = self
            .version_json
            .as_ref()
            .ok_or(CoreError::ValidationPending)?;
        let Some(file) = version
            .logging
            .as_ref()
            .and_then(|l| l.client.as_ref())
            .map(|c| &c.file)
        else {
            return Ok(Vec::new());
        };

        let path = self.paths.assets_dir().join("log_configs").join(&file.id);
        if validate_local_file(&path, HashAlgorithm::Sha1, &file.sha1).await? {
            return Ok(Vec::new());
        }
        Ok(vec![Asset::new(
            file.id.clone(),
            file.url.clone(),
            file.size,
            file.sha1.clone(),
            HashAlgorithm::Sha1,
            path,
        )])
    }
}

#[async_trait]
impl IndexProcessor for MojangIndexProcessor {
    async fn init(&mut self) -> CoreResult<()> {
        let version_json_path = self.paths.version_json(&self.version_id);

        // 1. Version list manifest. An unreachable manifest is tolerable
        //    only while a local per-version JSON still exists.
        let manifest = match self
            .load_document(
                &self.manifest_cache_path(),
                crate::version::VERSION_MANIFEST_URL,
                None,
            )
            .await
        {
            Ok(raw) => Some(VersionManifest::parse(&raw)?),
            Err(e) => {
                if version_json_path.exists() {
                    warn!("Version manifest unavailable ({}), running from cache", e);
                    None
                } else {
                    return Err(e);
                }
            }
        };

        // 2. Per-version JSON, validated against the manifest entry hash.
        let raw_version = match &manifest {
            Some(manifest) => {
                let entry = manifest.entry(&self.version_id)?;
                self.load_document(&version_json_path, &entry.url, entry.sha1.as_deref())
                    .await?
            }
            None => tokio::fs::read_to_string(&version_json_path)
                .await
                .map_err(|e| CoreError::io(&version_json_path, e))?,
        };
        let version_json: VersionJson = serde_json::from_str(&raw_version)?;

        // 3. Asset index referenced by the version JSON.
        if let Some(info) = &version_json.asset_index {
            let index_path = self
                .paths
                .assets_dir()
                .join("indexes")
                .join(format!("{}.json", info.id));
            let raw_index = self
                .load_document(&index_path, &info.url, info.sha1.as_deref())
                .await?;
            self.asset_index = Some(serde_json::from_str(&raw_index)?);
        }

        info!("Mojang index ready for {}", self.version_id);
        self.version_json = Some(version_json);
        Ok(())
    }

    fn total_stages(&self) -> u32 {
        STAGES
    }

    async fn validate(&mut self, on_stage: &StageFn<'_>) -> CoreResult<HashMap<String, Vec<Asset>>> {
        let mut invalid = HashMap::new();

        invalid.insert("assets".to_string(), self.validate_assets().await?);
        on_stage();
        invalid.insert("libraries".to_string(), self.validate_libraries().await?);
        on_stage();
        invalid.insert("client".to_string(), self.validate_client().await?);
        on_stage();
        invalid.insert("misc".to_string(), self.validate_log_config().await?);
        on_stage();

        Ok(invalid)
    }

    async fn post_download(&mut self) -> CoreResult<()> {
        // Vendor documents were already persisted during init
        Ok(())
    }
}
