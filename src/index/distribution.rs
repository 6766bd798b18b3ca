// ─── Distribution Index Processor ───
// Validates the selected server's module tree against the publisher
// manifest and finalizes the mod-loader overlay after downloads.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{IndexProcessor, StageFn};
use crate::asset::{Asset, HashAlgorithm};
use crate::distribution::{Module, ModuleType, Server};
use crate::error::{CoreError, CoreResult};
use crate::paths::{ensure_dir, write_atomic, LauncherPaths};
use crate::util::archive::read_zip_entry;
use crate::util::hash::validate_local_file;
use crate::version::VersionJson;

/// Newest Forge that still ships the overlay only inside its installer.
const LEGACY_FORGE_CAP: [u32; 4] = [14, 23, 5, 2847];

pub struct DistributionIndexProcessor {
    paths: LauncherPaths,
    server: Server,
    validated: bool,
}

impl DistributionIndexProcessor {
    pub fn new(paths: LauncherPaths, server: Server) -> Self {
        Self {
            paths,
            server,
            validated: false,
        }
    }

    fn module_path(&self, module: &Module) -> CoreResult<PathBuf> {
        module.resolve_path(
            self.paths.common_dir(),
            self.paths.instance_dir(),
            &self.server.id,
        )
    }

    async fn validate_modules(&self) -> CoreResult<Vec<Asset>> {
        let mut invalid = Vec::new();
        for module in self.server.walk_modules() {
            let path = self.module_path(module)?;
            if validate_local_file(&path, HashAlgorithm::Md5, &module.artifact.md5).await? {
                continue;
            }
            debug!("Invalid module: {}", module.id);
            invalid.push(Asset::new(
                module.id.clone(),
                module.artifact.url.clone(),
                module.artifact.size,
                module.artifact.md5.clone(),
                HashAlgorithm::Md5,
                path,
            ));
        }
        Ok(invalid)
    }

    // ── Mod-loader overlay resolution ───────────────────

    /// Fabric always ships the overlay as an on-disk sub-module. Forge does
    /// from Minecraft 1.13 on, or past the legacy version cap; older Forge
    /// keeps it inside the installer archive.
    fn overlay_on_disk(&self, loader: &Module) -> CoreResult<bool> {
        if loader.module_type == ModuleType::Fabric {
            return Ok(true);
        }
        if minecraft_at_least(&self.server.minecraft_version, 1, 13) {
            return Ok(true);
        }
        Ok(forge_version_components(loader)? > LEGACY_FORGE_CAP)
    }

    async fn resolve_overlay(&self, loader: &Module) -> CoreResult<()> {
        if self.overlay_on_disk(loader)? {
            // The sibling VersionManifest sub-module already resolves to the
            // canonical versions path; it only has to be readable.
            let manifest = loader
                .sub_modules
                .iter()
                .find(|m| m.module_type == ModuleType::VersionManifest)
                .ok_or_else(|| {
                    CoreError::Distribution(format!(
                        "{} has no version manifest sub-module",
                        loader.id
                    ))
                })?;
            let path = self.module_path(manifest)?;
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| CoreError::io(&path, e))?;
            let overlay: VersionJson = serde_json::from_str(&raw)?;
            info!(
                "Mod loader overlay {} present at {:?}",
                overlay.id.as_deref().unwrap_or("?"),
                path
            );
            return Ok(());
        }

        // Legacy Forge: the overlay lives inside the installer archive
        let installer = self.module_path(loader)?;
        let bytes = read_zip_entry(&installer, "version.json").await?;
        let overlay: VersionJson = serde_json::from_slice(&bytes)?;
        let id = overlay.id.clone().ok_or_else(|| {
            CoreError::Distribution(format!("installer overlay of {} carries no id", loader.id))
        })?;

        let target = self.paths.version_json(&id);
        if let Some(parent) = target.parent() {
            ensure_dir(parent).await?;
        }
        write_atomic(&target, &bytes).await?;
        info!("Extracted mod loader overlay {} to {:?}", id, target);
        Ok(())
    }

    /// The vendor's Forge tooling refuses to run without this marker file.
    async fn write_launcher_profiles(&self) -> CoreResult<()> {
        let path = self.paths.common_dir().join("launcher_profiles.json");
        if !path.exists() {
            ensure_dir(self.paths.common_dir()).await?;
            write_atomic(&path, b"{}").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl IndexProcessor for DistributionIndexProcessor {
    async fn init(&mut self) -> CoreResult<()> {
        // The distribution document is loaded by the orchestrator
        Ok(())
    }

    fn total_stages(&self) -> u32 {
        1
    }

    async fn validate(&mut self, on_stage: &StageFn<'_>) -> CoreResult<HashMap<String, Vec<Asset>>> {
        let invalid = self.validate_modules().await?;
        self.validated = true;
        on_stage();

        let mut map = HashMap::new();
        map.insert("distribution".to_string(), invalid);
        Ok(map)
    }

    async fn post_download(&mut self) -> CoreResult<()> {
        let Some(loader) = self.server.mod_loader().cloned() else {
            debug!("Server {} has no mod loader", self.server.id);
            return Ok(());
        };

        if matches!(
            loader.module_type,
            ModuleType::Forge | ModuleType::ForgeHosted
        ) {
            self.write_launcher_profiles().await?;
        }

        self.resolve_overlay(&loader).await
    }
}

/// `true` when the dotted version is at or past `major.minor`.
fn minecraft_at_least(version: &str, major: u32, minor: u32) -> bool {
    let mut parts = version.split('.');
    let v_major = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);
    let v_minor = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);
    (v_major, v_minor) >= (major, minor)
}

/// Forge module versions read `«mc»-«forge»`; the forge half compares
/// component-wise against the legacy cap.
fn forge_version_components(loader: &Module) -> CoreResult<[u32; 4]> {
    let version = loader.maven_id()?.version;
    let forge_part = version.rsplit_once('-').map(|(_, f)| f).unwrap_or(&version);

    let mut components = [0u32; 4];
    let mut count = 0;
    for (i, part) in forge_part.split('.').enumerate() {
        if i >= 4 {
            break;
        }
        components[i] = part
            .parse::<u32>()
            .map_err(|_| CoreError::Distribution(format!("malformed Forge version: {version}")))?;
        count += 1;
    }
    if count == 0 {
        return Err(CoreError::Distribution(format!(
            "malformed Forge version: {version}"
        )));
    }
    Ok(components)
}
