use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

const APP_DIR_NAME: &str = "InterfaceCore";

/// On-disk layout the core operates against.
///
/// - `launcher_dir` — launcher state (distribution.json lives here)
/// - `common_dir`   — shared game files (versions, assets, libraries…)
/// - `instance_dir` — per-server instance trees
/// - `data_dir`     — installed Java runtimes and other managed payloads
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    launcher_dir: PathBuf,
    common_dir: PathBuf,
    instance_dir: PathBuf,
    data_dir: PathBuf,
}

impl LauncherPaths {
    pub fn new(
        launcher_dir: impl Into<PathBuf>,
        common_dir: impl Into<PathBuf>,
        instance_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            launcher_dir: launcher_dir.into(),
            common_dir: common_dir.into(),
            instance_dir: instance_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Standard layout rooted at the platform data directory.
    pub fn standard() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self {
            launcher_dir: root.clone(),
            common_dir: root.join("common"),
            instance_dir: root.join("instances"),
            data_dir: root,
        }
    }

    pub fn launcher_dir(&self) -> &Path {
        &self.launcher_dir
    }

    pub fn common_dir(&self) -> &Path {
        &self.common_dir
    }

    pub fn instance_dir(&self) -> &Path {
        &self.instance_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Location of the distribution document, honoring dev mode.
    pub fn distribution_file(&self, dev_mode: bool) -> PathBuf {
        let name = if dev_mode {
            "distribution_dev.json"
        } else {
            "distribution.json"
        };
        self.launcher_dir.join(name)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.common_dir.join("versions")
    }

    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.versions_dir()
            .join(version_id)
            .join(format!("{}.json", version_id))
    }

    pub fn version_jar(&self, version_id: &str) -> PathBuf {
        self.versions_dir()
            .join(version_id)
            .join(format!("{}.jar", version_id))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.common_dir.join("assets")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.common_dir.join("libraries")
    }

    pub fn runtime_dir(&self, arch: &str) -> PathBuf {
        self.data_dir.join("runtime").join(arch)
    }
}

/// Create a directory tree, mapping the failure to the offending path.
pub async fn ensure_dir(path: &Path) -> CoreResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| CoreError::io(path, e))
}

/// Whole-file write through a sibling temp file and rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".into());
    let tmp = path.with_file_name(format!("{file_name}.part"));

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CoreError::io(&tmp, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CoreError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_file_honors_dev_mode() {
        let paths = LauncherPaths::new("/l", "/c", "/i", "/d");
        assert_eq!(
            paths.distribution_file(false),
            PathBuf::from("/l/distribution.json")
        );
        assert_eq!(
            paths.distribution_file(true),
            PathBuf::from("/l/distribution_dev.json")
        );
    }

    #[test]
    fn version_paths_follow_the_layout() {
        let paths = LauncherPaths::new("/l", "/c", "/i", "/d");
        assert_eq!(
            paths.version_json("1.20.4"),
            PathBuf::from("/c/versions/1.20.4/1.20.4.json")
        );
        assert_eq!(
            paths.version_jar("1.20.4"),
            PathBuf::from("/c/versions/1.20.4/1.20.4.jar")
        );
        assert_eq!(paths.runtime_dir("x64"), PathBuf::from("/d/runtime/x64"));
    }
}
