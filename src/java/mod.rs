// ─── Java Guard ───
// Cross-platform discovery of Java installations, property introspection,
// range filtering, ranking, and managed-runtime installation.

mod discovery;
mod properties;
mod remote;
mod version;

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use discovery::{
    discover_candidates, java_exec_suffix, platform_strategies, DirectoryBasedDiscovery,
    DiscoveryStrategy, EnvironmentBasedDiscovery, PathBasedDiscovery,
};
pub use properties::{introspect, parse_properties, HotSpotProperties};
pub use remote::{host_arch, resolve_jdk_asset, JdkDistribution};
pub use version::{
    default_java_range, parse_java_runtime_version, satisfies_range, JavaSemver,
};

use crate::error::{CoreError, CoreResult};
use crate::util::archive;

/// One admitted Java installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JvmDetails {
    /// Launch executable (javaw.exe on Windows).
    pub path: PathBuf,
    pub vendor: String,
    pub semver: JavaSemver,
    pub semver_string: String,
}

/// Parallel introspections while sweeping candidates.
const INTROSPECTION_CONCURRENCY: usize = 4;

/// Discover every installation on the host that satisfies `range`,
/// unranked. `runtime_dir` is the launcher-managed runtime tree.
pub async fn discover_jvms(runtime_dir: &Path, range: &str) -> CoreResult<Vec<JvmDetails>> {
    let runtime_dir = runtime_dir.to_path_buf();
    let candidates = tokio::task::spawn_blocking(move || {
        let strategies = platform_strategies(&runtime_dir);
        discover_candidates(&strategies)
    })
    .await
    .map_err(|e| CoreError::Other(format!("discovery task failed: {e}")))?;

    info!("Discovered {} Java candidates", candidates.len());

    let range = range.to_string();
    let details: Vec<Option<JvmDetails>> = stream::iter(candidates.into_iter())
        .map(|root| {
            let range = range.clone();
            async move {
                let launch_exec = root.join(java_exec_suffix());
                match introspect(&introspection_exec(&launch_exec)).await {
                    Ok(props) => details_from_properties(&props, launch_exec, &range),
                    Err(e) => {
                        debug!("Introspection of {:?} failed: {}", root, e);
                        None
                    }
                }
            }
        })
        .buffer_unordered(INTROSPECTION_CONCURRENCY)
        .collect()
        .await;

    Ok(details.into_iter().flatten().collect())
}

/// Discover, rank, and return the best installation for `range`.
pub async fn select_best_jvm(runtime_dir: &Path, range: &str) -> CoreResult<JvmDetails> {
    let mut details = discover_jvms(runtime_dir, range).await?;
    rank_jvms(&mut details);
    details
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::JavaNotFound(range.to_string()))
}

/// Introspect one specific executable (a user-chosen path) against `range`.
pub async fn validate_jvm(executable: &Path, range: &str) -> CoreResult<Option<JvmDetails>> {
    let props = introspect(&introspection_exec(executable)).await?;
    Ok(details_from_properties(
        &props,
        executable.to_path_buf(),
        range,
    ))
}

/// javaw.exe has no console to print settings into; probing swaps it for
/// its console sibling.
fn introspection_exec(launch_exec: &Path) -> PathBuf {
    if launch_exec
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case("javaw.exe"))
        .unwrap_or(false)
    {
        return launch_exec.with_file_name("java.exe");
    }
    launch_exec.to_path_buf()
}

/// Admission pipeline over a parsed property table. Returns `None` when the
/// candidate is 32-bit, wrong-arch for an ARM64 host, unparsable, or
/// outside the range.
fn details_from_properties(
    props: &HotSpotProperties,
    executable: PathBuf,
    range: &str,
) -> Option<JvmDetails> {
    admit_architecture(props, cfg!(target_arch = "aarch64"))?;

    let raw_version = props.get("java.version")?;
    let semver = match parse_java_runtime_version(raw_version) {
        Some(semver) => semver,
        None => {
            warn!("Dropping {:?}: unparsable version {raw_version}", executable);
            return None;
        }
    };

    if !satisfies_range(&semver, range) {
        debug!("Dropping {:?}: {} outside {}", executable, semver, range);
        return None;
    }

    Some(JvmDetails {
        path: executable,
        vendor: props.get("java.vendor").unwrap_or("Unknown").to_string(),
        semver,
        semver_string: raw_version.to_string(),
    })
}

/// 64-bit only; on ARM64 hosts only native aarch64 JVMs are admitted.
fn admit_architecture(props: &HotSpotProperties, host_is_arm64: bool) -> Option<()> {
    if props.get("sun.arch.data.model") != Some("64") {
        return None;
    }
    if host_is_arm64 && props.get("os.arch") != Some("aarch64") {
        return None;
    }
    Some(())
}

/// Sort descending by (major, minor, patch); among equal versions a path
/// without `jdk` in it wins (prefer the leaner JRE).
pub fn rank_jvms(details: &mut [JvmDetails]) {
    details.sort_by(|a, b| {
        let version = (b.semver.major, b.semver.minor, b.semver.patch).cmp(&(
            a.semver.major,
            a.semver.minor,
            a.semver.patch,
        ));
        if version != Ordering::Equal {
            return version;
        }
        let a_jdk = path_mentions_jdk(&a.path);
        let b_jdk = path_mentions_jdk(&b.path);
        a_jdk.cmp(&b_jdk)
    });
}

fn path_mentions_jdk(path: &Path) -> bool {
    path.to_string_lossy().to_ascii_lowercase().contains("jdk")
}

// ── Managed runtime installation ────────────────────────

/// Extract a downloaded JDK archive in place and locate its executable.
///
/// The payload is assumed to sit inside the archive's single top-level
/// directory, the convention of every supported distribution.
pub async fn install_jdk_archive(archive_path: &Path) -> CoreResult<PathBuf> {
    let dest = archive_path
        .parent()
        .ok_or_else(|| CoreError::Archive(format!("{archive_path:?} has no parent")))?;

    let root_name = archive::first_top_level_dir(archive_path).await?;

    let file_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if file_name.ends_with(".zip") {
        archive::extract_zip(archive_path, dest).await?;
    } else {
        archive::extract_tar_gz(archive_path, dest).await?;
    }

    let executable = dest.join(root_name).join(java_exec_suffix());
    if !executable.is_file() {
        return Err(CoreError::Archive(format!(
            "extracted runtime has no executable at {executable:?}"
        )));
    }
    info!("Installed runtime at {:?}", executable);
    Ok(executable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HotSpotProperties {
        let text: String = pairs
            .iter()
            .map(|(k, v)| format!("    {k} = {v}\n"))
            .collect();
        parse_properties(&text)
    }

    fn candidate(path: &str, version: &str, data_model: &str) -> HotSpotProperties {
        let _ = path;
        props(&[
            ("java.version", version),
            ("java.vendor", "Eclipse Adoptium"),
            ("sun.arch.data.model", data_model),
            ("os.arch", "amd64"),
        ])
    }

    #[test]
    fn range_filter_drops_32_bit_and_out_of_range() {
        let set = [
            ("jdk-64/21", "21.0.1", "64"),
            ("jdk-64/17", "17.0.6", "64"),
            ("jdk-32/17", "17.0.6", "32"),
            ("jdk-64/8", "1.8.0_351", "64"),
            ("jdk-32/8", "1.8.0_351", "32"),
        ];

        let admitted: Vec<JvmDetails> = set
            .iter()
            .filter_map(|(path, version, model)| {
                details_from_properties(
                    &candidate(path, version, model),
                    PathBuf::from(path),
                    ">=17.x",
                )
            })
            .collect();

        let paths: Vec<&str> = admitted
            .iter()
            .map(|d| d.path.to_str().unwrap())
            .collect();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&"jdk-64/21"));
        assert!(paths.contains(&"jdk-64/17"));
    }

    #[test]
    fn ranking_heads_the_greatest_version() {
        let set = [
            ("jdk-64/17", "17.0.6", "64"),
            ("jdk-64/21", "21.0.1", "64"),
        ];
        let mut admitted: Vec<JvmDetails> = set
            .iter()
            .filter_map(|(path, version, model)| {
                details_from_properties(
                    &candidate(path, version, model),
                    PathBuf::from(path),
                    ">=17.x",
                )
            })
            .collect();
        rank_jvms(&mut admitted);
        assert_eq!(admitted[0].path, PathBuf::from("jdk-64/21"));
    }

    #[test]
    fn caret_range_heads_17() {
        let set = [
            ("jdk-64/21", "21.0.1", "64"),
            ("jdk-64/17", "17.0.6", "64"),
            ("jdk-64/8", "1.8.0_351", "64"),
        ];
        let mut admitted: Vec<JvmDetails> = set
            .iter()
            .filter_map(|(path, version, model)| {
                details_from_properties(
                    &candidate(path, version, model),
                    PathBuf::from(path),
                    "^17.x",
                )
            })
            .collect();
        rank_jvms(&mut admitted);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].path, PathBuf::from("jdk-64/17"));
    }

    #[test]
    fn equal_versions_prefer_the_non_jdk_path() {
        let mut details = vec![
            JvmDetails {
                path: PathBuf::from("/opt/jdk-17.0.6"),
                vendor: "A".into(),
                semver: JavaSemver {
                    major: 17,
                    minor: 0,
                    patch: 6,
                },
                semver_string: "17.0.6".into(),
            },
            JvmDetails {
                path: PathBuf::from("/opt/jre-17.0.6"),
                vendor: "B".into(),
                semver: JavaSemver {
                    major: 17,
                    minor: 0,
                    patch: 6,
                },
                semver_string: "17.0.6".into(),
            },
        ];
        rank_jvms(&mut details);
        assert_eq!(details[0].path, PathBuf::from("/opt/jre-17.0.6"));
    }

    #[test]
    fn arm64_host_drops_foreign_arch() {
        let intel = props(&[
            ("java.version", "17.0.6"),
            ("sun.arch.data.model", "64"),
            ("os.arch", "x86_64"),
        ]);
        let native = props(&[
            ("java.version", "17.0.6"),
            ("sun.arch.data.model", "64"),
            ("os.arch", "aarch64"),
        ]);

        assert!(admit_architecture(&intel, true).is_none());
        assert!(admit_architecture(&native, true).is_some());
        // On x64 hosts the os.arch rule does not apply
        assert!(admit_architecture(&intel, false).is_some());
    }

    #[test]
    fn javaw_is_swapped_for_probing() {
        assert_eq!(
            introspection_exec(Path::new("C:/java/bin/javaw.exe")),
            PathBuf::from("C:/java/bin/java.exe")
        );
        assert_eq!(
            introspection_exec(Path::new("/usr/lib/jvm/jdk/bin/java")),
            PathBuf::from("/usr/lib/jvm/jdk/bin/java")
        );
    }

    #[tokio::test]
    async fn install_extracts_and_finds_the_executable() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let archive_path = dir.path().join("jdk-17.zip");
        let exec_rel = java_exec_suffix();
        let entry_name = format!("jdk-17.0.6+9/{}", exec_rel.to_string_lossy().replace('\\', "/"));

        let file = std::fs::File::create(&archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(&entry_name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"#!/bin/sh\n").unwrap();
        zip.finish().unwrap();

        let exec = install_jdk_archive(&archive_path).await.unwrap();
        assert!(exec.ends_with(exec_rel));
        assert!(exec.is_file());
    }
}
