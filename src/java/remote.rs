// ─── Remote JDK Metadata ───
// Resolves a downloadable JDK archive from one of the supported
// distributions into a pipeline Asset.

use std::path::Path;
use std::str::FromStr;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::asset::{Asset, HashAlgorithm};
use crate::error::{CoreError, CoreResult};

/// Supported JDK distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JdkDistribution {
    Adoptium,
    Corretto,
}

impl FromStr for JdkDistribution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADOPTIUM" | "TEMURIN" => Ok(JdkDistribution::Adoptium),
            "CORRETTO" => Ok(JdkDistribution::Corretto),
            other => Err(CoreError::UnknownDistribution(other.to_string())),
        }
    }
}

impl JdkDistribution {
    /// Platform default: Corretto ships notarized macOS builds, Adoptium
    /// everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            JdkDistribution::Corretto
        } else {
            JdkDistribution::Adoptium
        }
    }
}

/// Host architecture in distribution vocabulary.
pub fn host_arch() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        "aarch64"
    } else {
        "x64"
    }
}

/// Resolve the latest JDK archive of `major` for the host platform.
pub async fn resolve_jdk_asset(
    client: &Client,
    distribution: JdkDistribution,
    major: u32,
    runtime_dir: &Path,
) -> CoreResult<Asset> {
    match distribution {
        JdkDistribution::Adoptium => resolve_adoptium(client, major, runtime_dir).await,
        JdkDistribution::Corretto => resolve_corretto(client, major, runtime_dir).await,
    }
}

// ── Adoptium ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AdoptiumRelease {
    binary: AdoptiumBinary,
    version: AdoptiumVersion,
}

#[derive(Debug, Deserialize)]
struct AdoptiumBinary {
    os: String,
    architecture: String,
    image_type: String,
    package: AdoptiumPackage,
}

#[derive(Debug, Deserialize)]
struct AdoptiumPackage {
    name: String,
    link: String,
    size: u64,
    checksum: String,
}

#[derive(Debug, Deserialize)]
struct AdoptiumVersion {
    major: u32,
}

fn adoptium_os() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "mac"
    } else {
        "linux"
    }
}

async fn resolve_adoptium(client: &Client, major: u32, runtime_dir: &Path) -> CoreResult<Asset> {
    let url =
        format!("https://api.adoptium.net/v3/assets/latest/{major}/hotspot?vendor=eclipse");
    let releases: Vec<AdoptiumRelease> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let arch = host_arch();
    let release = select_adoptium_release(&releases, major, adoptium_os(), arch).ok_or_else(
        || {
            CoreError::Other(format!(
                "Adoptium has no jdk {major} build for {}-{arch}",
                adoptium_os()
            ))
        },
    )?;

    let package = &release.binary.package;
    info!("Resolved Adoptium JDK: {}", package.name);
    Ok(Asset::new(
        package.name.clone(),
        package.link.clone(),
        package.size,
        package.checksum.clone(),
        HashAlgorithm::Sha256,
        runtime_dir.join(&package.name),
    ))
}

fn select_adoptium_release<'a>(
    releases: &'a [AdoptiumRelease],
    major: u32,
    os: &str,
    arch: &str,
) -> Option<&'a AdoptiumRelease> {
    releases.iter().find(|r| {
        r.version.major == major
            && r.binary.os == os
            && r.binary.image_type == "jdk"
            && r.binary.architecture == arch
    })
}

// ── Corretto ────────────────────────────────────────────

fn corretto_os() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}

fn corretto_ext() -> &'static str {
    if cfg!(target_os = "windows") {
        "zip"
    } else {
        "tar.gz"
    }
}

async fn resolve_corretto(client: &Client, major: u32, runtime_dir: &Path) -> CoreResult<Asset> {
    let arch = host_arch();
    let os = corretto_os();
    let ext = corretto_ext();
    let file = format!("amazon-corretto-{major}-{arch}-{os}-jdk.{ext}");

    // HEAD follows redirects so the final URL names the real artifact
    let head = client
        .head(format!("https://corretto.aws/downloads/latest/{file}"))
        .send()
        .await?
        .error_for_status()?;
    let final_url = head.url().to_string();
    let size = head.content_length().unwrap_or(0);
    let name = final_url
        .rsplit('/')
        .next()
        .unwrap_or(file.as_str())
        .to_string();

    let checksum = client
        .get(format!(
            "https://corretto.aws/downloads/latest_checksum/{file}"
        ))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let checksum = checksum.trim().to_string();
    if checksum.len() != HashAlgorithm::Md5.digest_len()
        || !checksum.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(CoreError::Other(format!(
            "unexpected Corretto checksum body: {checksum}"
        )));
    }

    info!("Resolved Corretto JDK: {name}");
    Ok(Asset::new(
        name.clone(),
        final_url,
        size,
        checksum,
        HashAlgorithm::Md5,
        runtime_dir.join(&name),
    ))
}
