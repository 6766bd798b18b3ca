// ─── Distribution Model ───
// Publisher manifest: servers, their module trees and Java requirements.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::maven::MavenArtifact;

/// Module kinds recognized by the distribution document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleType {
    Library,
    Forge,
    ForgeHosted,
    Fabric,
    ForgeMod,
    LiteMod,
    FabricMod,
    File,
    VersionManifest,
    LiteLoader,
}

impl ModuleType {
    /// Whether this kind is a mod-loader overlay over a base version.
    pub fn is_mod_loader(&self) -> bool {
        matches!(
            self,
            ModuleType::Forge | ModuleType::ForgeHosted | ModuleType::Fabric
        )
    }

    /// Whether the module id must be a parsable Maven coordinate.
    pub fn requires_maven_id(&self) -> bool {
        !matches!(self, ModuleType::File)
    }
}

/// Remote artifact backing a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleArtifact {
    pub size: u64,
    #[serde(rename = "MD5")]
    pub md5: String,
    pub url: String,
    /// Explicit on-disk path relative to the type's base directory.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequired {
    #[serde(default = "default_true")]
    pub value: bool,
    #[serde(default = "default_true")]
    pub def: bool,
}

fn default_true() -> bool {
    true
}

/// A node in a server's tree of required artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub artifact: ModuleArtifact,
    #[serde(default)]
    pub required: Option<ModuleRequired>,
    #[serde(default)]
    pub sub_modules: Vec<Module>,
}

impl Module {
    /// Whether the module must always be present (defaults to true).
    pub fn required(&self) -> bool {
        self.required.as_ref().map(|r| r.value).unwrap_or(true)
    }

    pub fn has_sub_modules(&self) -> bool {
        !self.sub_modules.is_empty()
    }

    /// Maven coordinate of the module, when the kind demands one.
    pub fn maven_id(&self) -> CoreResult<MavenArtifact> {
        MavenArtifact::parse(&self.id)
    }

    /// Path component below the type's base directory: the explicit
    /// `artifact.path` when present, otherwise derived from the coordinate.
    fn relative_path(&self) -> CoreResult<PathBuf> {
        if let Some(explicit) = &self.artifact.path {
            return Ok(PathBuf::from(explicit));
        }
        if self.module_type.requires_maven_id() {
            return Ok(self.maven_id()?.local_path());
        }
        // File module with no explicit path: the id is the relative path
        Ok(PathBuf::from(&self.id))
    }

    /// Effective on-disk location for this module.
    ///
    /// Sub-modules inherit the owning server's id for instance-relative
    /// resolution.
    pub fn resolve_path(
        &self,
        common_dir: &Path,
        instance_dir: &Path,
        server_id: &str,
    ) -> CoreResult<PathBuf> {
        let path = match self.module_type {
            ModuleType::Library
            | ModuleType::Forge
            | ModuleType::ForgeHosted
            | ModuleType::Fabric
            | ModuleType::LiteLoader => common_dir.join("libraries").join(self.relative_path()?),
            ModuleType::ForgeMod | ModuleType::LiteMod => {
                common_dir.join("modstore").join(self.relative_path()?)
            }
            ModuleType::FabricMod => common_dir
                .join("mods")
                .join("fabric")
                .join(self.relative_path()?),
            ModuleType::VersionManifest => {
                let version = self.maven_id()?.version;
                common_dir
                    .join("versions")
                    .join(&version)
                    .join(format!("{}.json", version))
            }
            ModuleType::File => instance_dir.join(server_id).join(self.relative_path()?),
        };
        Ok(path)
    }
}

// ─── Server ───

/// `host[:port]` with the vanilla default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl Serialize for ServerAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.port == DEFAULT_GAME_PORT {
            serializer.serialize_str(&self.host)
        } else {
            serializer.serialize_str(&format!("{}:{}", self.host, self.port))
        }
    }
}

pub const DEFAULT_GAME_PORT: u16 = 25565;

impl ServerAddress {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| CoreError::MalformedAddress(raw.to_string()))?;
                if host.is_empty() {
                    return Err(CoreError::MalformedAddress(raw.to_string()));
                }
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: raw.to_string(),
                port: DEFAULT_GAME_PORT,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for ServerAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ServerAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Java requirements declared by a server, with per-platform overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaOptions {
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub supported: Option<String>,
    #[serde(default)]
    pub suggested_major: Option<u32>,
    #[serde(default)]
    pub platform_options: Vec<JavaPlatformOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaPlatformOptions {
    pub platform: String,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub supported: Option<String>,
    #[serde(default)]
    pub suggested_major: Option<u32>,
}

/// Java requirements after platform overrides are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveJavaOptions {
    pub distribution: Option<String>,
    pub supported: Option<String>,
    pub suggested_major: Option<u32>,
}

impl EffectiveJavaOptions {
    /// Admissible range and suggested major, falling back to the version
    /// heuristic when the publisher declared nothing.
    pub fn supported_range(&self, minecraft_version: &str) -> (String, u32) {
        let (default_range, default_major) = crate::java::default_java_range(minecraft_version);
        let range = self
            .supported
            .clone()
            .unwrap_or_else(|| default_range.to_string());
        let major = self.suggested_major.unwrap_or(default_major);
        (range, major)
    }
}

impl JavaOptions {
    /// Resolve for a `(platform, architecture)` pair. An override entry
    /// matches when its platform equals `platform` and it either names no
    /// architecture or names `arch`.
    pub fn effective_for(&self, platform: &str, arch: &str) -> EffectiveJavaOptions {
        let mut effective = EffectiveJavaOptions {
            distribution: self.distribution.clone(),
            supported: self.supported.clone(),
            suggested_major: self.suggested_major,
        };

        let matched = self.platform_options.iter().find(|o| {
            o.platform == platform
                && o.architecture
                    .as_deref()
                    .map(|a| a == arch)
                    .unwrap_or(true)
        });

        if let Some(o) = matched {
            if o.distribution.is_some() {
                effective.distribution = o.distribution.clone();
            }
            if o.supported.is_some() {
                effective.supported = o.supported.clone();
            }
            if o.suggested_major.is_some() {
                effective.suggested_major = o.suggested_major;
            }
        }

        effective
    }
}

/// A logical game server with its module tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub address: ServerAddress,
    pub minecraft_version: String,
    #[serde(default)]
    pub main_server: bool,
    #[serde(default)]
    pub java_options: Option<JavaOptions>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Server {
    /// Depth-first walk of the full module tree.
    pub fn walk_modules(&self) -> Vec<&Module> {
        fn push<'a>(out: &mut Vec<&'a Module>, module: &'a Module) {
            out.push(module);
            for sub in &module.sub_modules {
                push(out, sub);
            }
        }
        let mut out = Vec::new();
        for module in &self.modules {
            push(&mut out, module);
        }
        out
    }

    /// The top-level mod-loader module, when the server has one.
    pub fn mod_loader(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.module_type.is_mod_loader())
    }
}

// ─── Distribution ───

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub version: Option<String>,
    pub servers: Vec<Server>,
}

impl Distribution {
    /// Read and parse the locally-persisted distribution document.
    pub async fn load(path: &Path) -> CoreResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::io(path, e))?;
        let dist: Distribution = serde_json::from_str(&raw)?;
        debug!("Loaded distribution with {} servers", dist.servers.len());
        Ok(dist)
    }

    pub fn get_server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// The server flagged main; when none is, the first is promoted.
    pub fn main_server(&self) -> CoreResult<&Server> {
        if let Some(main) = self.servers.iter().find(|s| s.main_server) {
            return Ok(main);
        }
        self.servers
            .first()
            .ok_or_else(|| CoreError::Distribution("distribution has no servers".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, module_type: ModuleType, path: Option<&str>) -> Module {
        Module {
            id: id.into(),
            name: None,
            module_type,
            artifact: ModuleArtifact {
                size: 10,
                md5: "d41d8cd98f00b204e9800998ecf8427e".into(),
                url: "https://example.com/a".into(),
                path: path.map(str::to_string),
            },
            required: None,
            sub_modules: Vec::new(),
        }
    }

    #[test]
    fn address_defaults_the_port() {
        let addr = ServerAddress::parse("mc.example.com").unwrap();
        assert_eq!(addr.host, "mc.example.com");
        assert_eq!(addr.port, 25565);
    }

    #[test]
    fn address_with_explicit_port() {
        let addr = ServerAddress::parse("mc.example.com:25566").unwrap();
        assert_eq!(addr.port, 25566);
    }

    #[test]
    fn malformed_port_is_fatal() {
        assert!(ServerAddress::parse("mc.example.com:notaport").is_err());
        assert!(ServerAddress::parse("mc.example.com:70000").is_err());
        assert!(ServerAddress::parse(":25565").is_err());
    }

    #[test]
    fn library_path_uses_the_libraries_tree() {
        let m = module("org.lwjgl:lwjgl:3.3.3", ModuleType::Library, None);
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/common/libraries/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar")
        );
    }

    #[test]
    fn fabric_mod_path_uses_the_fabric_store() {
        let m = module("com.example:coolmod:1.2.0", ModuleType::FabricMod, None);
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/common/mods/fabric/com/example/coolmod/1.2.0/coolmod-1.2.0.jar")
        );
    }

    #[test]
    fn forge_mod_path_uses_the_modstore() {
        let m = module("com.example:bigmod:0.9", ModuleType::ForgeMod, None);
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/common/modstore/com/example/bigmod/0.9/bigmod-0.9.jar")
        );
    }

    #[test]
    fn file_path_is_instance_relative() {
        let m = module("config/server.properties", ModuleType::File, None);
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(path, PathBuf::from("/inst/srv/config/server.properties"));
    }

    #[test]
    fn explicit_artifact_path_wins() {
        let m = module(
            "org.lwjgl:lwjgl:3.3.3",
            ModuleType::Library,
            Some("custom/lwjgl.jar"),
        );
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(path, PathBuf::from("/common/libraries/custom/lwjgl.jar"));
    }

    #[test]
    fn version_manifest_lands_in_the_versions_tree() {
        let m = module(
            "net.minecraftforge:forge:1.20.4-49.0.3:installer@json",
            ModuleType::VersionManifest,
            None,
        );
        let path = m
            .resolve_path(Path::new("/common"), Path::new("/inst"), "srv")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/common/versions/1.20.4-49.0.3/1.20.4-49.0.3.json")
        );
    }

    #[test]
    fn main_server_promotion() {
        let json = r#"{
            "servers": [
                {"id": "a", "address": "a.example.com", "minecraftVersion": "1.20.4"},
                {"id": "b", "address": "b.example.com", "minecraftVersion": "1.20.4", "mainServer": true}
            ]
        }"#;
        let dist: Distribution = serde_json::from_str(json).unwrap();
        assert_eq!(dist.main_server().unwrap().id, "b");

        let json_no_main = r#"{
            "servers": [
                {"id": "a", "address": "a.example.com", "minecraftVersion": "1.20.4"},
                {"id": "b", "address": "b.example.com", "minecraftVersion": "1.20.4"}
            ]
        }"#;
        let dist: Distribution = serde_json::from_str(json_no_main).unwrap();
        assert_eq!(dist.main_server().unwrap().id, "a");
    }

    #[test]
    fn empty_distribution_has_no_main_server() {
        let dist = Distribution {
            version: None,
            servers: Vec::new(),
        };
        assert!(dist.main_server().is_err());
    }

    #[test]
    fn walk_modules_is_depth_first() {
        let mut parent = module("net.minecraftforge:forge:1.20.4-49.0.3", ModuleType::Forge, None);
        parent.sub_modules.push(module(
            "net.minecraftforge:forge:1.20.4-49.0.3:installer@json",
            ModuleType::VersionManifest,
            None,
        ));
        let server = Server {
            id: "srv".into(),
            name: None,
            address: ServerAddress::parse("example.com").unwrap(),
            minecraft_version: "1.20.4".into(),
            main_server: true,
            java_options: None,
            modules: vec![parent, module("a:b:1", ModuleType::Library, None)],
        };
        let walked = server.walk_modules();
        assert_eq!(walked.len(), 3);
        assert_eq!(walked[1].module_type, ModuleType::VersionManifest);
    }

    #[test]
    fn effective_options_fall_back_to_the_version_heuristic() {
        let declared = EffectiveJavaOptions {
            distribution: None,
            supported: Some(">=17.x".into()),
            suggested_major: Some(17),
        };
        assert_eq!(
            declared.supported_range("1.12.2"),
            (">=17.x".to_string(), 17)
        );

        let silent = EffectiveJavaOptions::default();
        assert_eq!(silent.supported_range("1.12.2"), ("8.x".to_string(), 8));
        assert_eq!(silent.supported_range("1.20.5"), (">=21.x".to_string(), 21));
    }

    #[test]
    fn platform_options_override_the_base() {
        let opts = JavaOptions {
            distribution: Some("ADOPTIUM".into()),
            supported: Some(">=17.x".into()),
            suggested_major: Some(17),
            platform_options: vec![JavaPlatformOptions {
                platform: "darwin".into(),
                architecture: Some("arm64".into()),
                distribution: Some("CORRETTO".into()),
                supported: None,
                suggested_major: None,
            }],
        };

        let mac = opts.effective_for("darwin", "arm64");
        assert_eq!(mac.distribution.as_deref(), Some("CORRETTO"));
        assert_eq!(mac.supported.as_deref(), Some(">=17.x"));

        let linux = opts.effective_for("linux", "x64");
        assert_eq!(linux.distribution.as_deref(), Some("ADOPTIUM"));
    }
}
