// ─── Maven Coordinates ───
// Distribution module ids and library names are Maven coordinates. The
// launcher never talks to a Maven resolver; it only needs the coordinate
// broken apart and projected onto the repository file layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

const DEFAULT_EXTENSION: &str = "jar";

/// A coordinate of the form `group:artifact:version[:classifier][@ext]`.
///
/// The `@ext` tail overrides the `jar` default; Forge version-manifest
/// sub-modules use it to point at a bare `.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(id: &str) -> CoreResult<Self> {
        // The extension rides on the tail, after everything else
        let (body, extension) = match id.rsplit_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext),
            Some(_) => return Err(CoreError::InvalidMavenCoordinate(id.to_string())),
            None => (id, DEFAULT_EXTENSION),
        };

        let mut segments = body.split(':');
        let group_id = required_segment(&mut segments, id)?;
        let artifact_id = required_segment(&mut segments, id)?;
        let version = required_segment(&mut segments, id)?;
        let classifier = match segments.next() {
            Some("") => return Err(CoreError::InvalidMavenCoordinate(id.to_string())),
            other => other.map(str::to_string),
        };
        if segments.next().is_some() {
            return Err(CoreError::InvalidMavenCoordinate(id.to_string()));
        }

        Ok(Self {
            group_id,
            artifact_id,
            version,
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `artifact-version[-classifier].ext`
    pub fn file_name(&self) -> String {
        let mut name = format!("{}-{}", self.artifact_id, self.version);
        if let Some(classifier) = &self.classifier {
            name.push('-');
            name.push_str(classifier);
        }
        name.push('.');
        name.push_str(&self.extension);
        name
    }

    /// Position inside a Maven-layout tree, relative to its root.
    pub fn local_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group_id.split('.').collect();
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }

    /// Download location under a repository base. Always forward slashes,
    /// whatever the host platform uses on disk.
    pub fn remote_url(&self, repository: &str) -> String {
        let mut url = String::from(repository.trim_end_matches('/'));
        for piece in self.group_id.split('.') {
            url.push('/');
            url.push_str(piece);
        }
        url.push('/');
        url.push_str(&self.artifact_id);
        url.push('/');
        url.push_str(&self.version);
        url.push('/');
        url.push_str(&self.file_name());
        url
    }
}

fn required_segment<'a>(
    segments: &mut impl Iterator<Item = &'a str>,
    id: &str,
) -> CoreResult<String> {
    match segments.next() {
        Some(segment) if !segment.is_empty() => Ok(segment.to_string()),
        _ => Err(CoreError::InvalidMavenCoordinate(id.to_string())),
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_module_id_parses() {
        let forge = MavenArtifact::parse("net.minecraftforge:forge:1.20.4-49.0.3").unwrap();
        assert_eq!(forge.group_id, "net.minecraftforge");
        assert_eq!(forge.artifact_id, "forge");
        assert_eq!(forge.version, "1.20.4-49.0.3");
        assert_eq!(forge.classifier, None);
        assert_eq!(forge.extension, "jar");
    }

    #[test]
    fn version_manifest_submodule_carries_classifier_and_extension() {
        let manifest =
            MavenArtifact::parse("net.minecraftforge:forge:1.12.2-14.23.5.2847:installer@json")
                .unwrap();
        assert_eq!(manifest.classifier.as_deref(), Some("installer"));
        assert_eq!(manifest.extension, "json");
        assert_eq!(
            manifest.file_name(),
            "forge-1.12.2-14.23.5.2847-installer.json"
        );
    }

    #[test]
    fn natives_classifier_lands_in_the_file_name() {
        let natives = MavenArtifact::parse("org.lwjgl:lwjgl-glfw:3.3.2:natives-linux").unwrap();
        assert_eq!(natives.file_name(), "lwjgl-glfw-3.3.2-natives-linux.jar");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for bad in [
            "net.fabricmc",
            "net.fabricmc:fabric-loader",
            "a:b:c:d:e",
            "group::1.0",
            ":artifact:1.0",
            "a:b:c@",
            "a:b:c::@zip",
        ] {
            assert!(
                MavenArtifact::parse(bad).is_err(),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn library_path_mirrors_the_maven_layout() {
        let loader = MavenArtifact::parse("net.fabricmc:fabric-loader:0.15.6").unwrap();
        assert_eq!(
            loader.local_path(),
            PathBuf::from("net/fabricmc/fabric-loader/0.15.6/fabric-loader-0.15.6.jar")
        );
    }

    #[test]
    fn repository_url_uses_forward_slashes() {
        let loader = MavenArtifact::parse("net.fabricmc:fabric-loader:0.15.6").unwrap();
        assert_eq!(
            loader.remote_url("https://maven.fabricmc.net/"),
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.6/fabric-loader-0.15.6.jar"
        );
    }

    #[test]
    fn display_round_trips_the_id() {
        for id in [
            "net.minecraftforge:forge:1.20.4-49.0.3",
            "net.minecraftforge:forge:1.12.2-14.23.5.2847:installer@json",
            "org.lwjgl:lwjgl-glfw:3.3.2:natives-linux",
        ] {
            let parsed = MavenArtifact::parse(id).unwrap();
            assert_eq!(parsed.to_string(), id);
        }
    }
}
