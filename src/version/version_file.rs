// ─── Version File ───
// Parses a Mojang version JSON and evaluates OS rules for libraries.

use std::collections::HashMap;

use serde::Deserialize;

/// A fully parsed Mojang version JSON. Mod-loader overlays reuse the same
/// shape and carry `inherits_from`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub logging: Option<LoggingInfo>,
    /// Present on mod-loader overlays that extend a base version.
    #[serde(default)]
    pub inherits_from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingInfo {
    pub client: Option<LoggingClient>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingClient {
    pub file: LoggingFile,
}

/// Log4j configuration file reference.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingFile {
    pub id: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl LibraryEntry {
    /// Evaluate whether this library applies to the current OS.
    ///
    /// Rules logic (Mojang spec):
    /// - If no rules: allowed.
    /// - Process rules top-to-bottom. Start with "disallowed".
    /// - Each matching rule (or OS-less rule) sets the state to its action.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let rules = match &self.rules {
            Some(r) => r,
            None => return true,
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match &rule.os {
                None => true,
                Some(os) => match &os.name {
                    None => true,
                    Some(name) => name == current_os,
                },
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }

    /// Natives classifier for the current OS, with `${arch}` expanded to the
    /// platform word size.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let natives = self.natives.as_ref()?;
        let raw = natives.get(current_os_name())?;
        let arch = if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        };
        Some(raw.replace("${arch}", arch))
    }

    /// Artifact that has to exist on disk for this entry: the natives
    /// classifier when one applies, the main artifact otherwise.
    pub fn effective_artifact(&self) -> Option<&LibDownloadArtifact> {
        let downloads = self.downloads.as_ref()?;
        if let Some(classifier) = self.native_classifier_for_current_os() {
            return downloads.classifiers.as_ref()?.get(&classifier);
        }
        downloads.artifact.as_ref()
    }
}

/// Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rules: Option<Vec<LibraryRule>>, natives: Option<HashMap<String, String>>) -> LibraryEntry {
        LibraryEntry {
            name: "test:lib:1.0".into(),
            downloads: None,
            rules,
            natives,
        }
    }

    #[test]
    fn no_rules_means_allowed() {
        assert!(entry(None, None).is_allowed_for_current_os());
    }

    #[test]
    fn allow_only_current_os() {
        let lib = entry(
            Some(vec![LibraryRule {
                action: RuleAction::Allow,
                os: Some(OsRule {
                    name: Some(current_os_name().to_string()),
                    arch: None,
                }),
            }]),
            None,
        );
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn disallow_current_os() {
        let lib = entry(
            Some(vec![
                LibraryRule {
                    action: RuleAction::Allow,
                    os: None,
                },
                LibraryRule {
                    action: RuleAction::Disallow,
                    os: Some(OsRule {
                        name: Some(current_os_name().to_string()),
                        arch: None,
                    }),
                },
            ]),
            None,
        );
        assert!(!lib.is_allowed_for_current_os());
    }

    #[test]
    fn allow_other_os_only_excludes_us() {
        let other = if current_os_name() == "linux" { "osx" } else { "linux" };
        let lib = entry(
            Some(vec![LibraryRule {
                action: RuleAction::Allow,
                os: Some(OsRule {
                    name: Some(other.to_string()),
                    arch: None,
                }),
            }]),
            None,
        );
        assert!(!lib.is_allowed_for_current_os());
    }

    #[test]
    fn natives_classifier_expands_arch() {
        let mut natives = HashMap::new();
        natives.insert(
            current_os_name().to_string(),
            "natives-os-${arch}".to_string(),
        );
        let lib = entry(None, Some(natives));
        let expected = if cfg!(target_pointer_width = "64") {
            "natives-os-64"
        } else {
            "natives-os-32"
        };
        assert_eq!(lib.native_classifier_for_current_os().unwrap(), expected);
    }

    #[test]
    fn overlay_json_parses_inherits_from() {
        let json = r#"{
            "id": "1.20.4-forge-49.0.3",
            "inheritsFrom": "1.20.4",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher"
        }"#;
        let v: VersionJson = serde_json::from_str(json).unwrap();
        assert_eq!(v.inherits_from.as_deref(), Some("1.20.4"));
        assert_eq!(v.id.as_deref(), Some("1.20.4-forge-49.0.3"));
    }
}
