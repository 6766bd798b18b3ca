// ─── Java Version Parsing ───
// HotSpot reports either the legacy `1.major.minor_patch` scheme or the
// modern `major.minor.patch[+build]` one. Parsing is a partial function:
// anything unrecognized drops the candidate.

use std::fmt;

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parsed Java runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaSemver {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl JavaSemver {
    pub fn as_version(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }
}

impl fmt::Display for JavaSemver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse a `java.version` property value.
///
/// Legacy scheme: `1.8.0_351[-b10]` → major 8, minor 0, patch 351.
/// Modern scheme: `17.0.6[+9-LTS-190]` → major 17, minor 0, patch 6.
pub fn parse_java_runtime_version(raw: &str) -> Option<JavaSemver> {
    let parsed = if raw.starts_with("1.") {
        parse_legacy(raw)
    } else {
        parse_modern(raw)
    };
    if parsed.is_none() {
        debug!("Unparsable java.version: {raw}");
    }
    parsed
}

fn parse_legacy(raw: &str) -> Option<JavaSemver> {
    // 1.«major».«minor»_«patch» with an optional -b«n» build suffix
    let rest = raw.strip_prefix("1.")?;
    let (rest, _build) = match rest.split_once('-') {
        Some((head, build)) if build.starts_with('b') => (head, Some(build)),
        Some(_) => return None,
        None => (rest, None),
    };

    let (major, rest) = rest.split_once('.')?;
    let (minor, patch) = rest.split_once('_')?;
    Some(JavaSemver {
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
        patch: patch.parse().ok()?,
    })
}

fn parse_modern(raw: &str) -> Option<JavaSemver> {
    // «major».«minor».«patch» with an optional +build / .update tail
    let numeric = raw.split(['+', '-']).next()?;
    let mut parts = numeric.split('.');

    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    // A fourth dotted component (vendor update number) is tolerated
    Some(JavaSemver {
        major,
        minor,
        patch,
    })
}

/// Whether `version` satisfies a launcher range expression.
///
/// Ranges use the standard syntax (`>=17.x`, `^17.x`, `8.x`); wildcard
/// components behind an explicit operator are normalized away before the
/// semver parser sees them.
pub fn satisfies_range(version: &JavaSemver, range: &str) -> bool {
    let normalized = normalize_range(range);
    match VersionReq::parse(&normalized) {
        Ok(req) => req.matches(&version.as_version()),
        Err(e) => {
            debug!("Unparsable version range {range}: {e}");
            false
        }
    }
}

fn normalize_range(range: &str) -> String {
    range
        .split(',')
        .map(|part| {
            let part = part.trim();
            let has_operator = part.starts_with(['>', '<', '=', '^', '~']);
            if has_operator {
                part.trim_end_matches(".x")
                    .trim_end_matches(".X")
                    .trim_end_matches(".*")
                    .to_string()
            } else if let Some(head) = part.strip_suffix(".x").or_else(|| part.strip_suffix(".X")) {
                format!("{head}.*")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default admissible range and suggested major for a Minecraft version.
pub fn default_java_range(minecraft_version: &str) -> (&'static str, u32) {
    let mut parts = minecraft_version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

    if (major, minor, patch) >= (1, 20, 5) {
        (">=21.x", 21)
    } else if (major, minor) >= (1, 17) {
        (">=17.x", 17)
    } else {
        ("8.x", 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_version_parses() {
        assert_eq!(
            parse_java_runtime_version("1.8.0_351"),
            Some(JavaSemver {
                major: 8,
                minor: 0,
                patch: 351
            })
        );
        assert_eq!(
            parse_java_runtime_version("1.8.0_392-b08"),
            Some(JavaSemver {
                major: 8,
                minor: 0,
                patch: 392
            })
        );
    }

    #[test]
    fn modern_version_parses() {
        assert_eq!(
            parse_java_runtime_version("17.0.6+9-LTS-190"),
            Some(JavaSemver {
                major: 17,
                minor: 0,
                patch: 6
            })
        );
        assert_eq!(
            parse_java_runtime_version("21.0.1"),
            Some(JavaSemver {
                major: 21,
                minor: 0,
                patch: 1
            })
        );
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(parse_java_runtime_version("abc"), None);
        assert_eq!(parse_java_runtime_version(""), None);
        assert_eq!(parse_java_runtime_version("17"), None);
        assert_eq!(parse_java_runtime_version("1.8"), None);
    }

    #[test]
    fn range_with_wildcard_operator_normalizes() {
        let v17 = JavaSemver {
            major: 17,
            minor: 0,
            patch: 6,
        };
        let v21 = JavaSemver {
            major: 21,
            minor: 0,
            patch: 1,
        };
        let v8 = JavaSemver {
            major: 8,
            minor: 0,
            patch: 351,
        };

        assert!(satisfies_range(&v17, ">=17.x"));
        assert!(satisfies_range(&v21, ">=17.x"));
        assert!(!satisfies_range(&v8, ">=17.x"));

        assert!(satisfies_range(&v17, "^17.x"));
        assert!(!satisfies_range(&v21, "^17.x"));

        assert!(satisfies_range(&v8, "8.x"));
        assert!(!satisfies_range(&v17, "8.x"));
    }

    #[test]
    fn unparsable_range_admits_nothing() {
        let v = JavaSemver {
            major: 17,
            minor: 0,
            patch: 0,
        };
        assert!(!satisfies_range(&v, "not a range"));
    }

    #[test]
    fn default_range_heuristic() {
        assert_eq!(default_java_range("1.20.5"), (">=21.x", 21));
        assert_eq!(default_java_range("1.21"), (">=21.x", 21));
        assert_eq!(default_java_range("1.20.4"), (">=17.x", 17));
        assert_eq!(default_java_range("1.17"), (">=17.x", 17));
        assert_eq!(default_java_range("1.16.5"), ("8.x", 8));
        assert_eq!(default_java_range("1.12.2"), ("8.x", 8));
    }
}
