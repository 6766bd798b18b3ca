// ─── Java Discovery ───
// Small polymorphic strategies, each answering "which directories might be
// Java roots here". Per-OS composition picks the set that makes sense.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Relative path from a Java root to its launch executable.
pub fn java_exec_suffix() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("bin").join("javaw.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("Contents/Home/bin/java")
    } else {
        PathBuf::from("bin/java")
    }
}

fn is_java_root(candidate: &Path) -> bool {
    candidate.join(java_exec_suffix()).is_file()
}

pub trait DiscoveryStrategy: Send {
    fn discover(&self) -> HashSet<PathBuf>;
}

// ── Path-based ──────────────────────────────────────────

/// Tests a fixed list of absolute paths.
pub struct PathBasedDiscovery {
    paths: Vec<PathBuf>,
}

impl PathBasedDiscovery {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl DiscoveryStrategy for PathBasedDiscovery {
    fn discover(&self) -> HashSet<PathBuf> {
        self.paths
            .iter()
            .filter(|p| is_java_root(p))
            .cloned()
            .collect()
    }
}

// ── Directory-based ─────────────────────────────────────

/// Lists each given directory and tests every child.
pub struct DirectoryBasedDiscovery {
    directories: Vec<PathBuf>,
}

impl DirectoryBasedDiscovery {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }
}

impl DiscoveryStrategy for DirectoryBasedDiscovery {
    fn discover(&self) -> HashSet<PathBuf> {
        let mut found = HashSet::new();
        for dir in &self.directories {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let child = entry.path();
                if is_java_root(&child) {
                    found.insert(child);
                }
            }
        }
        found
    }
}

// ── Environment-based ───────────────────────────────────

const ENV_KEYS: [&str; 3] = ["JAVA_HOME", "JRE_HOME", "JDK_HOME"];

/// Reads the conventional environment variables, tolerating values that
/// point at the executable instead of the root.
pub struct EnvironmentBasedDiscovery;

impl DiscoveryStrategy for EnvironmentBasedDiscovery {
    fn discover(&self) -> HashSet<PathBuf> {
        let mut found = HashSet::new();
        for key in ENV_KEYS {
            let Ok(value) = std::env::var(key) else {
                continue;
            };
            let root = strip_exec_suffix(Path::new(&value));
            debug!("{key} -> {:?}", root);
            if is_java_root(&root) {
                found.insert(root);
            }
        }
        found
    }
}

fn strip_exec_suffix(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    let is_exec = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| matches!(n, "java" | "java.exe" | "javaw.exe"))
        .unwrap_or(false);
    if is_exec {
        path.pop();
    }
    let is_bin = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == "bin")
        .unwrap_or(false);
    if is_bin {
        path.pop();
    }
    path
}

// ── Registry-based (Windows) ────────────────────────────

#[cfg(windows)]
pub struct RegistryBasedDiscovery;

#[cfg(windows)]
impl DiscoveryStrategy for RegistryBasedDiscovery {
    fn discover(&self) -> HashSet<PathBuf> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        const REGISTRY_KEYS: [&str; 4] = [
            r"SOFTWARE\JavaSoft\Java Runtime Environment",
            r"SOFTWARE\JavaSoft\Java Development Kit",
            r"SOFTWARE\JavaSoft\JRE",
            r"SOFTWARE\JavaSoft\JDK",
        ];

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let mut found = HashSet::new();

        for key_path in REGISTRY_KEYS {
            let Ok(key) = hklm.open_subkey(key_path) else {
                continue;
            };
            for version in key.enum_keys().flatten() {
                let Ok(version_key) = key.open_subkey(&version) else {
                    continue;
                };
                let Ok(home) = version_key.get_value::<String, _>("JavaHome") else {
                    continue;
                };
                // 32-bit installs advertise themselves under (x86)
                if home.contains("(x86)") {
                    continue;
                }
                let root = PathBuf::from(home);
                if is_java_root(&root) {
                    found.insert(root);
                }
            }
        }
        found
    }
}

// ── Per-OS composition ──────────────────────────────────

/// Strategies appropriate for the host platform. `runtime_dir` is the
/// launcher-managed runtime tree; it is always swept.
pub fn platform_strategies(runtime_dir: &Path) -> Vec<Box<dyn DiscoveryStrategy>> {
    #[cfg(target_os = "windows")]
    {
        const PROGRAM_DIRS: [&str; 5] = [
            "Program Files\\Java",
            "Program Files\\Eclipse Adoptium",
            "Program Files\\Eclipse Foundation",
            "Program Files\\AdoptOpenJDK",
            "Program Files\\Amazon Corretto",
        ];

        let mut directories: Vec<PathBuf> = Vec::new();
        for root in drive_roots() {
            for dir in PROGRAM_DIRS {
                directories.push(root.join(dir));
            }
        }
        directories.push(runtime_dir.to_path_buf());

        vec![
            Box::new(EnvironmentBasedDiscovery),
            Box::new(DirectoryBasedDiscovery::new(directories)),
            Box::new(RegistryBasedDiscovery),
        ]
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            Box::new(EnvironmentBasedDiscovery),
            Box::new(DirectoryBasedDiscovery::new(vec![
                PathBuf::from("/Library/Java/JavaVirtualMachines"),
                runtime_dir.to_path_buf(),
            ])),
            Box::new(PathBasedDiscovery::new(vec![PathBuf::from(
                "/Library/Internet Plug-Ins/JavaAppletPlugin.plugin/Contents/Home",
            )])),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            Box::new(EnvironmentBasedDiscovery),
            Box::new(DirectoryBasedDiscovery::new(vec![
                PathBuf::from("/usr/lib/jvm"),
                runtime_dir.to_path_buf(),
            ])),
        ]
    }
}

/// Every mounted file-system root, `A:\` through `Z:\`.
#[cfg(target_os = "windows")]
fn drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.exists())
        .collect()
}

/// Run every strategy and merge the candidate sets.
pub fn discover_candidates(strategies: &[Box<dyn DiscoveryStrategy>]) -> HashSet<PathBuf> {
    let mut all = HashSet::new();
    for strategy in strategies {
        all.extend(strategy.discover());
    }
    all
}
