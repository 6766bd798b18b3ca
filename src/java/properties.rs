// ─── HotSpot Property Introspection ───
// `java -XshowSettings:properties -version` prints the property table to
// stderr in two indent levels: four spaces for `key = value`, eight for
// continuation lines extending the previous key into a list.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Keys that are lists even when they show up with a single value.
const LIST_VALUED_KEYS: [&str; 2] = ["java.library.path", "sun.boot.class.path"];

/// Parsed property table of one JVM candidate.
#[derive(Debug, Default, Clone)]
pub struct HotSpotProperties {
    values: HashMap<String, Vec<String>>,
}

impl HotSpotProperties {
    /// First (or only) value of a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.first().map(String::as_str)
    }

    /// All values of a list-valued property.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Spawn the executable and parse its settings dump.
pub async fn introspect(executable: &Path) -> CoreResult<HotSpotProperties> {
    let output = tokio::process::Command::new(executable)
        .arg("-XshowSettings:properties")
        .arg("-version")
        .output()
        .await
        .map_err(|e| CoreError::JavaExecution(format!("{executable:?}: {e}")))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let properties = parse_properties(&stderr);
    if properties.is_empty() {
        debug!("{:?} produced no property table", executable);
    }
    Ok(properties)
}

/// Parse the two-indent property grammar.
pub fn parse_properties(text: &str) -> HotSpotProperties {
    let mut values: HashMap<String, Vec<String>> = HashMap::new();
    let mut current_key: Option<String> = None;

    for line in text.lines() {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if indent == 8 {
            // Continuation of the previous key
            if let Some(key) = &current_key {
                if let Some(list) = values.get_mut(key) {
                    list.push(trimmed.to_string());
                }
            }
            continue;
        }

        if indent == 4 {
            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().to_string();
                values.insert(key.clone(), vec![value]);
                current_key = Some(key);
                continue;
            }
        }

        // Anything else (banner, version lines) ends the table context
        current_key = None;
    }

    // Normalize known list keys even when a single value was printed
    for key in LIST_VALUED_KEYS {
        if let Some(list) = values.get_mut(key) {
            let split: Vec<String> = list
                .iter()
                .flat_map(|v| v.split(path_separator()).map(str::to_string))
                .filter(|v| !v.is_empty())
                .collect();
            *list = split;
        }
    }

    HotSpotProperties { values }
}

fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Property settings:\n    java.home = /usr/lib/jvm/jdk-17\n    java.library.path = /usr/java/packages/lib\n        /usr/lib64\n        /lib64\n    java.vendor = Eclipse Adoptium\n    java.version = 17.0.6\n    os.arch = amd64\n    sun.arch.data.model = 64\nopenjdk version \"17.0.6\" 2023-01-17\n";

    #[test]
    fn single_valued_keys_parse() {
        let props = parse_properties(SAMPLE);
        assert_eq!(props.get("java.vendor"), Some("Eclipse Adoptium"));
        assert_eq!(props.get("java.version"), Some("17.0.6"));
        assert_eq!(props.get("sun.arch.data.model"), Some("64"));
        assert_eq!(props.get("nonexistent"), None);
    }

    #[test]
    fn continuation_lines_extend_the_previous_key() {
        let props = parse_properties(SAMPLE);
        let paths = props.get_all("java.library.path").unwrap();
        assert_eq!(paths, ["/usr/java/packages/lib", "/usr/lib64", "/lib64"]);
    }

    #[test]
    fn known_list_key_with_single_value_is_still_a_list() {
        let text = "Property settings:\n    java.library.path = /only/one\n    java.version = 21.0.1\n";
        let props = parse_properties(text);
        assert_eq!(props.get_all("java.library.path").unwrap(), ["/only/one"]);
        // Single-valued keys stay single
        assert_eq!(props.get_all("java.version").unwrap().len(), 1);
    }

    #[test]
    fn banner_lines_are_ignored() {
        let props = parse_properties("no property table here\njust version output\n");
        assert!(props.is_empty());
    }

    #[test]
    fn values_containing_equals_survive() {
        let text = "    some.key = a=b=c\n";
        let props = parse_properties(text);
        assert_eq!(props.get("some.key"), Some("a=b=c"));
    }
}
