// ─── Worker Messages ───
// Typed messages crossing the parent↔child process channel, one JSON
// document per line with a `type` discriminator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parent → child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WorkerCommand {
    Validate {
        server_id: String,
        launcher_directory: PathBuf,
        common_directory: PathBuf,
        instance_directory: PathBuf,
        dev_mode: bool,
    },
    Download,
    Disconnect,
}

/// Child → parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WorkerReply {
    ValidateProgress { percent: u8 },
    ValidateComplete { invalid_count: usize },
    DownloadProgress { percent: u8 },
    DownloadComplete,
    Error { displayable: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_carry_a_type_discriminator() {
        let cmd = WorkerCommand::Validate {
            server_id: "main".into(),
            launcher_directory: PathBuf::from("/l"),
            common_directory: PathBuf::from("/c"),
            instance_directory: PathBuf::from("/i"),
            dev_mode: false,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""type":"validate""#));
        assert!(json.contains(r#""serverId":"main""#));
        assert!(json.contains(r#""devMode":false"#));

        let parsed: WorkerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn replies_round_trip() {
        for reply in [
            WorkerReply::ValidateProgress { percent: 40 },
            WorkerReply::ValidateComplete { invalid_count: 12 },
            WorkerReply::DownloadProgress { percent: 99 },
            WorkerReply::DownloadComplete,
            WorkerReply::Error {
                displayable: Some("algo salió mal".into()),
            },
        ] {
            let json = serde_json::to_string(&reply).unwrap();
            let parsed: WorkerReply = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, reply);
        }
    }

    #[test]
    fn unit_variants_parse_from_bare_type() {
        let parsed: WorkerCommand = serde_json::from_str(r#"{"type":"download"}"#).unwrap();
        assert_eq!(parsed, WorkerCommand::Download);
        let parsed: WorkerReply = serde_json::from_str(r#"{"type":"downloadComplete"}"#).unwrap();
        assert_eq!(parsed, WorkerReply::DownloadComplete);
    }
}
