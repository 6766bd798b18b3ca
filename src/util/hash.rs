// ─── File hashing ───
// Streaming digests over on-disk files. Large game assets are hashed in
// chunks on the blocking pool so async tasks keep making progress.

use std::io::Read;
use std::path::{Path, PathBuf};

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::asset::HashAlgorithm;
use crate::error::{CoreError, CoreResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash a file with the given algorithm, returning the lower-case hex digest.
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> CoreResult<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_file_sync(&path, algorithm))
        .await
        .map_err(|e| CoreError::Other(format!("hash task failed: {e}")))?
}

fn hash_file_sync(path: &PathBuf, algorithm: HashAlgorithm) -> CoreResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| CoreError::io(path.clone(), e))?;
    let mut buf = vec![0u8; CHUNK_SIZE];

    match algorithm {
        HashAlgorithm::Sha1 => stream_into(&mut file, Sha1::new(), &mut buf, path),
        HashAlgorithm::Sha256 => stream_into(&mut file, Sha256::new(), &mut buf, path),
        HashAlgorithm::Md5 => stream_into(&mut file, Md5::new(), &mut buf, path),
    }
}

fn stream_into<D: Digest>(
    file: &mut std::fs::File,
    mut hasher: D,
    buf: &mut [u8],
    path: &Path,
) -> CoreResult<String> {
    loop {
        let read = file.read(buf).map_err(|e| CoreError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash an in-memory buffer. Used to validate a downloaded body before it
/// ever touches the disk.
pub fn hash_bytes(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
    }
}

/// `true` iff the file exists and its digest matches `expected`.
///
/// A missing file is simply invalid, not an error; IO failures mid-read
/// still propagate.
pub async fn validate_local_file(
    path: &Path,
    algorithm: HashAlgorithm,
    expected: &str,
) -> CoreResult<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let actual = hash_file(path, algorithm).await?;
    Ok(actual == expected.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("file.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn sha1_of_known_content() {
        let (_dir, path) = write_temp(b"hello world");
        let digest = hash_file(&path, HashAlgorithm::Sha1).await.unwrap();
        assert_eq!(digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[tokio::test]
    async fn md5_of_known_content() {
        let (_dir, path) = write_temp(b"hello world");
        let digest = hash_file(&path, HashAlgorithm::Md5).await.unwrap();
        assert_eq!(digest, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[tokio::test]
    async fn sha256_of_known_content() {
        let (_dir, path) = write_temp(b"hello world");
        let digest = hash_file(&path, HashAlgorithm::Sha256).await.unwrap();
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn bytes_and_file_agree() {
        let digest = hash_bytes(b"hello world", HashAlgorithm::Sha1);
        assert_eq!(digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[tokio::test]
    async fn validate_accepts_uppercase_expected() {
        let (_dir, path) = write_temp(b"hello world");
        let ok = validate_local_file(
            &path,
            HashAlgorithm::Sha1,
            "2AAE6C35C94FCFB415DBE95F408B9CE91EE846ED",
        )
        .await
        .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn validate_missing_file_is_false() {
        let dir = tempfile::TempDir::new().unwrap();
        let ok = validate_local_file(&dir.path().join("nope"), HashAlgorithm::Sha1, "00")
            .await
            .unwrap();
        assert!(!ok);
    }
}
