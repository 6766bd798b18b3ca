// ─── Archive extraction ───
// Zip archives are read through the central directory; tar.gz is streamed
// through gunzip into a tar reader. Both run on the blocking pool.

use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::info;

use crate::error::{CoreError, CoreResult};

/// Extract a zip archive into `dest`, creating it as needed.
pub async fn extract_zip(archive: &Path, dest: &Path) -> CoreResult<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive).map_err(|e| CoreError::io(&archive, e))?;
        let mut zip = zip::ZipArchive::new(file)?;
        std::fs::create_dir_all(&dest).map_err(|e| CoreError::io(&dest, e))?;
        zip.extract(&dest)?;
        info!("Extracted {} entries from {:?}", zip.len(), archive);
        Ok(())
    })
    .await
    .map_err(|e| CoreError::Other(format!("extract task failed: {e}")))?
}

/// Read a single named entry out of a zip archive.
pub async fn read_zip_entry(archive: &Path, entry: &str) -> CoreResult<Vec<u8>> {
    let archive = archive.to_path_buf();
    let entry = entry.to_string();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive).map_err(|e| CoreError::io(&archive, e))?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut reader = zip
            .by_name(&entry)
            .map_err(|e| CoreError::Archive(format!("missing {entry} in {archive:?}: {e}")))?;
        let mut bytes = Vec::with_capacity(reader.size() as usize);
        std::io::copy(&mut reader, &mut bytes).map_err(|e| CoreError::io(&archive, e))?;
        Ok(bytes)
    })
    .await
    .map_err(|e| CoreError::Other(format!("zip read task failed: {e}")))?
}

/// Extract a gzip-compressed tarball into `dest`.
pub async fn extract_tar_gz(archive: &Path, dest: &Path) -> CoreResult<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive).map_err(|e| CoreError::io(&archive, e))?;
        let gz = GzDecoder::new(file);
        let mut tar = tar::Archive::new(gz);
        std::fs::create_dir_all(&dest).map_err(|e| CoreError::io(&dest, e))?;
        tar.unpack(&dest).map_err(|e| CoreError::io(&dest, e))?;
        info!("Extracted {:?} into {:?}", archive, dest);
        Ok(())
    })
    .await
    .map_err(|e| CoreError::Other(format!("extract task failed: {e}")))?
}

/// First top-level directory name inside an archive, without extracting it.
///
/// JDK archives wrap their payload in a single versioned root directory;
/// the installer needs its name to locate the Java executable afterwards.
pub async fn first_top_level_dir(archive: &Path) -> CoreResult<String> {
    let path = archive.to_path_buf();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        return first_zip_dir(&path).await;
    }
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        return first_tar_gz_dir(&path).await;
    }
    Err(CoreError::Archive(format!(
        "unsupported archive format: {name}"
    )))
}

async fn first_zip_dir(archive: &PathBuf) -> CoreResult<String> {
    let archive = archive.clone();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive).map_err(|e| CoreError::io(&archive, e))?;
        let zip = zip::ZipArchive::new(file)?;
        for name in zip.file_names() {
            if let Some(root) = root_component(name) {
                return Ok(root);
            }
        }
        Err(CoreError::Archive(format!("empty archive: {archive:?}")))
    })
    .await
    .map_err(|e| CoreError::Other(format!("zip scan task failed: {e}")))?
}

async fn first_tar_gz_dir(archive: &PathBuf) -> CoreResult<String> {
    let archive = archive.clone();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive).map_err(|e| CoreError::io(&archive, e))?;
        let gz = GzDecoder::new(file);
        let mut tar = tar::Archive::new(gz);
        for entry in tar.entries().map_err(|e| CoreError::io(&archive, e))? {
            let entry = entry.map_err(|e| CoreError::io(&archive, e))?;
            let path = entry.path().map_err(|e| CoreError::io(&archive, e))?;
            if let Some(root) = root_component(&path.to_string_lossy()) {
                return Ok(root);
            }
        }
        Err(CoreError::Archive(format!("empty archive: {archive:?}")))
    })
    .await
    .map_err(|e| CoreError::Other(format!("tar scan task failed: {e}")))?
}

fn root_component(entry_name: &str) -> Option<String> {
    let path = Path::new(entry_name);
    match path.components().next() {
        Some(Component::Normal(c)) => {
            let root = c.to_string_lossy().to_string();
            // A bare top-level file does not name the payload directory
            if entry_name.trim_end_matches('/').contains('/') || entry_name.ends_with('/') {
                Some(root)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(entries: &[(&str, &[u8])]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn zip_round_trip() {
        let (dir, path) = build_zip(&[("jdk-17/bin/java", b"x"), ("jdk-17/release", b"y")]);
        let dest = dir.path().join("out");
        extract_zip(&path, &dest).await.unwrap();
        assert!(dest.join("jdk-17/bin/java").exists());
        assert!(dest.join("jdk-17/release").exists());
    }

    #[tokio::test]
    async fn zip_entry_read() {
        let (_dir, path) = build_zip(&[("version.json", br#"{"id":"1.20.4-forge"}"#)]);
        let bytes = read_zip_entry(&path, "version.json").await.unwrap();
        assert_eq!(bytes, br#"{"id":"1.20.4-forge"}"#);
    }

    #[tokio::test]
    async fn missing_zip_entry_is_an_archive_error() {
        let (_dir, path) = build_zip(&[("a.txt", b"a")]);
        let err = read_zip_entry(&path, "version.json").await.unwrap_err();
        assert_eq!(err.kind(), "archive");
    }

    #[tokio::test]
    async fn top_level_dir_of_zip() {
        let (_dir, path) = build_zip(&[("jdk-17.0.6+9/bin/java", b"x")]);
        let root = first_top_level_dir(&path).await.unwrap();
        assert_eq!(root, "jdk-17.0.6+9");
    }

    #[tokio::test]
    async fn tar_gz_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.tar.gz");

        let file = std::fs::File::create(&path).unwrap();
        let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_size(1);
        header.set_cksum();
        builder
            .append_data(&mut header, "amazon-corretto-21/bin/java", &b"x"[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let root = first_top_level_dir(&path).await.unwrap();
        assert_eq!(root, "amazon-corretto-21");

        let dest = dir.path().join("out");
        extract_tar_gz(&path, &dest).await.unwrap();
        assert!(dest.join("amazon-corretto-21/bin/java").exists());
    }
}
