use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use tempfile::NamedTempFile;
use thiserror::Error;
use watch_logging::watch_info;

use crate::api::map_reqwest_error;
use crate::TransportError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to write artifact named {0:?}")]
    UnsafeName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), DownloadError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| DownloadError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(DownloadError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| DownloadError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes the body to a temp file next to the target, then renames it in
/// place so a failed transfer never leaves a partial artifact behind.
pub(crate) async fn write_stream(
    response: reqwest::Response,
    dest_dir: &Path,
    name: &str,
) -> Result<PathBuf, DownloadError> {
    let file_name = safe_file_name(name)?;
    ensure_output_dir(dest_dir)?;

    let target = dest_dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dest_dir)?;
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(map_reqwest_error)?;
        tmp.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    // Replace existing file if present.
    if target.exists() {
        fs::remove_file(&target)?;
    }
    tmp.persist(&target).map_err(|e| DownloadError::Io(e.error))?;
    watch_info!("Saved {} ({} bytes) to {:?}", name, written, target);
    Ok(target)
}

/// Artifact names come from the server listing; only a bare file name is
/// accepted as a local path.
fn safe_file_name(name: &str) -> Result<&str, DownloadError> {
    let path = Path::new(name);
    match path.file_name().and_then(|n| n.to_str()) {
        Some(file_name) if file_name == name && !name.starts_with('.') => Ok(file_name),
        _ => Err(DownloadError::UnsafeName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bare_visible_names_are_accepted() {
        assert!(safe_file_name("clip.mp4").is_ok());
        assert!(safe_file_name("My Clip (1).mp3").is_ok());
        assert!(safe_file_name("../etc/passwd").is_err());
        assert!(safe_file_name("sub/clip.mp4").is_err());
        assert!(safe_file_name(".hidden").is_err());
        assert!(safe_file_name("").is_err());
    }
}
