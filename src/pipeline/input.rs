//! Input resolution: normalise a user-supplied path or URL to PDF bytes.
//!
//! The rest of the pipeline works from an in-memory byte buffer (workers
//! reopen the document from it), so resolution always ends in `Vec<u8>`.
//! The `%PDF` magic is validated up front — callers get a meaningful error
//! instead of a pdfium parse failure deep inside a worker.

use crate::error::ExtractError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Validate the `%PDF` magic at the head of the buffer.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic[..bytes.len().min(4)].copy_from_slice(&bytes[..bytes.len().min(4)]);
        return Err(ExtractError::NotAPdf { magic });
    }
    Ok(())
}

/// Resolve the input string to raw PDF bytes.
///
/// If the input is a URL, download it (bounded by `timeout_secs`).
/// If the input is a local file, read it, mapping the usual I/O failures
/// to their dedicated error variants.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, ExtractError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::FileNotFound { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => return Err(ExtractError::FileNotFound { path }),
    };

    check_pdf_magic(&bytes)?;
    debug!("resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ExtractError> {
    info!("downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    check_pdf_magic(&bytes)?;
    info!("downloaded {} bytes", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/roll.pdf"));
        assert!(is_url("http://example.com/roll.pdf"));
        assert!(!is_url("/tmp/roll.pdf"));
        assert!(!is_url("roll.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic(b"%PDF-1.7\n...").is_ok());
        assert!(check_pdf_magic(b"PK\x03\x04").is_err());
        assert!(check_pdf_magic(b"").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/no/such/file.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }
}
