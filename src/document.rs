//! Documents picked by the user for summarization.
//!
//! The picker hands over `{ uri, name, type }`; here the uri is a local path,
//! the bytes are read and base64-encoded, and `type` becomes the mime type.

use crate::Result;
use base64::Engine as _;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Document {
    /// Build a document, detecting the mime type when none is given.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>, mime_type: Option<&str>) -> Self {
        let name = name.into();
        let mime_type = match mime_type {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => detect_document_mime(&name, &data).to_string(),
        };

        Self {
            name,
            mime_type,
            data,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>, mime_type: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!("Read document {} ({} bytes)", name, data.len());
        Ok(Self::from_bytes(name, data, mime_type))
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Sniff magic bytes first, then the file extension.
pub fn detect_document_mime(name: &str, bytes: &[u8]) -> &'static str {
    match bytes {
        [0x25, 0x50, 0x44, 0x46, ..] => return "application/pdf",
        [0xFF, 0xD8, 0xFF, ..] => return "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => return "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => return "image/webp",
        _ => {}
    }

    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        _ => {
            tracing::warn!(
                "Unrecognized document format for {} (first 4 bytes: {:02X?}), falling back to text/plain",
                name,
                &bytes[..bytes.len().min(4)]
            );
            "text/plain"
        }
    }
}
