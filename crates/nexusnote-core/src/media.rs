use uuid::Uuid;

use crate::block::BlockType;
use crate::error::NexusError;

const MIB: u64 = 1024 * 1024;

/// File-backed block kinds and their upload rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
}

impl MediaKind {
    pub fn for_block(kind: BlockType) -> Option<Self> {
        match kind {
            BlockType::Image => Some(MediaKind::Image),
            BlockType::Pdf => Some(MediaKind::Pdf),
            _ => None,
        }
    }

    /// Kind implied by an upload's MIME type
    pub fn for_mime(mime: &str) -> Option<Self> {
        [MediaKind::Image, MediaKind::Pdf]
            .into_iter()
            .find(|kind| kind.accepts(mime))
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            MediaKind::Image => BlockType::Image,
            MediaKind::Pdf => BlockType::Pdf,
        }
    }

    /// Largest accepted upload in bytes
    pub fn max_size(&self) -> u64 {
        match self {
            MediaKind::Image => 5 * MIB,
            MediaKind::Pdf => 10 * MIB,
        }
    }

    fn accepts(&self, mime: &str) -> bool {
        match self {
            MediaKind::Image => mime.starts_with("image/"),
            MediaKind::Pdf => mime == "application/pdf",
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/*",
            MediaKind::Pdf => "application/pdf",
        }
    }

    /// Check MIME type and size before uploading
    pub fn validate(&self, mime: &str, size: u64) -> Result<(), NexusError> {
        if !self.accepts(mime) {
            return Err(NexusError::UnsupportedFileType {
                mime: mime.to_string(),
                expected: self.expected(),
            });
        }
        if size > self.max_size() {
            return Err(NexusError::FileTooLarge {
                size,
                limit: self.max_size(),
            });
        }
        Ok(())
    }
}

/// Extension a stored file gets for its MIME type.
///
/// Stored files are served by extension, so the client's file name never
/// picks it. Image subtypes without a fixed mapping are kept as opaque bytes.
pub fn file_extension(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Storage key for an upload: `<user>/<millis>.<ext>`
pub fn storage_path(user_id: Uuid, mime_type: &str, timestamp_millis: i64) -> String {
    format!(
        "{}/{}.{}",
        user_id,
        timestamp_millis,
        file_extension(mime_type)
    )
}

/// Human readable size: `512 B`, `1.5 KB`, `2.0 MB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_rules() {
        assert!(MediaKind::Image.validate("image/png", 1024).is_ok());
        assert!(MediaKind::Image.validate("image/jpeg", 5 * MIB).is_ok());
        assert_eq!(
            MediaKind::Image.validate("image/png", 5 * MIB + 1),
            Err(NexusError::FileTooLarge {
                size: 5 * MIB + 1,
                limit: 5 * MIB
            })
        );
        assert!(matches!(
            MediaKind::Image.validate("application/pdf", 10),
            Err(NexusError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_pdf_rules() {
        assert!(MediaKind::Pdf.validate("application/pdf", 9 * MIB).is_ok());
        assert!(MediaKind::Pdf.validate("application/pdf", 11 * MIB).is_err());
        assert!(MediaKind::Pdf.validate("image/png", 10).is_err());
    }

    #[test]
    fn test_storage_path() {
        let user = Uuid::nil();
        assert_eq!(
            storage_path(user, "application/pdf", 1700000000000),
            "00000000-0000-0000-0000-000000000000/1700000000000.pdf"
        );
        assert!(storage_path(user, "image/jpeg", 1).ends_with("/1.jpg"));
    }

    #[test]
    fn test_extension_follows_mime_type() {
        assert_eq!(file_extension("image/png"), "png");
        assert_eq!(file_extension("image/webp"), "webp");
        // Markup-capable image types are never stored under their own extension
        assert_eq!(file_extension("image/svg+xml"), "bin");
        assert_eq!(file_extension("text/html"), "bin");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * MIB), "2.0 MB");
    }

    #[test]
    fn test_for_block() {
        assert_eq!(MediaKind::for_block(BlockType::Pdf), Some(MediaKind::Pdf));
        assert_eq!(MediaKind::for_block(BlockType::Canvas), None);
        assert_eq!(MediaKind::Image.block_type(), BlockType::Image);
        assert_eq!(MediaKind::for_mime("image/webp"), Some(MediaKind::Image));
        assert_eq!(MediaKind::for_mime("text/plain"), None);
    }
}
