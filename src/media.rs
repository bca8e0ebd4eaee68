// The file handed to the state machine by the picker, plus media-type
// detection by extension.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A picked file: its name, declared media type and contents.
///
/// The bytes are shared so the upload worker and the preview can both hold
/// them without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::new(name, detect_media_type(path), bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        is_image(&self.media_type)
    }
}

// Contents can be megabytes; keep Debug output readable.
impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Declared media type for a path, by extension.
pub fn detect_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// File extension to use when materialising bytes of this media type.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/heic" => "heic",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Whether a media type belongs to the image category.
pub fn is_image(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Turn what the user typed into a path: trims whitespace and surrounding
/// quotes (terminals add them on drag-and-drop) and expands a leading `~`.
/// Returns `None` for blank input.
pub fn resolve_input_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim().trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "~" {
        return dirs::home_dir();
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Some(home.join(rest));
        }
    }
    Some(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn detects_common_image_types() {
        assert_eq!(detect_media_type(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(detect_media_type(Path::new("scan.png")), "image/png");
        assert_eq!(detect_media_type(Path::new("scan.tif")), "image/tiff");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(detect_media_type(Path::new("passport")), "application/octet-stream");
        assert!(!is_image(detect_media_type(Path::new("passport.xyz"))));
    }

    #[test]
    fn pdf_is_not_an_image() {
        assert!(!is_image(detect_media_type(Path::new("passport.pdf"))));
    }

    #[test]
    fn open_reads_bytes_and_type() {
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        tmp.write_all(b"\x89PNG fake").unwrap();

        let file = SelectedFile::open(tmp.path()).unwrap();
        assert_eq!(file.media_type(), "image/png");
        assert_eq!(file.len(), 9);
        assert!(file.is_image());
        assert!(file.name().ends_with(".png"));
    }

    #[test]
    fn open_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SelectedFile::open(&dir.path().join("nope.jpg")).is_err());
    }

    #[test]
    fn blank_input_is_no_path() {
        assert_eq!(resolve_input_path("   "), None);
        assert_eq!(resolve_input_path("''"), None);
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(
            resolve_input_path(" '/tmp/my passport.jpg' "),
            Some(PathBuf::from("/tmp/my passport.jpg"))
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolve_input_path("~/scan.jpg"), Some(home.join("scan.jpg")));
        }
    }

    #[test]
    fn debug_hides_contents() {
        let file = SelectedFile::new("a.jpg", "image/jpeg", vec![1u8, 2, 3]);
        let dbg = format!("{:?}", file);
        assert!(dbg.contains("len: 3"));
    }
}
