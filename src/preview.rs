// Preview reference for a selected image.
//
// A [`Preview`] is a temporary file holding a copy of the image. Its path is
// the reference the view displays; dropping the preview deletes the file, so
// the resource is reclaimed exactly once, whenever the owner lets go of it.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::media::{extension_for, SelectedFile};

#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl Preview {
    /// Materialise a preview for `file`. Returns `Ok(None)` for non-image
    /// media types.
    pub fn for_file(file: &SelectedFile) -> std::io::Result<Option<Self>> {
        if !file.is_image() {
            return Ok(None);
        }
        let suffix = format!(".{}", extension_for(file.media_type()));
        let mut tmp = tempfile::Builder::new()
            .prefix("passport-preview-")
            .suffix(&suffix)
            .tempfile()?;
        tmp.write_all(file.bytes())?;
        tmp.flush()?;
        debug!(path = %tmp.path().display(), "preview created");
        Ok(Some(Self {
            file: tmp,
            media_type: file.media_type().to_string(),
            bytes: Arc::clone(file.bytes()),
        }))
    }

    /// Locally resolvable location of the preview bytes.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Escape sequence that draws the image inline on terminals speaking the
    /// iTerm2 image protocol (iTerm2, WezTerm).
    pub fn inline_escape(&self) -> String {
        let name = self
            .path()
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("preview");
        format!(
            "\x1b]1337;File=name={};size={};width=40;preserveAspectRatio=1;inline=1:{}\x07",
            STANDARD.encode(name),
            self.bytes.len(),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        debug!(path = %self.file.path().display(), "preview released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> SelectedFile {
        SelectedFile::new("passport.jpg", "image/jpeg", b"\xff\xd8\xff jpeg".to_vec())
    }

    #[test]
    fn image_gets_a_preview_file() {
        let preview = Preview::for_file(&image()).unwrap().expect("image preview");
        assert!(preview.path().exists());
        assert_eq!(std::fs::read(preview.path()).unwrap(), b"\xff\xd8\xff jpeg");
        assert_eq!(preview.path().extension().unwrap(), "jpg");
        assert_eq!(preview.media_type(), "image/jpeg");
    }

    #[test]
    fn non_image_has_no_preview() {
        let pdf = SelectedFile::new("passport.pdf", "application/pdf", b"%PDF".to_vec());
        assert!(Preview::for_file(&pdf).unwrap().is_none());
    }

    #[test]
    fn dropping_releases_the_file() {
        let preview = Preview::for_file(&image()).unwrap().unwrap();
        let path = preview.path().to_path_buf();
        drop(preview);
        assert!(!path.exists());
    }

    #[test]
    fn inline_escape_carries_base64_payload() {
        let preview = Preview::for_file(&image()).unwrap().unwrap();
        let seq = preview.inline_escape();
        assert!(seq.starts_with("\x1b]1337;File="));
        assert!(seq.ends_with(&format!(":{}\x07", STANDARD.encode(b"\xff\xd8\xff jpeg"))));
        assert!(seq.contains("size=8;"));
    }
}
