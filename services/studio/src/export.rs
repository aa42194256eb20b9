//! services/studio/src/export.rs
//!
//! Writes a story to a directory: the JSON snapshot plus one file per inline
//! page image. Pages whose image is a render URL keep the URL in the snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use kidsmart_core::{ImageRef, Story};
use tracing::{debug, warn};

use crate::error::StudioError;

/// Splits a `data:` URI into its mime type and decoded bytes.
pub fn decode_inline(image: &ImageRef) -> Option<(String, Vec<u8>)> {
    let rest = image.as_str().strip_prefix("data:")?;
    let (mime, data) = rest.split_once(";base64,")?;
    match STANDARD.decode(data) {
        Ok(bytes) => Some((mime.to_string(), bytes)),
        Err(e) => {
            warn!(error = %e, "inline image is not valid base64");
            None
        }
    }
}

fn extension(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Returns every file written, snapshot first.
pub fn export_story(story: &Story, dir: &Path) -> Result<Vec<PathBuf>, StudioError> {
    fs::create_dir_all(dir)?;

    let snapshot = dir.join("story.json");
    let json = serde_json::to_string_pretty(story)
        .map_err(|e| StudioError::Internal(format!("story snapshot: {e}")))?;
    fs::write(&snapshot, json)?;
    let mut written = vec![snapshot];

    for (index, page) in story.pages.iter().enumerate() {
        let Some((mime, bytes)) = page.image_ref.as_ref().and_then(decode_inline) else {
            continue;
        };
        let path = dir.join(format!("page-{}.{}", index + 1, extension(&mime)));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "page image exported");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidsmart_core::StoryPage;

    #[test]
    fn inline_pages_become_files() {
        let mut drawn = StoryPage::new("Trang một", "a rabbit");
        drawn.image_ref = Some(ImageRef::inline("image/jpeg", &STANDARD.encode(b"jpeg-bytes")));
        let mut linked = StoryPage::new("Trang hai", "a school");
        linked.image_ref = Some(ImageRef::url("https://pollinations.ai/p/x"));
        let blank = StoryPage::new("Trang ba", "a garden");
        let story = Story::new("Bé Thỏ đi học", vec![drawn, linked, blank]);

        let dir = tempfile::tempdir().unwrap();
        let written = export_story(&story, dir.path()).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(dir.path().join("page-1.jpg")).unwrap(), b"jpeg-bytes");
        let snapshot = fs::read_to_string(dir.path().join("story.json")).unwrap();
        assert!(snapshot.contains("https://pollinations.ai/p/x"));
    }

    #[test]
    fn urls_and_garbage_are_not_decoded() {
        assert!(decode_inline(&ImageRef::url("https://img/1")).is_none());
        assert!(decode_inline(&ImageRef::inline("image/png", "@@not base64@@")).is_none());
    }
}
