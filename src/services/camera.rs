//! Photo capture
//!
//! On the desktop "taking a photo" means picking an image file with the
//! native dialog. Decoding runs on the blocking pool like every other
//! CPU-heavy job.

use image::DynamicImage;
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

/// Extensions offered in the picker
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Largest edge kept in memory; bigger photos are scaled down before saving
const MAX_EDGE: u32 = 2048;

/// Show the native picker. `None` means the user cancelled.
pub fn pick_photo() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Capture Pothole Photo")
        .add_filter("Photos", PHOTO_EXTENSIONS)
        .pick_file()
}

/// Decode the picked photo off the interactive thread
pub async fn decode_photo(path: PathBuf) -> Result<Arc<DynamicImage>, String> {
    task::spawn_blocking(move || decode_photo_blocking(&path))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

fn decode_photo_blocking(path: &Path) -> Result<Arc<DynamicImage>, String> {
    let photo = image::open(path).map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?;

    info!(
        "📷 Captured photo {}x{} from {}",
        photo.width(),
        photo.height(),
        path.display()
    );

    let photo = if photo.width() > MAX_EDGE || photo.height() > MAX_EDGE {
        debug!("Scaling photo down to {}px", MAX_EDGE);
        photo.thumbnail(MAX_EDGE, MAX_EDGE)
    } else {
        photo
    };

    Ok(Arc::new(photo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_file_fails() {
        assert!(decode_photo_blocking(Path::new("/nonexistent/pothole.jpg")).is_err());
    }

    #[test]
    fn test_decode_scales_large_photos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        DynamicImage::new_rgb8(4096, 1024).save(&path).unwrap();

        let photo = decode_photo_blocking(&path).unwrap();

        assert_eq!(photo.width(), MAX_EDGE);
        assert_eq!(photo.height(), 512);
    }
}
