//! Application-private directory of report photos
//!
//! Photos are written as JPEG (quality 90) and named after the capture time:
//! `pothole_<epoch_millis>.jpg`.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// JPEG quality for saved report photos
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone)]
pub struct ImageDir {
    root: PathBuf,
}

impl ImageDir {
    /// Use `root` as the image directory, creating it if needed.
    /// A relative `root` is resolved against the working directory once, here.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = absolute(&root.into())?;
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the photo captured at `timestamp` lives
    pub fn path_for(&self, timestamp: i64) -> PathBuf {
        self.root.join(format!("pothole_{}.jpg", timestamp))
    }

    /// Encode `photo` as JPEG and write it for `timestamp`.
    /// Returns the absolute path of the written file.
    pub fn write_jpeg(&self, photo: &DynamicImage, timestamp: i64) -> Result<PathBuf> {
        let path = self.path_for(timestamp);

        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);
        // JPEG has no alpha channel
        let rgb = photo.to_rgb8();
        JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&rgb)?;
        out.flush()?;

        debug!("📸 Wrote photo: {}", path.display());
        Ok(path)
    }

    /// Best-effort delete of the given files. Returns how many were removed.
    pub fn remove_files<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut removed = 0;
        for path in paths {
            let path = path.as_ref();
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Photo already gone: {}", path.display());
                }
                Err(e) => warn!("⚠️  Could not delete {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Every file currently in the image directory
    pub fn files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    /// Delete report photos that no report references (left behind by an
    /// interrupted save). Returns how many were removed.
    ///
    /// Photos are matched by file name, so rows written before the data
    /// directory moved still protect their files. Anything not named like a
    /// report photo is left alone.
    pub fn sweep_orphans(&self, referenced: &[String]) -> usize {
        let referenced: HashSet<&OsStr> = referenced
            .iter()
            .filter_map(|path| Path::new(path).file_name())
            .collect();

        let orphans: Vec<PathBuf> = self
            .files()
            .into_iter()
            .filter(|path| is_report_photo(path))
            .filter(|path| path.file_name().is_some_and(|name| !referenced.contains(name)))
            .collect();

        if orphans.is_empty() {
            return 0;
        }

        let removed = self.remove_files(&orphans);
        info!("🧹 Removed {} orphaned photos", removed);
        removed
    }
}

/// `pothole_<epoch_millis>.jpg`
fn is_report_photo(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .and_then(|name| name.strip_prefix("pothole_"))
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .is_some_and(|millis| !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
