use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::data::{NewReport, PotholeReport, Severity};
use super::images::ImageDir;
use super::store::ReportStore;
use crate::error::Result;

/// Everything needed to save one report besides the photo itself
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    pub address: Option<String>,
}

/// The Library keeps the report rows and their photos consistent.
///
/// A photo is written before its row is inserted, and removed again if the
/// insert fails. Clearing removes exactly the photos the cleared rows used.
pub struct Library {
    store: ReportStore,
    images: ImageDir,
}

impl Library {
    /// Open the library with the database at `db_path` and photos under `images_dir`.
    pub fn open(db_path: &Path, images_dir: &Path) -> Result<Self> {
        let store = ReportStore::open(db_path)?;
        let images = ImageDir::new(images_dir)?;
        Ok(Self::from_parts(store, images))
    }

    pub fn from_parts(store: ReportStore, images: ImageDir) -> Self {
        Self { store, images }
    }

    #[cfg(test)]
    pub fn images_dir(&self) -> &Path {
        self.images.root()
    }

    pub fn report_count(&self) -> Result<i64> {
        self.store.count()
    }

    /// All reports, newest first
    pub fn get_all_reports(&self) -> Result<Vec<PotholeReport>> {
        self.store.get_all_reports()
    }

    /// Write `photo` and insert the report that references it.
    /// If the insert fails the photo is removed again.
    pub fn save_report(&mut self, photo: &DynamicImage, draft: ReportDraft) -> Result<PotholeReport> {
        let image_path = self.images.write_jpeg(photo, draft.timestamp)?;

        let new_report = NewReport {
            timestamp: draft.timestamp,
            image_path: image_path.to_string_lossy().to_string(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            severity: draft.severity,
            address: draft.address,
        };

        let id = match self.store.insert(&new_report) {
            Ok(id) => id,
            Err(e) => {
                error!("❌ Insert failed, removing {}: {}", image_path.display(), e);
                self.images.remove_files([&image_path]);
                return Err(e);
            }
        };

        info!(
            "✅ Saved report #{} at {}, {}",
            id, new_report.latitude, new_report.longitude
        );

        Ok(PotholeReport {
            id,
            timestamp: new_report.timestamp,
            image_path: new_report.image_path,
            latitude: new_report.latitude,
            longitude: new_report.longitude,
            severity: new_report.severity,
            address: new_report.address,
        })
    }

    /// Delete every report and exactly the photos those reports referenced.
    /// Returns the number of reports removed.
    pub fn clear_all(&mut self) -> Result<usize> {
        let paths = self.store.clear_all()?;
        let removed = self.images.remove_files(&paths);
        info!("🗑️  Cleared {} reports and {} photos", paths.len(), removed);
        Ok(paths.len())
    }

    /// Startup consistency pass: drop photos no report references and
    /// count reports whose photo has gone missing.
    /// Returns (orphans removed, reports with missing photos).
    pub fn verify(&self) -> Result<(usize, usize)> {
        let referenced = self.store.image_paths()?;
        let orphans = self.images.sweep_orphans(&referenced);

        let missing = referenced
            .iter()
            .filter(|path| !PathBuf::from(path).exists())
            .count();
        if missing > 0 {
            warn!("⚠️  {} reports point at missing photos", missing);
        }

        Ok((orphans, missing))
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("store", &self.store)
            .field("images", &self.images.root())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(dir: &Path) -> Library {
        Library::from_parts(
            ReportStore::open_in_memory().unwrap(),
            ImageDir::new(dir.join("images")).unwrap(),
        )
    }

    fn draft(timestamp: i64) -> ReportDraft {
        ReportDraft {
            timestamp,
            latitude: 12.5,
            longitude: 77.1,
            severity: Severity::Medium,
            address: None,
        }
    }

    fn photo() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_save_report_writes_file_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());

        let report = library.save_report(&photo(), draft(1000)).unwrap();

        assert!(Path::new(&report.image_path).exists());
        assert!(report.image_path.ends_with("pothole_1000.jpg"));
        assert_eq!(report.address, None);
        assert_eq!(library.get_all_reports().unwrap(), vec![report]);
    }

    #[test]
    fn test_failed_insert_removes_photo() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        library
            .store
            .connection()
            .execute_batch("DROP TABLE pothole_reports")
            .unwrap();

        assert!(library.save_report(&photo(), draft(2000)).is_err());
        assert!(library.images.files().is_empty());
    }

    #[test]
    fn test_clear_all_removes_rows_and_their_photos() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        library.save_report(&photo(), draft(1)).unwrap();
        library.save_report(&photo(), draft(2)).unwrap();

        assert_eq!(library.clear_all().unwrap(), 2);

        assert!(library.get_all_reports().unwrap().is_empty());
        assert!(library.images.files().is_empty());
    }

    #[test]
    fn test_clear_all_leaves_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        library.save_report(&photo(), draft(1)).unwrap();
        let unrelated = library.images_dir().join("notes.txt");
        std::fs::write(&unrelated, b"keep me").unwrap();

        library.clear_all().unwrap();

        assert!(unrelated.exists());
    }

    #[test]
    fn test_verify_sweeps_orphans_and_counts_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        let kept = library.save_report(&photo(), draft(1)).unwrap();
        let lost = library.save_report(&photo(), draft(2)).unwrap();
        std::fs::remove_file(&lost.image_path).unwrap();
        library.images.write_jpeg(&photo(), 3).unwrap();

        assert_eq!(library.verify().unwrap(), (1, 1));
        assert!(Path::new(&kept.image_path).exists());
    }

    #[test]
    fn test_verify_with_relative_images_dir_keeps_photos() {
        let dir = tempfile::tempdir_in(".").unwrap();
        let mut library = Library::from_parts(
            ReportStore::open_in_memory().unwrap(),
            ImageDir::new(dir.path().join("data").join("images")).unwrap(),
        );
        let report = library.save_report(&photo(), draft(1)).unwrap();

        assert_eq!(library.verify().unwrap(), (0, 0));
        assert!(Path::new(&report.image_path).exists());
    }
}
