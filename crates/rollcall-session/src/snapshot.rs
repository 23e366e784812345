//! Snapshot evidence — one face crop saved per new log entry.

use chrono::NaiveDate;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Snapshot filename: roll number, date, and capture epoch second.
///
/// Collisions at 1-second granularity are accepted as negligible.
pub fn snapshot_path(base: &Path, date: NaiveDate, roll_number: &str, epoch: i64) -> PathBuf {
    base.join(date.format("%d-%m-%Y").to_string())
        .join(format!("{roll_number}_{}_{epoch}.png", date.format("%d-%m-%Y")))
}

/// Write a face crop under the per-day snapshot directory, creating the
/// directory on demand. Returns the path written.
pub fn write_snapshot(
    base: &Path,
    date: NaiveDate,
    roll_number: &str,
    epoch: i64,
    crop: &RgbImage,
) -> Result<PathBuf, SnapshotError> {
    let path = snapshot_path(base, date, roll_number, epoch);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    crop.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_path_layout() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let path = snapshot_path(Path::new("Snapshots"), date, "101", 1_787_000_000);
        assert_eq!(
            path,
            Path::new("Snapshots/27-08-2026/101_27-08-2026_1787000000.png")
        );
    }

    #[test]
    fn test_write_snapshot_creates_day_directory() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let crop = RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]));
        let path = write_snapshot(dir.path(), date, "101", 1000, &crop).unwrap();
        assert!(path.exists());
        assert!(path.parent().unwrap().ends_with("27-08-2026"));
    }
}
