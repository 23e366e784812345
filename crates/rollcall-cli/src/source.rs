//! Directory-backed frame source.
//!
//! The live camera is an external collaborator; this binding replays image
//! files from a directory in sorted order, which is enough to drive both
//! enrollment and recognition end to end.

use image::RgbImage;
use rollcall_core::capture::{CaptureError, FrameSource};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays the image files of a directory as a frame stream.
#[derive(Debug)]
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    /// Scan `dir` for image files, sorted by filename.
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        if !dir.is_dir() {
            return Err(CaptureError::SourceNotFound(dir.display().to_string()));
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::CaptureFailed(format!("{}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        tracing::info!(dir = %dir.display(), frames = files.len(), "image directory source opened");
        Ok(Self { files, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        while let Some(path) = self.files.get(self.next) {
            self.next += 1;
            match image::open(path) {
                Ok(img) => return Ok(Some(img.to_rgb8())),
                Err(err) => {
                    // Skip unreadable files rather than ending the stream.
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable frame");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_dir_fails() {
        let err = ImageDirSource::open(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, CaptureError::SourceNotFound(_)));
    }

    #[test]
    fn test_frames_delivered_in_sorted_order_then_end() {
        let dir = tempdir().unwrap();
        for (name, value) in [("b.png", 2u8), ("a.png", 1u8)] {
            RgbImage::from_pixel(4, 4, image::Rgb([value, 0, 0]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut source = ImageDirSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.get_pixel(0, 0).0[0], 1);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.get_pixel(0, 0).0[0], 2);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();
        RgbImage::from_pixel(4, 4, image::Rgb([7, 0, 0]))
            .save(dir.path().join("good.png"))
            .unwrap();

        let mut source = ImageDirSource::open(dir.path()).unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.get_pixel(0, 0).0[0], 7);
        assert!(source.next_frame().unwrap().is_none());
    }
}
