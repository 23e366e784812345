//! Capture and detection seams.
//!
//! The video device and the face detector are external collaborators; the
//! enrollment and recognition loops only see these traits.

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("frame source not found: {0}")]
    SourceNotFound(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Axis-aligned face bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Blocking frame supplier.
///
/// `Ok(None)` means the stream ended (a finite source ran out of frames).
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;
}

/// Face detector capability: one frame in, zero or more regions out.
///
/// Region order within a frame is the detector's; faces are processed in
/// exactly that order.
pub trait FaceDetector {
    fn detect(&mut self, frame: &RgbImage) -> Vec<FaceRegion>;
}

/// Detector stand-in that reports the whole frame as a single face.
///
/// Useful for wiring the pipeline against pre-cropped frames when no real
/// detector is attached.
pub struct FullFrameDetector;

impl FaceDetector for FullFrameDetector {
    fn detect(&mut self, frame: &RgbImage) -> Vec<FaceRegion> {
        if frame.width() == 0 || frame.height() == 0 {
            return Vec::new();
        }
        vec![FaceRegion {
            x: 0,
            y: 0,
            width: frame.width(),
            height: frame.height(),
        }]
    }
}

/// Crop a detected region out of a frame, clamped to the frame bounds.
///
/// Returns `None` when the region lies entirely outside the frame.
pub fn crop_region(frame: &RgbImage, region: &FaceRegion) -> Option<RgbImage> {
    if region.x >= frame.width() || region.y >= frame.height() {
        return None;
    }
    let w = region.width.min(frame.width() - region.x);
    let h = region.height.min(frame.height() - region.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(image::imageops::crop_imm(frame, region.x, region.y, w, h).to_image())
}
