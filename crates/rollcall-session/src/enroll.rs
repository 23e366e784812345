//! Enrollment controller.
//!
//! Bounded capture loop: pull frames, detect faces, keep one normalized
//! crop out of every `decimation` detections for temporal diversity, and
//! commit to the feature store only when the full quota is gathered.
//! Cancellation or stream end before quota abandons the registration
//! without writing anything.

use rollcall_core::capture::{crop_region, CaptureError, FaceDetector, FaceRegion, FrameSource};
use rollcall_core::features::normalize_crop;
use rollcall_core::identity::Identity;
use rollcall_core::store::{FeatureStore, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("capture: {0}")]
    Capture(#[from] CaptureError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Sampling policy for one registration.
#[derive(Debug, Clone)]
pub struct EnrollmentConfig {
    /// Samples required for a commit.
    pub sample_quota: usize,
    /// Accept one crop out of every this many detections observed.
    pub decimation: usize,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            sample_quota: 100,
            decimation: 10,
        }
    }
}

/// How the registration ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Quota reached; the batch was appended to the store.
    Committed { samples: usize },
    /// Operator cancelled or the stream ended early; nothing was written.
    Abandoned { collected: usize },
}

/// Per-frame progress for the presentational overlay.
pub struct EnrollProgress<'a> {
    pub samples_collected: usize,
    pub sample_quota: usize,
    pub regions: &'a [FaceRegion],
}

/// Drive one registration to completion.
///
/// `cancel` is the cooperative quit signal, checked once per loop
/// iteration; `progress` is called once per pulled frame and is purely
/// presentational.
pub fn run_enrollment(
    source: &mut dyn FrameSource,
    detector: &mut dyn FaceDetector,
    store: &mut FeatureStore,
    identity: &Identity,
    config: &EnrollmentConfig,
    mut cancel: impl FnMut() -> bool,
    mut progress: impl FnMut(&EnrollProgress),
) -> Result<EnrollOutcome, EnrollError> {
    let mut samples: Vec<Vec<f32>> = Vec::with_capacity(config.sample_quota);
    let mut detections_seen = 0usize;
    let decimation = config.decimation.max(1);

    tracing::info!(
        roll_number = %identity.roll_number,
        quota = config.sample_quota,
        decimation = config.decimation,
        "enrollment started"
    );

    while samples.len() < config.sample_quota {
        if cancel() {
            tracing::info!(collected = samples.len(), "enrollment cancelled by operator");
            return Ok(EnrollOutcome::Abandoned {
                collected: samples.len(),
            });
        }

        let Some(frame) = source.next_frame()? else {
            tracing::warn!(collected = samples.len(), "frame stream ended before quota");
            return Ok(EnrollOutcome::Abandoned {
                collected: samples.len(),
            });
        };

        let regions = detector.detect(&frame);
        for region in &regions {
            let Some(crop) = crop_region(&frame, region) else {
                continue;
            };
            if samples.len() < config.sample_quota && detections_seen % decimation == 0 {
                samples.push(normalize_crop(&crop));
            }
            detections_seen += 1;
        }

        progress(&EnrollProgress {
            samples_collected: samples.len(),
            sample_quota: config.sample_quota,
            regions: &regions,
        });
    }

    store.append_batch(identity, &samples)?;
    tracing::info!(
        roll_number = %identity.roll_number,
        samples = samples.len(),
        "enrollment committed"
    );
    Ok(EnrollOutcome::Committed {
        samples: samples.len(),
    })
}
