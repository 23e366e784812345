//! Recognition runner.
//!
//! Single-threaded synchronous frame-pull loop: detect, classify, and run
//! each face through the attendance state machine. Only the cooperative
//! quit signal (checked once per iteration) or the end of the frame stream
//! terminates the loop; every per-face error is contained to that face.

use crate::notify::Notifier;
use crate::session::{AttendanceSession, Outcome};
use chrono::Local;
use rollcall_core::capture::{crop_region, CaptureError, FaceDetector, FrameSource};
use rollcall_core::classifier::{Recognizer, Verdict};
use rollcall_core::features::normalize_crop;

/// Counters for the run, reported at shutdown.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub faces: usize,
    pub logged: usize,
    pub skipped: usize,
}

/// Run the recognition session until quit or stream end.
pub fn run_recognition(
    source: &mut dyn FrameSource,
    detector: &mut dyn FaceDetector,
    recognizer: &Recognizer,
    session: &mut AttendanceSession,
    notifier: &mut dyn Notifier,
    mut quit: impl FnMut() -> bool,
) -> Result<RunSummary, CaptureError> {
    let mut summary = RunSummary::default();
    tracing::info!(
        samples = recognizer.sample_count(),
        already_present = session.logged_count(),
        "recognition session started"
    );

    loop {
        if quit() {
            tracing::info!("quit signal received");
            break;
        }
        let Some(frame) = source.next_frame()? else {
            tracing::info!("frame stream ended");
            break;
        };
        summary.frames += 1;

        // Faces are handled independently and sequentially, in detector
        // order; each may transition the shared session state.
        for region in detector.detect(&frame) {
            let Some(crop) = crop_region(&frame, &region) else {
                continue;
            };
            summary.faces += 1;

            let vector = normalize_crop(&crop);
            let record = match recognizer.classify(&vector) {
                Ok(Verdict::Match { record, .. }) => record,
                Ok(Verdict::Unrecognized) => {
                    tracing::debug!("face not recognized; no log mutation");
                    continue;
                }
                Err(err) => {
                    // Sentinel error: draw/ignore the face, never abort.
                    tracing::warn!(error = %err, "classification failed for this face");
                    continue;
                }
            };

            match session.process(&record, &crop, Local::now(), notifier) {
                Ok(Outcome::Logged(row)) => {
                    summary.logged += 1;
                    tracing::info!(
                        status = "LOGGING NEW ENTRY",
                        roll_number = %row.roll_number,
                        last_log = %row.name,
                        todays_count = session.logged_count(),
                        "attendance logged"
                    );
                }
                Ok(Outcome::AlreadyLogged { roll_number, reminded }) => {
                    tracing::debug!(
                        status = "PRESENT LOGGED",
                        roll_number = %roll_number,
                        reminded,
                        "already logged today"
                    );
                }
                Ok(Outcome::Skipped { label }) => {
                    summary.skipped += 1;
                    tracing::warn!(label = %label, "detection skipped");
                }
                Err(err) => {
                    // Best-effort I/O: report and continue; the dedupe set
                    // stays consistent with the durable log for this entry.
                    summary.skipped += 1;
                    tracing::warn!(error = %err, "log entry failed; continuing");
                }
            }
        }
    }

    tracing::info!(
        frames = summary.frames,
        faces = summary.faces,
        logged = summary.logged,
        skipped = summary.skipped,
        "recognition session ended"
    );
    Ok(summary)
}
