//! rollcall-session — Per-run attendance machinery.
//!
//! Drives the bounded enrollment capture loop and the per-frame attendance
//! state machine: daily dedupe, debounced voice reminders, snapshot
//! evidence, and the per-day CSV log.

pub mod daily_log;
pub mod enroll;
pub mod notify;
pub mod runner;
pub mod session;
pub mod snapshot;

pub use daily_log::{AttendanceRow, DailyLog, LogError};
pub use enroll::{run_enrollment, EnrollOutcome, EnrollmentConfig};
pub use notify::{ConsoleNotifier, Notifier};
pub use runner::{run_recognition, RunSummary};
pub use session::{AttendanceSession, Outcome, SessionConfig, SessionError};
