//! Attendance session state machine.
//!
//! One session per process run. Per detected face, per frame:
//! `DETECTING → CLASSIFIED → {ALREADY_LOGGED, NEW_LOG, SKIPPED}`. The
//! dedupe set guarantees at most one log row and one snapshot per identity
//! per day; the debounce map throttles repeat announcements. All state is
//! session-scoped and rebuilt from the durable log at startup.

use crate::daily_log::{AttendanceRow, DailyLog, LogError};
use crate::notify::Notifier;
use crate::snapshot::{self, SnapshotError};
use chrono::{DateTime, Duration, Local, NaiveDate};
use image::RgbImage;
use rollcall_core::identity::IdentityRecord;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// Minimum gap between repeated "already recorded" announcements.
pub const DEFAULT_DEBOUNCE_SECS: i64 = 5;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("daily log: {0}")]
    Log(#[from] LogError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Where a session keeps its durable artifacts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding the per-day CSV logs.
    pub attendance_dir: PathBuf,
    /// Base directory for per-day snapshot subdirectories.
    pub snapshot_dir: PathBuf,
    /// Debounce interval for repeat announcements.
    pub debounce: Duration,
}

impl SessionConfig {
    pub fn new(attendance_dir: PathBuf, snapshot_dir: PathBuf) -> Self {
        Self {
            attendance_dir,
            snapshot_dir,
            debounce: Duration::seconds(DEFAULT_DEBOUNCE_SECS),
        }
    }
}

/// State-machine transition for one detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Label could not be resolved; nothing was mutated.
    Skipped { label: String },
    /// Identity already logged today; `reminded` is true when the debounce
    /// window had elapsed and an announcement was made.
    AlreadyLogged { roll_number: String, reminded: bool },
    /// First sighting today: snapshot written, row appended, announced.
    Logged(AttendanceRow),
}

/// Per-run attendance state.
pub struct AttendanceSession {
    date: NaiveDate,
    log: DailyLog,
    snapshot_dir: PathBuf,
    debounce: Duration,
    /// Roll numbers already logged today; derived from the durable log.
    dedupe: HashSet<String>,
    /// Last "already recorded" announcement per roll number. Ephemeral:
    /// reset on restart, unlike the dedupe set.
    last_reminder: HashMap<String, DateTime<Local>>,
    last_logged_name: Option<String>,
}

impl AttendanceSession {
    /// Start a session for `date`, bootstrapping the dedupe set from the
    /// day's existing log so a mid-day restart does not re-admit repeats.
    pub fn start(config: &SessionConfig, date: NaiveDate) -> Result<Self, SessionError> {
        let log = DailyLog::for_date(&config.attendance_dir, date);
        let dedupe = log.bootstrap_dedupe()?;
        tracing::info!(
            date = %date,
            log = %log.path().display(),
            already_present = dedupe.len(),
            "attendance session started"
        );
        Ok(Self {
            date,
            log,
            snapshot_dir: config.snapshot_dir.clone(),
            debounce: config.debounce,
            dedupe,
            last_reminder: HashMap::new(),
            last_logged_name: None,
        })
    }

    /// Identities logged so far today.
    pub fn logged_count(&self) -> usize {
        self.dedupe.len()
    }

    /// Name on the most recent new log entry this run, for status overlays.
    pub fn last_logged_name(&self) -> Option<&str> {
        self.last_logged_name.as_deref()
    }

    /// Run one classified detection through the state machine.
    ///
    /// `now` is injected by the caller; `crop` is the face crop the
    /// classification came from, kept as snapshot evidence on a new entry.
    /// I/O failures are recoverable: the error is returned, the dedupe set
    /// is left untouched for that entry, and the caller continues the loop.
    pub fn process(
        &mut self,
        record: &IdentityRecord,
        crop: &RgbImage,
        now: DateTime<Local>,
        notifier: &mut dyn Notifier,
    ) -> Result<Outcome, SessionError> {
        let identity = match record.resolve() {
            Ok(id) => id,
            Err(err) => {
                let label = record.display_label();
                tracing::warn!(label = %label, error = %err, "skipping unparsable detection");
                return Ok(Outcome::Skipped { label });
            }
        };

        if self.dedupe.contains(&identity.roll_number) {
            let reminded = match self.last_reminder.get(&identity.roll_number) {
                Some(last) => now.signed_duration_since(*last) > self.debounce,
                None => true,
            };
            if reminded {
                notifier.speak("Attendance already recorded for today.");
                self.last_reminder.insert(identity.roll_number.clone(), now);
            }
            return Ok(Outcome::AlreadyLogged {
                roll_number: identity.roll_number,
                reminded,
            });
        }

        let snapshot_path = snapshot::write_snapshot(
            &self.snapshot_dir,
            self.date,
            &identity.roll_number,
            now.timestamp(),
            crop,
        )?;
        let row = AttendanceRow {
            roll_number: identity.roll_number.clone(),
            name: identity.name.clone(),
            department: identity.department,
            semester: identity.semester,
            time: now.format("%H:%M:%S").to_string(),
            snapshot_path: snapshot_path.to_string_lossy().into_owned(),
        };
        self.log.append(&row)?;

        // Only after both writes succeed; a failure above leaves the set
        // consistent with the durable log.
        self.dedupe.insert(identity.roll_number.clone());
        // The "recorded" announcement counts as the last one, so a repeat
        // sighting seconds later stays silent until the window elapses.
        self.last_reminder.insert(identity.roll_number.clone(), now);
        self.last_logged_name = Some(identity.name.clone());
        notifier.speak(&format!("Attendance recorded for {}.", identity.name));
        tracing::info!(
            roll_number = %identity.roll_number,
            name = %identity.name,
            snapshot = %row.snapshot_path,
            "new attendance entry"
        );
        Ok(Outcome::Logged(row))
    }
}
