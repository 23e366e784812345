//! Per-day attendance log.
//!
//! One CSV file per calendar day, header written exactly once, rows
//! appended as identities are logged. The file doubles as the dashboard
//! interface and as the durable source the dedupe set is rebuilt from
//! after a restart.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEADER: &str = "ROLL_NUMBER,NAME,DEPARTMENT,SEMESTER,TIME,SNAPSHOT_PATH";
const COLUMNS: usize = 6;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed log row: {0:?}")]
    MalformedRow(String),
}

/// One attendance record: a single row per (roll number, day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRow {
    pub roll_number: String,
    pub name: String,
    pub department: String,
    pub semester: String,
    pub time: String,
    pub snapshot_path: String,
}

/// Handle to one calendar day's log file.
pub struct DailyLog {
    path: PathBuf,
}

impl DailyLog {
    /// Log handle for `date` under `dir`, e.g. `Attendance_27-08-2026.csv`.
    pub fn for_date(dir: &Path, date: NaiveDate) -> Self {
        let path = dir.join(format!("Attendance_{}.csv", date.format("%d-%m-%Y")));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild the daily dedupe set from the durable log.
    ///
    /// A missing or empty file yields an empty set; the set is always a
    /// derived cache, never the source of truth. Idempotent: reading the
    /// same file twice yields the same set.
    pub fn bootstrap_dedupe(&self) -> Result<HashSet<String>, LogError> {
        let mut present = HashSet::new();
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(present),
            Err(e) => return Err(e.into()),
        };
        // Skip the header; every data row's first field is the roll number.
        // Malformed lines are reported and skipped, not fatal: a partial
        // set only risks a duplicate row, never a lost one.
        for line in content.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Ok(fields) => {
                    if let Some(roll) = fields.first() {
                        present.insert(roll.clone());
                    }
                }
                Err(err) => tracing::warn!(error = %err, "skipping malformed log row"),
            }
        }
        Ok(present)
    }

    /// Append one row, writing the header first iff the file did not exist
    /// or was empty.
    pub fn append(&self, row: &AttendanceRow) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if needs_header {
            writeln!(file, "{HEADER}")?;
        }
        writeln!(
            file,
            "{},{},{},{},{},{}",
            escape(&row.roll_number),
            escape(&row.name),
            escape(&row.department),
            escape(&row.semester),
            escape(&row.time),
            escape(&row.snapshot_path),
        )?;
        Ok(())
    }

    /// Read every data row, for listings and external consumers.
    ///
    /// Tolerates the file not existing yet (empty result).
    pub fn rows(&self) -> Result<Vec<AttendanceRow>, LogError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut rows = Vec::new();
        for line in content.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields = parse_row(line)?;
            if fields.len() != COLUMNS {
                return Err(LogError::MalformedRow(line.to_string()));
            }
            let mut it = fields.into_iter();
            rows.push(AttendanceRow {
                roll_number: it.next().unwrap_or_default(),
                name: it.next().unwrap_or_default(),
                department: it.next().unwrap_or_default(),
                semester: it.next().unwrap_or_default(),
                time: it.next().unwrap_or_default(),
                snapshot_path: it.next().unwrap_or_default(),
            });
        }
        Ok(rows)
    }
}

/// Quote a field when it contains a comma, quote, or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV line into fields, honoring quoted fields.
fn parse_row(line: &str) -> Result<Vec<String>, LogError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(LogError::MalformedRow(line.to_string()));
    }
    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    fn row(roll: &str, name: &str) -> AttendanceRow {
        AttendanceRow {
            roll_number: roll.into(),
            name: name.into(),
            department: "CS".into(),
            semester: "5".into(),
            time: "09:15:00".into(),
            snapshot_path: format!("snaps/{roll}.png"),
        }
    }

    #[test]
    fn test_path_embeds_date() {
        let log = DailyLog::for_date(Path::new("Attendance"), date());
        assert_eq!(
            log.path(),
            Path::new("Attendance/Attendance_27-08-2026.csv")
        );
    }

    #[test]
    fn test_header_written_exactly_once() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        log.append(&row("101", "Alice")).unwrap();
        log.append(&row("102", "Bob")).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("101,Alice,"));
        assert!(lines[2].starts_with("102,Bob,"));
    }

    #[test]
    fn test_header_rewritten_for_empty_file() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        std::fs::write(log.path(), "").unwrap();
        log.append(&row("101", "Alice")).unwrap();
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with(HEADER));
    }

    #[test]
    fn test_bootstrap_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        assert!(log.bootstrap_dedupe().unwrap().is_empty());
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        log.append(&row("101", "Alice")).unwrap();
        log.append(&row("102", "Bob")).unwrap();

        let first = log.bootstrap_dedupe().unwrap();
        let second = log.bootstrap_dedupe().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.contains("101"));
        assert!(first.contains("102"));
    }

    #[test]
    fn test_rows_round_trip() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        let r = row("101", "Alice");
        log.append(&r).unwrap();
        assert_eq!(log.rows().unwrap(), vec![r]);
    }

    #[test]
    fn test_rows_tolerate_missing_file() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        assert!(log.rows().unwrap().is_empty());
    }

    #[test]
    fn test_quoted_field_round_trip() {
        let dir = tempdir().unwrap();
        let log = DailyLog::for_date(dir.path(), date());
        let mut r = row("101", "Alice");
        // Legacy rows may carry arbitrary text in the name field.
        r.name = "Doe, \"Al\"".into();
        log.append(&r).unwrap();
        assert_eq!(log.rows().unwrap()[0].name, "Doe, \"Al\"");
    }

    #[test]
    fn test_parse_row_unterminated_quote() {
        assert!(parse_row("\"open,field").is_err());
    }
}
