use std::path::PathBuf;

/// Runtime configuration, loaded from environment variables.
pub struct Config {
    /// Directory holding the feature store database.
    pub data_dir: PathBuf,
    /// Directory holding the per-day attendance CSVs.
    pub attendance_dir: PathBuf,
    /// Base directory for per-day snapshot subdirectories.
    pub snapshot_dir: PathBuf,
    /// Minimum seconds between repeated "already recorded" announcements.
    pub debounce_secs: i64,
    /// Samples required to commit an enrollment.
    pub sample_quota: usize,
    /// Accept one crop out of every this many detections.
    pub decimation: usize,
    /// Optional open-set rejection distance; unset keeps closed-set
    /// behavior (every face resolves to some enrolled identity).
    pub reject_distance: Option<f32>,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let attendance_dir = std::env::var("ROLLCALL_ATTENDANCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("Attendance"));

        let snapshot_dir = std::env::var("ROLLCALL_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| attendance_dir.join("Snapshots"));

        Self {
            data_dir: std::env::var("ROLLCALL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            attendance_dir,
            snapshot_dir,
            debounce_secs: env_i64("ROLLCALL_DEBOUNCE_SECS", 5),
            sample_quota: env_usize("ROLLCALL_SAMPLE_QUOTA", 100),
            decimation: env_usize("ROLLCALL_DECIMATION", 10),
            reject_distance: env_opt_f32("ROLLCALL_REJECT_DISTANCE"),
        }
    }

    /// Path to the feature store database.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("faces.db")
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt_f32(key: &str) -> Option<f32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
