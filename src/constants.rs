/// Constants used by participant summaries.
pub mod summary {
    /// Speed held by a summary before its first leg; replaced by the first leg's speed.
    pub const INITIAL_SPEED: f64 = 100.0;
}

/// Constants used by progress tracking and reporting.
pub mod progress {
    /// Default rounding step (in percent) for leg-based progress notifications.
    pub const DEFAULT_STEP_PERCENT: u32 = 5;
    /// Sentinel held in `last_reported` before the first notification.
    pub const NOTHING_REPORTED: i64 = -1;
}

/// Constants used by the orchestrator.
pub mod orchestrator {
    /// Worker count used when the caller does not pick one.
    pub const DEFAULT_WORKERS: usize = 4;
}

/// File layout of a race data directory.
pub mod files {
    /// Index file listing participants and day files.
    pub const INDEX_FILE_NAME: &str = "index.json";
    /// Prefix of per-day leg files discovered by directory scans.
    pub const DAY_FILE_PREFIX: &str = "day_";
    /// Extension of per-day leg files discovered by directory scans.
    pub const DAY_FILE_EXTENSION: &str = "json";
}
