//! Shared constants for the progression engine.

/// Seconds in one hour, used when converting catalog durations.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Countdown displays treat the final second before a deadline as already
/// elapsed so the label never renders "0 seconds".
pub const ELAPSED_GRACE_SECS: i64 = 1;

/// Upper bound on task names accepted by the factory.
pub const TASK_NAME_MAX_LEN: usize = 120;

/// Starting inspiration-point ceiling for a fresh account.
pub const DEFAULT_CAPACITY: i64 = 100;

/// Dungeon selected for an account that has never picked one.
pub const DEFAULT_DUNGEON_NAME: &str = "Dark Cave";
