//! Time base helpers for the subtitle event clock.
//!
//! All event timing in subfeed uses a single fixed time base: integer
//! milliseconds on a monotonic source clock. Durations and timestamps are
//! never accumulated through floating point, so repeated corrections
//! cannot drift.

/// Timestamp in milliseconds on the monotonic source time base.
pub type TimestampMs = i64;

/// Duration in milliseconds.
pub type DurationMs = i64;

/// Convert milliseconds to fractional seconds (display only).
pub fn ms_to_secs(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Convert fractional seconds to milliseconds (display only).
pub fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0) as i64
}

/// Format a millisecond timestamp as `HH:MM:SS.mmm`.
///
/// Negative timestamps are prefixed with `-` and formatted by magnitude.
pub fn format_timestamp_ms(ms: TimestampMs) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let total_ms = ms.unsigned_abs();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
