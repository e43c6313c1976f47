//! Subtitle event types for the delivery pipeline.
//!
//! Events arrive from upstream decoders in arrival order with a start time
//! and an often unreliable duration. Event streams are stored in JSONL
//! format, one JSON object per line, for easy capture and replay.

use serde::{Deserialize, Serialize};
use subfeed_common::time::{DurationMs, TimestampMs};

use crate::payload::SharedPayload;

/// Duration of a subtitle event.
///
/// Upstream decoders that cannot determine an event's end time report a
/// sentinel value (negative, or an implausibly large placeholder). At this
/// boundary the sentinel becomes a proper variant; the engine resolves
/// `Unknown` from the start of the following event before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<DurationMs>", into = "Option<DurationMs>")]
pub enum EventDuration {
    /// Duration reported or already inferred, in milliseconds.
    Known(DurationMs),
    /// Duration not yet determined.
    Unknown,
}

impl From<Option<DurationMs>> for EventDuration {
    fn from(value: Option<DurationMs>) -> Self {
        match value {
            Some(ms) if ms >= 0 => Self::Known(ms),
            _ => Self::Unknown,
        }
    }
}

impl From<EventDuration> for Option<DurationMs> {
    fn from(value: EventDuration) -> Self {
        match value {
            EventDuration::Known(ms) => Some(ms),
            EventDuration::Unknown => None,
        }
    }
}

impl EventDuration {
    /// Decode the legacy collaborator encoding: negative or at/above the
    /// implausibility threshold means unknown.
    pub fn from_legacy_ms(ms: DurationMs, threshold: DurationMs) -> Self {
        if ms < 0 || ms >= threshold {
            Self::Unknown
        } else {
            Self::Known(ms)
        }
    }

    /// Encode back to the legacy collaborator value, materializing
    /// `Unknown` as the threshold placeholder.
    pub fn to_legacy_ms(self, threshold: DurationMs) -> DurationMs {
        match self {
            Self::Known(ms) => ms,
            Self::Unknown => threshold,
        }
    }

    pub fn known(self) -> Option<DurationMs> {
        self.into()
    }

    pub fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Concrete duration for scheduling math; `Unknown` materializes as
    /// the given fallback.
    pub fn or_fallback(self, fallback: DurationMs) -> DurationMs {
        match self {
            Self::Known(ms) => ms,
            Self::Unknown => fallback,
        }
    }

    /// Whether this duration still needs inference: unknown outright, or a
    /// reported value at/above the implausibility threshold.
    pub fn is_implausible(self, threshold: DurationMs) -> bool {
        match self {
            Self::Known(ms) => ms >= threshold,
            Self::Unknown => true,
        }
    }
}

/// A source-reported interval of subtitle content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEvent {
    /// Start time in milliseconds on the monotonic source clock.
    pub start_ms: TimestampMs,

    /// Reported or inferred duration.
    #[serde(rename = "duration_ms")]
    pub duration: EventDuration,

    /// Opaque content handle, passed through to delivery untouched.
    #[serde(default)]
    pub payload: SharedPayload,

    /// Times this event has been re-emitted as a stale repeat rather than
    /// a fresh delivery.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub repeat_count: u32,

    /// Latch set once the duration has been inferred from a following
    /// event, so later arrivals never revise it again.
    #[serde(skip)]
    pub duration_resolved: bool,
}

fn is_zero(count: &u32) -> bool {
    *count == 0
}

impl SubtitleEvent {
    pub fn new(start_ms: TimestampMs, duration: EventDuration, payload: SharedPayload) -> Self {
        Self {
            start_ms,
            duration,
            payload,
            repeat_count: 0,
            duration_resolved: false,
        }
    }

    /// Event with a known duration.
    pub fn timed(start_ms: TimestampMs, duration_ms: DurationMs, payload: SharedPayload) -> Self {
        Self::new(start_ms, EventDuration::Known(duration_ms), payload)
    }

    /// Event whose duration the decoder could not determine.
    pub fn open_ended(start_ms: TimestampMs, payload: SharedPayload) -> Self {
        Self::new(start_ms, EventDuration::Unknown, payload)
    }

    /// End time with `Unknown` materialized as the given fallback duration.
    pub fn end_ms(&self, fallback_duration: DurationMs) -> TimestampMs {
        self.start_ms + self.duration.or_fallback(fallback_duration)
    }

    /// Whether the duration still needs inference from a following event.
    pub fn needs_resolution(&self, threshold: DurationMs) -> bool {
        !self.duration_resolved && self.duration.is_implausible(threshold)
    }
}

/// Parse events from JSONL content (one JSON object per line).
pub fn parse_events(jsonl: &str) -> Result<Vec<SubtitleEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[SubtitleEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_roundtrip() {
        let event = SubtitleEvent::timed(1_000, 500, SharedPayload::markup("Hi"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"duration_ms\":500"));
        let parsed: SubtitleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_unknown_duration_serializes_as_null() {
        let event = SubtitleEvent::open_ended(0, SharedPayload::markup("Hi"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"duration_ms\":null"));
        let parsed: SubtitleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.duration, EventDuration::Unknown);
    }

    #[test]
    fn test_legacy_sentinel_conversion() {
        assert_eq!(
            EventDuration::from_legacy_ms(500, 29_000),
            EventDuration::Known(500)
        );
        assert_eq!(
            EventDuration::from_legacy_ms(30_000, 29_000),
            EventDuration::Unknown
        );
        assert_eq!(
            EventDuration::from_legacy_ms(-1, 29_000),
            EventDuration::Unknown
        );
        assert_eq!(EventDuration::Unknown.to_legacy_ms(29_000), 29_000);
        assert_eq!(EventDuration::Known(500).to_legacy_ms(29_000), 500);
    }

    #[test]
    fn test_implausible_duration_needs_resolution() {
        let mut event = SubtitleEvent::timed(0, 30_000, SharedPayload::markup("Hi"));
        assert!(event.needs_resolution(29_000));

        event.duration = EventDuration::Known(1_000);
        assert!(!event.needs_resolution(29_000));

        event.duration = EventDuration::Unknown;
        event.duration_resolved = true;
        assert!(!event.needs_resolution(29_000));
    }

    #[test]
    fn test_end_ms_fallback() {
        let event = SubtitleEvent::open_ended(100, SharedPayload::empty());
        assert_eq!(event.end_ms(29_000), 29_100);

        let timed = SubtitleEvent::timed(100, 400, SharedPayload::empty());
        assert_eq!(timed.end_ms(29_000), 500);
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let events = vec![
            SubtitleEvent::open_ended(0, SharedPayload::markup("First")),
            SubtitleEvent::timed(1_000, 500, SharedPayload::markup("Second")),
        ];
        let jsonl = serialize_events(&events).unwrap();
        let parsed = parse_events(&jsonl).unwrap();
        assert_eq!(events, parsed);
    }

    #[test]
    fn test_parse_events_skips_comment_lines() {
        let jsonl = "# generated by subfeed inspect\n\
                     {\"start_ms\":0,\"duration_ms\":null}\n";
        let parsed = parse_events(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].start_ms, 0);
        assert!(parsed[0].payload.is_empty());
    }
}
