//! Delivery frames emitted by the scheduler.

use serde::{Deserialize, Serialize};
use subfeed_common::time::{DurationMs, TimestampMs};

use crate::event::SubtitleEvent;
use crate::payload::SharedPayload;

/// One consumer-facing instance of a subtitle event at a cadence tick.
///
/// The pts is assigned by the scheduler and is not necessarily the source
/// event's start time; `source_start_ms`/`source_duration_ms` carry the
/// (possibly corrected) timing of the event the frame represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryFrame {
    /// Presentation timestamp on the output, non-decreasing per output.
    pub pts_ms: TimestampMs,

    /// Corrected start time of the represented event.
    pub source_start_ms: TimestampMs,

    /// Corrected duration of the represented event; never an unknown
    /// sentinel by the time a frame is emitted.
    pub source_duration_ms: DurationMs,

    /// True exactly once per distinct event: the first frame carrying it.
    pub is_fresh: bool,

    /// Times the represented event has been re-emitted as a stale repeat.
    pub repeat_count: u32,

    /// Shared reference to the originating event's payload.
    pub payload: SharedPayload,
}

impl DeliveryFrame {
    /// Frame carrying an event, at the given pts.
    pub fn from_event(
        event: &SubtitleEvent,
        pts_ms: TimestampMs,
        fallback_duration: DurationMs,
        is_fresh: bool,
    ) -> Self {
        Self {
            pts_ms,
            source_start_ms: event.start_ms,
            source_duration_ms: event.duration.or_fallback(fallback_duration),
            is_fresh,
            repeat_count: event.repeat_count,
            payload: event.payload.clone(),
        }
    }

    /// Empty filler frame emitted when no event is due at a cadence tick.
    pub fn filler(pts_ms: TimestampMs, source_start_ms: TimestampMs) -> Self {
        Self {
            pts_ms,
            source_start_ms,
            source_duration_ms: 0,
            is_fresh: false,
            repeat_count: 1,
            payload: SharedPayload::empty(),
        }
    }

    /// End of the represented event interval.
    pub fn source_end_ms(&self) -> TimestampMs {
        self.source_start_ms + self.source_duration_ms
    }

    /// Whether this frame carries no content.
    pub fn is_filler(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_shares_event_payload() {
        let event = SubtitleEvent::timed(100, 400, SharedPayload::markup("Hi"));
        let frame = DeliveryFrame::from_event(&event, 100, 29_000, true);
        assert!(frame.payload.shares_with(&event.payload));
        assert_eq!(frame.source_end_ms(), 500);
        assert!(frame.is_fresh);
        assert!(!frame.is_filler());
    }

    #[test]
    fn test_unknown_duration_materializes_fallback() {
        let event = SubtitleEvent::open_ended(100, SharedPayload::markup("Hi"));
        let frame = DeliveryFrame::from_event(&event, 100, 29_000, true);
        assert_eq!(frame.source_duration_ms, 29_000);
    }

    #[test]
    fn test_filler_is_empty_repeat() {
        let filler = DeliveryFrame::filler(400, 100);
        assert!(!filler.is_fresh);
        assert!(filler.is_filler());
        assert_eq!(filler.source_duration_ms, 0);
        assert_eq!(filler.source_start_ms, 100);
    }
}
