//! Pending-tail deferral for decoders without end times.
//!
//! Some collaborators decode one event at a time and cannot know an
//! event's end until the next decode call. This adapter withholds such an
//! event, hands the pull side an empty placeholder so it is never starved,
//! and releases the withheld event with an inferred duration once its
//! follow-up arrives. `flush` releases the tail at end-of-stream; a
//! withheld event is never silently dropped.

use subfeed_common::config::DEFAULT_IMPLAUSIBLE_DURATION_MS;
use subfeed_common::time::DurationMs;
use subfeed_model::{DeliveryFrame, EventDuration, SubtitleEvent};

/// One-event lookahead buffer between decode and queue insertion.
#[derive(Debug)]
pub struct PendingTail {
    threshold: DurationMs,
    pending: Option<SubtitleEvent>,
}

impl PendingTail {
    pub fn new(threshold_ms: DurationMs) -> Self {
        Self {
            threshold: threshold_ms,
            pending: None,
        }
    }

    pub fn with_default_threshold() -> Self {
        Self::new(DEFAULT_IMPLAUSIBLE_DURATION_MS)
    }

    /// Whether an event is currently withheld.
    pub fn is_holding(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept one decoded event; returns the frames to emit this call.
    ///
    /// Stale repeats are dropped. A non-repeat arrival at exactly the
    /// withheld event's start is a duplicate and is dropped too. Events
    /// with a plausible duration pass straight through, after the withheld
    /// predecessor (if any) is resolved against their start and released.
    pub fn offer(&mut self, event: SubtitleEvent) -> Vec<DeliveryFrame> {
        let mut out = Vec::new();

        if event.repeat_count > 0 {
            tracing::trace!(start_ms = event.start_ms, "ignoring stale repeat");
            return out;
        }

        if let Some(mut held) = self.pending.take() {
            let gap = event.start_ms - held.start_ms;

            if gap == 0 {
                tracing::trace!(start_ms = event.start_ms, "ignoring duplicate of withheld event");
                self.pending = Some(held);
                return out;
            }

            if gap < 0 {
                tracing::warn!(
                    gap_ms = gap,
                    held_start_ms = held.start_ms,
                    "follow-up starts before withheld event; releasing unresolved"
                );
                out.push(DeliveryFrame::from_event(
                    &held,
                    held.start_ms,
                    self.threshold,
                    true,
                ));
            } else {
                held.duration = EventDuration::Known(gap);
                held.duration_resolved = true;
                tracing::debug!(
                    start_ms = held.start_ms,
                    duration_ms = gap,
                    "releasing withheld event with inferred duration"
                );
                out.push(DeliveryFrame::from_event(
                    &held,
                    held.start_ms,
                    self.threshold,
                    true,
                ));
            }
        }

        if event.duration.is_implausible(self.threshold) {
            let need_filler = out.is_empty();
            let filler_pts = event.start_ms;
            tracing::debug!(start_ms = event.start_ms, "withholding event without end time");
            self.pending = Some(event);

            if need_filler {
                // Keep the pull side fed with a minimal placeholder.
                let mut filler = DeliveryFrame::filler(filler_pts, 0);
                filler.source_duration_ms = 1;
                out.push(filler);
            }
        } else {
            out.push(DeliveryFrame::from_event(
                &event,
                event.start_ms,
                self.threshold,
                true,
            ));
        }

        out
    }

    /// Release the withheld event at end-of-stream, if any, with its
    /// last-known duration.
    pub fn flush(&mut self) -> Option<DeliveryFrame> {
        let held = self.pending.take()?;
        if held.duration.is_implausible(self.threshold) {
            tracing::warn!(
                start_ms = held.start_ms,
                "flushing withheld event with unresolved duration"
            );
        }
        Some(DeliveryFrame::from_event(
            &held,
            held.start_ms,
            self.threshold,
            true,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subfeed_model::SharedPayload;

    fn open_ended(start_ms: i64) -> SubtitleEvent {
        SubtitleEvent::open_ended(start_ms, SharedPayload::markup("x"))
    }

    #[test]
    fn test_withhold_then_resolve() {
        let mut tail = PendingTail::with_default_threshold();

        let first = tail.offer(open_ended(10));
        assert_eq!(first.len(), 1);
        assert!(first[0].is_filler());
        assert!(!first[0].is_fresh);
        assert_eq!(first[0].source_duration_ms, 1);
        assert!(tail.is_holding());

        let second = tail.offer(open_ended(510));
        assert_eq!(second.len(), 1);
        assert!(second[0].is_fresh);
        assert_eq!(second[0].source_start_ms, 10);
        assert_eq!(second[0].source_duration_ms, 500);
        assert!(tail.is_holding());
    }

    #[test]
    fn test_plausible_event_passes_through() {
        let mut tail = PendingTail::with_default_threshold();

        let out = tail.offer(SubtitleEvent::timed(0, 400, SharedPayload::markup("x")));
        assert_eq!(out.len(), 1);
        assert!(out[0].is_fresh);
        assert_eq!(out[0].source_duration_ms, 400);
        assert!(!tail.is_holding());
    }

    #[test]
    fn test_duplicate_of_withheld_ignored() {
        let mut tail = PendingTail::with_default_threshold();
        tail.offer(open_ended(10));

        assert!(tail.offer(open_ended(10)).is_empty());
        assert!(tail.is_holding());

        let out = tail.offer(open_ended(510));
        assert_eq!(out[0].source_duration_ms, 500);
    }

    #[test]
    fn test_stale_repeat_ignored() {
        let mut tail = PendingTail::with_default_threshold();
        tail.offer(open_ended(10));

        let mut repeat = open_ended(400);
        repeat.repeat_count = 1;
        assert!(tail.offer(repeat).is_empty());
        assert!(tail.is_holding());
    }

    #[test]
    fn test_resolved_release_needs_no_filler() {
        let mut tail = PendingTail::with_default_threshold();
        tail.offer(open_ended(0));

        // Implausible reported duration counts as unknown: the event is
        // withheld, and the released predecessor keeps the pull side fed.
        let next = SubtitleEvent::timed(1_000, 30_000, SharedPayload::markup("y"));
        let out = tail.offer(next);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_start_ms, 0);
        assert_eq!(out[0].source_duration_ms, 1_000);
        assert!(tail.is_holding());
    }

    #[test]
    fn test_flush_releases_with_last_known_duration() {
        let mut tail = PendingTail::with_default_threshold();
        tail.offer(open_ended(10));

        let flushed = tail.flush().unwrap();
        assert_eq!(flushed.source_start_ms, 10);
        assert_eq!(flushed.source_duration_ms, DEFAULT_IMPLAUSIBLE_DURATION_MS);
        assert!(flushed.is_fresh);

        assert!(tail.flush().is_none());
    }

    #[test]
    fn test_negative_gap_releases_unresolved() {
        let mut tail = PendingTail::new(29_000);
        tail.offer(open_ended(100));

        let out = tail.offer(SubtitleEvent::timed(50, 200, SharedPayload::markup("y")));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_start_ms, 100);
        assert_eq!(out[0].source_duration_ms, 29_000);
        assert_eq!(out[1].source_start_ms, 50);
        assert!(!tail.is_holding());
    }
}
