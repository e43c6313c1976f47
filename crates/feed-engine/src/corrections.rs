//! Arrival-time corrections: duration inference and overlap cleanup.
//!
//! Both corrections need to know the event that *follows* the one they
//! touch, so they run when a new event arrives and operate on the queue
//! tail. Duration inference is a local, one-step lookahead: it never looks
//! more than one event ahead and never revises a duration twice.

use subfeed_common::config::FeedConfig;
use subfeed_common::time::DurationMs;
use subfeed_model::{EventDuration, SubtitleEvent};

use crate::queue::EventQueue;

/// What the arrival-time pass did to the queued tail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionReport {
    /// Duration inferred for the previous event, if any.
    pub resolved_duration: Option<DurationMs>,

    /// Duration the previous event was trimmed to, to remove an overlap.
    pub trimmed_overlap: Option<DurationMs>,

    /// Stale entries dropped because the new event starts at or before them.
    pub dropped_stale: usize,
}

/// Run duration resolution and overlap correction against the queue tail
/// before `incoming` is enqueued.
///
/// Stale entries (non-positive gap to `incoming`) are dropped from the
/// tail one at a time, re-checking the next previous entry against the
/// same new event, until the gap is positive or the queue is exhausted.
/// The queue strictly shrinks on every drop, so the loop terminates.
pub fn apply_on_arrival(
    queue: &mut EventQueue,
    incoming: &SubtitleEvent,
    config: &FeedConfig,
) -> CorrectionReport {
    let threshold = config.implausible_threshold();
    let mut report = CorrectionReport::default();

    while let Some(prev) = queue.back() {
        let gap = incoming.start_ms - prev.start_ms;

        if gap <= 0 {
            tracing::warn!(
                gap_ms = gap,
                prev_start_ms = prev.start_ms,
                new_start_ms = incoming.start_ms,
                "event arrives at or before the previous one"
            );
            if !config.fix_overlap {
                // Retained; diagnostic only.
                break;
            }
            let stale = queue.drop_back();
            debug_assert!(stale.is_some());
            report.dropped_stale += 1;
            continue;
        }

        let prev = match queue.back_mut() {
            Some(prev) => prev,
            None => break,
        };

        if config.fix_durations && prev.needs_resolution(threshold) {
            tracing::debug!(
                prev_start_ms = prev.start_ms,
                old_duration_ms = prev.duration.or_fallback(threshold),
                inferred_ms = gap,
                "inferring previous event duration from gap"
            );
            prev.duration = EventDuration::Known(gap);
            prev.duration_resolved = true;
            report.resolved_duration = Some(gap);
        }

        if config.fix_overlap {
            if let Some(duration) = prev.duration.known() {
                if duration > gap {
                    tracing::debug!(
                        prev_start_ms = prev.start_ms,
                        old_duration_ms = duration,
                        trimmed_ms = gap,
                        "trimming previous event duration to remove overlap"
                    );
                    prev.duration = EventDuration::Known(gap);
                    report.trimmed_overlap = Some(gap);
                }
            }
        }

        break;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use subfeed_model::SharedPayload;

    fn config(fix_durations: bool, fix_overlap: bool) -> FeedConfig {
        FeedConfig {
            fix_durations,
            fix_overlap,
            ..FeedConfig::default()
        }
    }

    fn open_ended(start_ms: i64) -> SubtitleEvent {
        SubtitleEvent::open_ended(start_ms, SharedPayload::markup("x"))
    }

    fn timed(start_ms: i64, duration_ms: i64) -> SubtitleEvent {
        SubtitleEvent::timed(start_ms, duration_ms, SharedPayload::markup("x"))
    }

    #[test]
    fn test_unknown_duration_inferred_from_gap() {
        let mut queue = EventQueue::new();
        queue.enqueue(open_ended(0));

        let incoming = timed(500, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, false));

        assert_eq!(report.resolved_duration, Some(500));
        assert_eq!(queue.back().unwrap().duration, EventDuration::Known(500));
        assert!(queue.back().unwrap().duration_resolved);
    }

    #[test]
    fn test_implausible_duration_corrected() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(0, 30_000));

        let incoming = timed(1_000, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, false));

        assert_eq!(report.resolved_duration, Some(1_000));
    }

    #[test]
    fn test_resolution_happens_at_most_once() {
        let mut queue = EventQueue::new();
        let mut already = open_ended(0);
        already.duration = EventDuration::Known(40_000);
        already.duration_resolved = true;
        queue.enqueue(already);

        let incoming = timed(500, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, false));

        assert_eq!(report.resolved_duration, None);
        assert_eq!(queue.back().unwrap().duration, EventDuration::Known(40_000));
    }

    #[test]
    fn test_plausible_duration_left_alone() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(0, 300));

        let incoming = timed(1_000, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, false));

        assert_eq!(report.resolved_duration, None);
        assert_eq!(queue.back().unwrap().duration, EventDuration::Known(300));
    }

    #[test]
    fn test_overlap_trimmed_to_gap() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(0, 800));

        let incoming = timed(500, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(false, true));

        assert_eq!(report.trimmed_overlap, Some(500));
        assert_eq!(queue.back().unwrap().duration, EventDuration::Known(500));
    }

    #[test]
    fn test_stale_entry_dropped() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(100, 200));

        let incoming = timed(50, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, true));

        assert_eq!(report.dropped_stale, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stale_drop_repeats_until_gap_positive() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(10, 100));
        queue.enqueue(timed(60, 100));
        queue.enqueue(timed(90, 100));

        // Starts before both tail entries; only the first survives, and it
        // gets its duration trimmed against the incoming start.
        let incoming = timed(50, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, true));

        assert_eq!(report.dropped_stale, 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.back().unwrap().start_ms, 10);
        assert_eq!(report.trimmed_overlap, Some(40));
    }

    #[test]
    fn test_stale_retained_when_fix_overlap_disabled() {
        let mut queue = EventQueue::new();
        queue.enqueue(timed(100, 200));

        let incoming = timed(50, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(true, false));

        assert_eq!(report.dropped_stale, 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_no_fix_durations_leaves_unknown() {
        let mut queue = EventQueue::new();
        queue.enqueue(open_ended(0));

        let incoming = timed(500, 200);
        let report = apply_on_arrival(&mut queue, &incoming, &config(false, false));

        assert_eq!(report.resolved_duration, None);
        assert_eq!(queue.back().unwrap().duration, EventDuration::Unknown);
    }
}
