//! Pull-driven delivery scheduling.
//!
//! One demand pulse advances the output grid by one cadence interval and
//! produces at most one frame: the queue front (fresh or repeated), a
//! scatter slot of it, or an empty filler when nothing is due yet. Expired
//! and superseded front entries are dropped before selection.

use subfeed_common::config::{FeedConfig, FeedMode};
use subfeed_common::time::{DurationMs, TimestampMs};
use subfeed_model::DeliveryFrame;

use crate::engine::FeedStats;
use crate::queue::EventQueue;

/// Cadence-grid state machine for the repeat and scatter modes.
///
/// Forward mode bypasses the grid entirely and is handled by the engine.
#[derive(Debug)]
pub struct DeliveryScheduler {
    mode: FeedMode,
    interval: DurationMs,
    threshold: DurationMs,

    /// Last emitted pts; the grid anchor.
    last_pts: Option<TimestampMs>,

    /// Whether the queue front has never been emitted.
    front_is_fresh: bool,

    /// Grid correction left behind by an off-grid fresh emission; consumed
    /// by the next pulse so later slots tile contiguously from the fresh pts.
    grid_offset: DurationMs,

    /// Source start of the most recently delivered event, echoed by fillers.
    recent_source_start: TimestampMs,
}

impl DeliveryScheduler {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            mode: config.mode,
            interval: config.cadence_interval(),
            threshold: config.implausible_threshold(),
            last_pts: None,
            front_is_fresh: true,
            grid_offset: 0,
            recent_source_start: 0,
        }
    }

    /// Last emitted pts, if any frame has been emitted.
    pub fn last_pts(&self) -> Option<TimestampMs> {
        self.last_pts
    }

    /// Mark that the queue front changed to a never-emitted entry.
    pub fn front_replaced(&mut self) {
        self.front_is_fresh = true;
    }

    /// Run one demand pulse against the queue.
    ///
    /// Returns `None` only when the queue is empty (after dropping expired
    /// and superseded entries); the engine then refills from upstream or
    /// propagates end-of-stream. Otherwise exactly one frame is produced.
    pub fn run_pulse(
        &mut self,
        queue: &mut EventQueue,
        stats: &mut FeedStats,
    ) -> Option<DeliveryFrame> {
        let interval = self.interval;
        let next = match self.last_pts {
            Some(last) => {
                if self.grid_offset != 0 {
                    tracing::trace!(offset_ms = self.grid_offset, "applying grid offset");
                }
                last + interval - self.grid_offset
            }
            None => queue.peek(0).map_or(0, |front| front.start_ms),
        };

        // Drop pass. Every iteration removes one entry, so the queue
        // strictly shrinks and the loop terminates.
        loop {
            let Some(front) = queue.peek(0) else {
                return None;
            };

            if let Some(successor) = queue.peek(1) {
                if next + interval > successor.start_ms {
                    tracing::trace!(
                        start_ms = front.start_ms,
                        successor_start_ms = successor.start_ms,
                        "dropping superseded front entry"
                    );
                    queue.take_front();
                    stats.dropped_superseded += 1;
                    self.front_is_fresh = true;
                    continue;
                }
            }

            // In scatter mode an event ending exactly at the grid line has
            // nothing left to cover; a zero-width slot must not be emitted.
            let end = front.end_ms(self.threshold);
            let expired = if self.mode == FeedMode::Scatter {
                end <= next
            } else {
                end < next
            };
            if expired {
                tracing::trace!(
                    start_ms = front.start_ms,
                    end_ms = end,
                    next_pts_ms = next,
                    "dropping expired front entry"
                );
                queue.take_front();
                stats.dropped_expired += 1;
                self.front_is_fresh = true;
                continue;
            }

            break;
        }

        if let Some(front) = queue.front_mut() {
            // In scatter mode a slot starting exactly one interval ahead
            // would be empty; wait for the next pulse instead.
            let due = if self.mode == FeedMode::Scatter {
                front.start_ms < next + interval
            } else {
                front.start_ms <= next + interval
            };

            if due {
                let fresh = self.front_is_fresh;
                if fresh && front.needs_resolution(self.threshold) {
                    tracing::warn!(
                        start_ms = front.start_ms,
                        "scheduling event with unresolved duration"
                    );
                }
                if !fresh {
                    front.repeat_count += 1;
                }
                let pts = if fresh {
                    front.start_ms.max(next)
                } else {
                    next
                };

                let mut frame = DeliveryFrame::from_event(front, pts, self.threshold, fresh);

                if self.mode == FeedMode::Scatter {
                    let event_end = front.end_ms(self.threshold);
                    let slot_end = (next + interval).min(event_end);
                    frame.source_start_ms = pts;
                    frame.source_duration_ms = slot_end - pts;
                    frame.repeat_count = 0;
                    debug_assert!(frame.source_duration_ms >= 0);
                }

                self.front_is_fresh = false;
                self.recent_source_start = frame.source_start_ms;
                self.grid_offset = if fresh { (pts - next) % interval } else { 0 };
                self.last_pts = Some(pts);

                if fresh {
                    stats.fresh_frames += 1;
                } else {
                    stats.repeat_frames += 1;
                }

                tracing::debug!(
                    pts_ms = frame.pts_ms,
                    source_start_ms = frame.source_start_ms,
                    repeat = frame.repeat_count,
                    fresh,
                    "emitting event frame"
                );
                return Some(frame);
            }
        }

        // Nothing due at this tick; keep the pull side fed with an empty
        // repeat of the most recent delivery.
        let frame = DeliveryFrame::filler(next, self.recent_source_start);
        self.grid_offset = 0;
        self.last_pts = Some(next);
        stats.filler_frames += 1;

        tracing::debug!(
            pts_ms = frame.pts_ms,
            source_start_ms = frame.source_start_ms,
            "emitting filler frame"
        );
        Some(frame)
    }
}
