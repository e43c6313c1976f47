//! The delivery engine: queue, corrections, and scheduling behind one
//! pull-driven object.
//!
//! A `FeedEngine` owns the upstream source and all mutable state; there
//! are no ambient globals. One `next_frame()` call is one demand pulse:
//! it refills the queue from upstream as needed (keeping the one-event
//! lookahead the duration resolver requires), runs the arrival-time
//! corrections, and asks the scheduler for exactly one frame. After
//! end-of-stream is reported once it is sticky.

use subfeed_common::config::{FeedConfig, FeedMode};
use subfeed_common::error::SubfeedResult;
use subfeed_model::{DeliveryFrame, SubtitleEvent};

use crate::corrections;
use crate::queue::EventQueue;
use crate::scheduler::DeliveryScheduler;
use crate::stream::{EventSource, FrameSink, SourcePull};

/// Queue depth above which a diagnostic is raised; the queue is expected
/// to stay at a handful of entries.
const QUEUE_DEPTH_WARN: usize = 3;

/// Runtime counters for a feed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedStats {
    /// Events accepted from upstream.
    pub events_in: u64,

    /// Frames emitted downstream.
    pub frames_out: u64,

    /// Frames carrying an event for the first time.
    pub fresh_frames: u64,

    /// Frames re-emitting the current event.
    pub repeat_frames: u64,

    /// Empty filler frames emitted while nothing was due.
    pub filler_frames: u64,

    /// Front entries dropped because their interval had passed.
    pub dropped_expired: u64,

    /// Front entries dropped because their successor was already due.
    pub dropped_superseded: u64,

    /// Tail entries dropped by the overlap corrector on out-of-order arrival.
    pub dropped_stale: u64,

    /// Durations inferred from the following event's start.
    pub durations_resolved: u64,

    /// Durations trimmed to remove an overlap with the following event.
    pub overlaps_trimmed: u64,
}

impl FeedStats {
    /// Events dropped without delivery, for any reason.
    pub fn total_dropped(&self) -> u64 {
        self.dropped_expired + self.dropped_superseded + self.dropped_stale
    }

    /// Share of emitted frames that were repeats or fillers.
    pub fn repeat_ratio(&self) -> f64 {
        if self.frames_out == 0 {
            return 0.0;
        }
        (self.repeat_frames + self.filler_frames) as f64 / self.frames_out as f64
    }
}

/// Subtitle event timing & delivery engine.
pub struct FeedEngine<S: EventSource> {
    config: FeedConfig,
    source: S,
    queue: EventQueue,
    scheduler: DeliveryScheduler,
    upstream_eof: bool,
    finished: bool,
    stats: FeedStats,
}

impl<S: EventSource> FeedEngine<S> {
    pub fn new(config: FeedConfig, source: S) -> Self {
        Self {
            scheduler: DeliveryScheduler::new(&config),
            config,
            source,
            queue: EventQueue::new(),
            upstream_eof: false,
            finished: false,
            stats: FeedStats::default(),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Whether end-of-stream has been reported.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Produce the next delivery frame, or `None` at end-of-stream.
    ///
    /// One call is one demand pulse. `None` is sticky: once returned,
    /// every later call returns it again without touching upstream.
    pub fn next_frame(&mut self) -> SubfeedResult<Option<DeliveryFrame>> {
        if self.finished {
            return Ok(None);
        }

        if self.config.mode == FeedMode::Forward {
            return self.forward_pulse();
        }

        loop {
            self.top_up()?;

            if self.queue.is_empty() {
                debug_assert!(self.upstream_eof);
                self.finished = true;
                tracing::debug!(stats = ?self.stats, "end of stream");
                return Ok(None);
            }

            if let Some(frame) = self.scheduler.run_pulse(&mut self.queue, &mut self.stats) {
                self.stats.frames_out += 1;
                return Ok(Some(frame));
            }
            // The drop pass drained the queue; refill or finish next lap.
        }
    }

    /// Drive the engine to completion, delivering every frame to `sink`.
    ///
    /// A backpressure error from the sink propagates immediately; the
    /// engine performs no retries and remains consistent, but the rejected
    /// frame is not redelivered.
    pub fn run_to_sink(&mut self, sink: &mut dyn FrameSink) -> SubfeedResult<FeedStats> {
        while let Some(frame) = self.next_frame()? {
            sink.deliver(frame)?;
        }
        Ok(self.stats)
    }

    /// Pull from upstream until the resolver's one-event lookahead is
    /// available (two queued events) or upstream ends.
    fn top_up(&mut self) -> SubfeedResult<()> {
        while self.queue.len() < 2 && !self.upstream_eof {
            match self.source.pull_next_event()? {
                SourcePull::Event(event) => self.push_event(event),
                SourcePull::EndOfStream => {
                    tracing::trace!("upstream end of stream");
                    self.upstream_eof = true;
                }
            }
        }
        Ok(())
    }

    /// Accept one event from upstream: run arrival-time corrections
    /// against the queue tail, then enqueue.
    fn push_event(&mut self, event: SubtitleEvent) {
        tracing::trace!(
            start_ms = event.start_ms,
            duration = ?event.duration,
            "event arrived"
        );
        self.stats.events_in += 1;

        let had_entries = !self.queue.is_empty();
        if had_entries && (self.config.fix_durations || self.config.fix_overlap) {
            let report = corrections::apply_on_arrival(&mut self.queue, &event, &self.config);
            if report.resolved_duration.is_some() {
                self.stats.durations_resolved += 1;
            }
            if report.trimmed_overlap.is_some() {
                self.stats.overlaps_trimmed += 1;
            }
            self.stats.dropped_stale += report.dropped_stale as u64;

            // Stale drops remove tail entries; if they emptied the queue the
            // already-emitted front is gone and the new event starts fresh.
            if self.queue.is_empty() {
                self.scheduler.front_replaced();
            }
        }

        self.queue.enqueue(event);

        if self.queue.len() > QUEUE_DEPTH_WARN {
            tracing::warn!(
                queued = self.queue.len(),
                "event queue depth above expected bound"
            );
        }
    }

    /// Forward mode: relay events in order once their corrections are
    /// final, preserving original timing; no cadence is synthesized.
    fn forward_pulse(&mut self) -> SubfeedResult<Option<DeliveryFrame>> {
        let threshold = self.config.implausible_threshold();

        loop {
            let deliverable = match self.queue.peek(0) {
                Some(front) => {
                    // Hold until a follow-up event has finalized the front's
                    // corrections; upstream end-of-stream lifts both holds.
                    let hold_for_pair =
                        self.config.fix_overlap && self.queue.len() < 2 && !self.upstream_eof;
                    let hold_unresolved = self.config.fix_durations
                        && front.duration.is_implausible(threshold)
                        && !self.upstream_eof;
                    !(hold_for_pair || hold_unresolved)
                }
                None => false,
            };

            if deliverable {
                let Some(event) = self.queue.take_front() else {
                    continue;
                };
                self.scheduler.front_replaced();

                if event.duration.is_implausible(threshold) {
                    tracing::warn!(
                        start_ms = event.start_ms,
                        "delivering event with unresolved duration at end of stream"
                    );
                }

                let frame = DeliveryFrame::from_event(&event, event.start_ms, threshold, true);
                self.stats.frames_out += 1;
                self.stats.fresh_frames += 1;
                tracing::debug!(
                    pts_ms = frame.pts_ms,
                    duration_ms = frame.source_duration_ms,
                    "forwarding event"
                );
                return Ok(Some(frame));
            }

            if self.upstream_eof {
                debug_assert!(self.queue.is_empty());
                self.finished = true;
                tracing::debug!(stats = ?self.stats, "end of stream");
                return Ok(None);
            }

            match self.source.pull_next_event()? {
                SourcePull::Event(event) => self.push_event(event),
                SourcePull::EndOfStream => {
                    tracing::trace!("upstream end of stream");
                    self.upstream_eof = true;
                }
            }
        }
    }
}
