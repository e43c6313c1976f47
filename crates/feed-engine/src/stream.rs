//! Upstream and downstream boundary traits.
//!
//! The engine sits between a pull-style event source and a deliver-style
//! frame sink. These are the only points where the single driving thread
//! may suspend; the engine itself never blocks internally and performs no
//! retries — a backpressure error from the sink propagates to the caller.

use subfeed_common::error::SubfeedResult;
use subfeed_model::{DeliveryFrame, SubtitleEvent};

/// Result of asking upstream for the next event.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePull {
    /// A decoded subtitle event.
    Event(SubtitleEvent),
    /// Upstream has no further events; terminal.
    EndOfStream,
}

/// Upstream collaborator: produces subtitle events on demand.
pub trait EventSource {
    /// Pull the next event, or report end-of-stream.
    ///
    /// Once end-of-stream has been reported, every later call must report
    /// it again.
    fn pull_next_event(&mut self) -> SubfeedResult<SourcePull>;
}

/// Downstream collaborator: accepts delivery frames.
pub trait FrameSink {
    /// Deliver one frame. A sink under pressure returns
    /// [`SubfeedError::Backpressure`](subfeed_common::SubfeedError); the
    /// engine propagates it without retrying.
    fn deliver(&mut self, frame: DeliveryFrame) -> SubfeedResult<()>;
}

/// Event source over a pre-loaded list of events, for replay and tests.
#[derive(Debug, Default)]
pub struct VecSource {
    events: std::collections::VecDeque<SubtitleEvent>,
}

impl VecSource {
    pub fn new(events: impl IntoIterator<Item = SubtitleEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for VecSource {
    fn pull_next_event(&mut self) -> SubfeedResult<SourcePull> {
        Ok(match self.events.pop_front() {
            Some(event) => SourcePull::Event(event),
            None => SourcePull::EndOfStream,
        })
    }
}

/// Frame sink that collects everything delivered to it.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub frames: Vec<DeliveryFrame>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for CollectSink {
    fn deliver(&mut self, frame: DeliveryFrame) -> SubfeedResult<()> {
        self.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subfeed_model::SharedPayload;

    #[test]
    fn test_vec_source_ends_sticky() {
        let mut source = VecSource::new([SubtitleEvent::timed(
            0,
            100,
            SharedPayload::markup("only"),
        )]);

        assert!(matches!(
            source.pull_next_event().unwrap(),
            SourcePull::Event(_)
        ));
        assert_eq!(source.pull_next_event().unwrap(), SourcePull::EndOfStream);
        assert_eq!(source.pull_next_event().unwrap(), SourcePull::EndOfStream);
    }
}
