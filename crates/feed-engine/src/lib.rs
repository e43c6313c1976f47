//! Subfeed Engine — subtitle event timing & delivery
//!
//! Turns a sparse, irregularly-timed stream of subtitle events into a
//! well-formed, monotonically increasing stream of delivery frames driven
//! by downstream demand:
//! - **Event Queue:** Ordered buffer of pending events awaiting delivery
//! - **Corrections:** Duration inference and overlap cleanup applied as
//!   events arrive
//! - **Delivery Scheduler:** Pull-driven repeat / scatter / forward state
//!   machine, one frame per demand pulse
//! - **Pending-Tail Deferral:** One-event lookahead for decoders that
//!   cannot report an end time until the next decode call
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data. Exactly one thread drives
//! the engine; suspension happens only at the upstream and downstream
//! boundary calls.

pub mod corrections;
pub mod deferral;
pub mod engine;
pub mod queue;
pub mod scheduler;
pub mod stream;

pub use deferral::PendingTail;
pub use engine::{FeedEngine, FeedStats};
pub use queue::EventQueue;
pub use stream::{CollectSink, EventSource, FrameSink, SourcePull, VecSource};
