//! Subfeed Data Model
//!
//! Defines the core data contracts for the subtitle delivery pipeline:
//! - **Events:** Source-reported subtitle intervals with start time and
//!   (possibly unknown) duration
//! - **Frames:** Consumer-facing delivery instances emitted at cadence ticks
//! - **Payloads:** Opaque, reference-counted content blobs passed through
//!   the engine untouched
//!
//! All timing is integer milliseconds on a monotonic source clock; the
//! "unknown duration" sentinel used by legacy decoders is converted to a
//! proper variant type at this boundary and never leaks into the engine.

pub mod event;
pub mod frame;
pub mod payload;

pub use event::*;
pub use frame::*;
pub use payload::*;
