//! Opaque subtitle content payloads.
//!
//! The engine never inspects payload contents; it copies references only.
//! Payloads are reference-counted so a queued event and every delivery
//! frame repeating it share one allocation.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Content representation agreed between event producer and frame consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    /// A list of positioned bitmap regions.
    Bitmap,
    /// Styled markup text.
    Markup,
}

/// Pick the first format both sides support.
///
/// Models the format negotiation step that happens outside the engine;
/// the engine itself is agnostic to the outcome.
pub fn negotiate(producer: &[ContentFormat], consumer: &[ContentFormat]) -> Option<ContentFormat> {
    producer
        .iter()
        .copied()
        .find(|format| consumer.contains(format))
}

/// A positioned bitmap region within a subtitle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitmapRegion {
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
}

/// Payload contents, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadBody {
    /// No content (filler frames).
    Empty,

    /// Styled markup text.
    Markup { text: String },

    /// Positioned bitmap regions.
    Bitmap { regions: Vec<BitmapRegion> },
}

impl PayloadBody {
    /// Content format of this body, if it carries content.
    pub fn format(&self) -> Option<ContentFormat> {
        match self {
            Self::Empty => None,
            Self::Markup { .. } => Some(ContentFormat::Markup),
            Self::Bitmap { .. } => Some(ContentFormat::Bitmap),
        }
    }
}

/// Reference-counted handle to a payload body.
///
/// Cloning copies the reference, never the contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedPayload(Arc<PayloadBody>);

impl SharedPayload {
    pub fn new(body: PayloadBody) -> Self {
        Self(Arc::new(body))
    }

    /// Empty payload used by filler frames.
    pub fn empty() -> Self {
        Self::new(PayloadBody::Empty)
    }

    /// Markup text payload.
    pub fn markup(text: impl Into<String>) -> Self {
        Self::new(PayloadBody::Markup { text: text.into() })
    }

    /// Bitmap region payload.
    pub fn bitmap(regions: Vec<BitmapRegion>) -> Self {
        Self::new(PayloadBody::Bitmap { regions })
    }

    pub fn body(&self) -> &PayloadBody {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self.0, PayloadBody::Empty)
    }

    /// Number of live references to this payload (event + frames).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Whether two handles share one allocation.
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for SharedPayload {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for SharedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PayloadBody::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_prefers_producer_order() {
        let producer = [ContentFormat::Bitmap, ContentFormat::Markup];
        let consumer = [ContentFormat::Markup, ContentFormat::Bitmap];
        assert_eq!(negotiate(&producer, &consumer), Some(ContentFormat::Bitmap));

        let text_only = [ContentFormat::Markup];
        assert_eq!(negotiate(&producer, &text_only), Some(ContentFormat::Markup));
        assert_eq!(negotiate(&[ContentFormat::Bitmap], &text_only), None);
    }

    #[test]
    fn test_clone_shares_allocation() {
        let payload = SharedPayload::markup("Hello");
        let copy = payload.clone();
        assert!(payload.shares_with(&copy));
        assert_eq!(payload.ref_count(), 2);
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = SharedPayload::bitmap(vec![BitmapRegion {
            x: 10,
            y: 20,
            width: 320,
            height: 64,
        }]);
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: SharedPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, parsed);
        assert_eq!(parsed.body().format(), Some(ContentFormat::Bitmap));
    }

    #[test]
    fn test_empty_payload_has_no_format() {
        assert!(SharedPayload::empty().is_empty());
        assert_eq!(SharedPayload::empty().body().format(), None);
    }
}
