//! Timeline marks: timestamped word-boundary and viseme events.
//!
//! Marks arrive from the TTS/viseme service as a JSON array:
//!
//! ```json
//! [
//!   { "time": 0,   "type": "word",   "value": "ciao", "start": 0, "end": 4 },
//!   { "time": 10,  "type": "viseme", "value": "S" },
//!   { "time": 140, "type": "viseme", "value": "a" }
//! ]
//! ```
//!
//! `time` is milliseconds from clip start and is non-decreasing across the
//! sequence. `start`/`end` are character offsets into the spoken text,
//! present only on word marks; the face driver ignores them. A sequence is
//! owned by exactly one playback session and discarded with it.

use serde::{Deserialize, Serialize};

use crate::error::{LipSyncError, Result};

/// What a mark describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    /// A word boundary. Informational only; no visual effect.
    Word,
    /// A viseme code from the phoneme-class alphabet.
    Viseme,
}

/// A discrete event in a synthesized-speech timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Milliseconds from clip start.
    #[serde(rename = "time")]
    pub time_ms: u32,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: MarkKind,
    /// Viseme code, or the spoken word for word marks.
    pub value: String,
    /// Character offset where the word starts (word marks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Character offset one past the word end (word marks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl Mark {
    /// A viseme mark with no text span.
    pub fn viseme(time_ms: u32, code: impl Into<String>) -> Self {
        Self {
            time_ms,
            kind: MarkKind::Viseme,
            value: code.into(),
            start: None,
            end: None,
        }
    }

    /// A word mark covering `start..end` of the spoken text.
    pub fn word(time_ms: u32, text: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            time_ms,
            kind: MarkKind::Word,
            value: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Parse a mark sequence from the TTS service's JSON array.
pub fn parse_marks(json: &str) -> Result<Vec<Mark>> {
    serde_json::from_str(json).map_err(|e| LipSyncError::Marks(format!("invalid mark JSON: {e}")))
}

/// Reject sequences that are not sorted ascending by `time`.
///
/// An unsorted sequence would silently desynchronize the playback cursor,
/// so it is refused up front instead of misbehaving mid-clip. Equal
/// timestamps are allowed; they drain in sequence order within one frame.
pub fn validate_marks(marks: &[Mark]) -> Result<()> {
    for pair in marks.windows(2) {
        if pair[1].time_ms < pair[0].time_ms {
            return Err(LipSyncError::Marks(format!(
                "marks out of order: {}ms after {}ms",
                pair[1].time_ms, pair[0].time_ms
            )));
        }
    }
    Ok(())
}
