//! Pipeline events
//!
//! Published on a [`sfx_common::EventBus`] so hosts can follow a trim session
//! (progress indicators, error banners) without polling. Events are advisory:
//! nothing in the pipeline waits for them to be received.

use crate::trim::TrimRegion;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Trim session events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TrimEvent {
    /// A source finished decoding and became the current one
    SourceLoaded {
        session_id: Uuid,
        generation: u64,
        duration_secs: f64,
        sample_rate: u32,
        channel_count: u8,
        timestamp: DateTime<Utc>,
    },

    /// A source could not be decoded; a new file has to be picked
    SourceFailed {
        session_id: Uuid,
        generation: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Debounce expired, slice/serialize/transcode started
    RecomputeStarted {
        session_id: Uuid,
        generation: u64,
        sequence: u64,
        region: TrimRegion,
        timestamp: DateTime<Utc>,
    },

    /// A fresh asset replaced the previous one
    AssetReady {
        session_id: Uuid,
        generation: u64,
        sequence: u64,
        region: TrimRegion,
        byte_len: usize,
        suggested_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A finished recompute was overtaken by a newer change and dropped
    RecomputeDiscarded {
        session_id: Uuid,
        generation: u64,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// Encoding failed; the previous asset (if any) is kept
    TranscodeFailed {
        session_id: Uuid,
        generation: u64,
        sequence: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TrimEvent {
    /// Event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            TrimEvent::SourceLoaded { .. } => "SourceLoaded",
            TrimEvent::SourceFailed { .. } => "SourceFailed",
            TrimEvent::RecomputeStarted { .. } => "RecomputeStarted",
            TrimEvent::AssetReady { .. } => "AssetReady",
            TrimEvent::RecomputeDiscarded { .. } => "RecomputeDiscarded",
            TrimEvent::TranscodeFailed { .. } => "TranscodeFailed",
        }
    }

    /// Session that produced the event
    pub fn session_id(&self) -> Uuid {
        match self {
            TrimEvent::SourceLoaded { session_id, .. }
            | TrimEvent::SourceFailed { session_id, .. }
            | TrimEvent::RecomputeStarted { session_id, .. }
            | TrimEvent::AssetReady { session_id, .. }
            | TrimEvent::RecomputeDiscarded { session_id, .. }
            | TrimEvent::TranscodeFailed { session_id, .. } => *session_id,
        }
    }
}
