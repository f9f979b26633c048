//! Waveform overview peaks
//!
//! The trim view draws the source as min/max pairs over equal frame buckets of
//! the channel-averaged signal.

use super::types::SampleBuffer;
use serde::Serialize;

/// Min/max of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

/// Compute at most `bucket_count` peaks for `buffer`.
///
/// Buckets hold `ceil(frames / bucket_count)` frames each, so fewer buckets are
/// returned for very short sources. An empty buffer yields no peaks.
pub fn peaks(buffer: &SampleBuffer, bucket_count: usize) -> Vec<Peak> {
    let frames = buffer.frame_count();
    if frames == 0 || bucket_count == 0 {
        return Vec::new();
    }

    let bucket_size = frames.div_ceil(bucket_count).max(1);
    let channels = buffer.channels();
    let scale = 1.0 / channels.len() as f32;

    let mut out = Vec::with_capacity(frames.div_ceil(bucket_size));
    let mut start = 0;
    while start < frames {
        let end = (start + bucket_size).min(frames);
        let mut peak = Peak {
            min: f32::MAX,
            max: f32::MIN,
        };
        for frame in start..end {
            let mixed: f32 = channels.iter().map(|c| c[frame]).sum::<f32>() * scale;
            peak.min = peak.min.min(mixed);
            peak.max = peak.max.max(mixed);
        }
        out.push(peak);
        start = end;
    }

    out
}
