//! Sample-accurate extraction of a trim region
//!
//! `start_frame = floor(start * rate)`, `end_frame = floor(end * rate)`, and
//! `[start_frame, end_frame)` is copied from every channel into a new buffer
//! with the same rate and channel count.

use super::types::SampleBuffer;
use crate::trim::TrimRegion;
use tracing::trace;

/// Cut `region` out of `buffer`.
///
/// Deterministic and side-effect free. The region invariant already guarantees
/// a minimum length; `end_frame` is still clamped to the buffer length for the
/// float rounding case at the exact duration boundary.
pub fn slice(buffer: &SampleBuffer, region: TrimRegion) -> SampleBuffer {
    let frame_count = buffer.frame_count();
    let end_frame = buffer.frame_at(region.end()).min(frame_count);
    let start_frame = buffer.frame_at(region.start()).min(end_frame);

    trace!(
        start_frame,
        end_frame,
        frame_count,
        "Slicing sample buffer"
    );

    let channels = buffer
        .channels()
        .iter()
        .map(|samples| samples[start_frame..end_frame].to_vec())
        .collect();

    SampleBuffer::from_trusted(buffer.sample_rate(), channels)
}
