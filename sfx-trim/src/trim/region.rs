//! Trim region value type and its clamping rules
//!
//! A region is a `[start, end)` range in seconds. For a source of length
//! `duration` and a minimum selection length `min_length`:
//!
//! - `0 <= start`
//! - `start + min_length <= end`
//! - `end <= duration`
//!
//! Regions are only produced through [`RegionLimits`], whose operations clamp
//! instead of rejecting, so holders of a `TrimRegion` never see an
//! out-of-range value.

use crate::error::InvalidRegion;
use serde::Serialize;

/// Slack for float comparisons when validating (seconds)
const REGION_EPSILON: f64 = 1e-9;

/// Selected time range, copied by value between controller, pipeline and UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimRegion {
    start: f64,
    end: f64,
}

impl TrimRegion {
    /// Whole-source region `(0, duration)`
    pub fn full(duration: f64, min_length: f64) -> Self {
        RegionLimits::new(duration, min_length).full()
    }

    /// Validated constructor; out-of-range input is an error rather than clamped
    pub fn new(start: f64, end: f64, duration: f64, min_length: f64) -> Result<Self, InvalidRegion> {
        let region = Self { start, end };
        RegionLimits::new(duration, min_length).validate(region)?;
        Ok(region)
    }

    /// Start in seconds
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End in seconds
    pub fn end(&self) -> f64 {
        self.end
    }

    /// `end - start` in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` lies inside `[start, end)`
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Bounds a region must respect for one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionLimits {
    duration: f64,
    min_length: f64,
}

impl RegionLimits {
    /// Limits for a source of `duration` seconds.
    ///
    /// Sources shorter than `min_length` can only be selected whole, so the
    /// effective minimum is capped at the duration.
    pub fn new(duration: f64, min_length: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let min_length = if min_length.is_finite() { min_length.max(0.0) } else { 0.0 };
        Self {
            duration,
            min_length: min_length.min(duration),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Effective minimum length
    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    /// `(0, duration)`
    pub fn full(&self) -> TrimRegion {
        TrimRegion {
            start: 0.0,
            end: self.duration,
        }
    }

    /// Clamp a requested start against the current end: `[0, end - min_length]`
    pub fn clamp_start(&self, value: f64, end: f64) -> f64 {
        clamp_between(value, 0.0, end - self.min_length)
    }

    /// Clamp a requested end against the current start: `[start + min_length, duration]`
    pub fn clamp_end(&self, value: f64, start: f64) -> f64 {
        clamp_between(value, start + self.min_length, self.duration)
    }

    /// Region with a new start, end unchanged
    pub fn with_start(&self, region: TrimRegion, value: f64) -> TrimRegion {
        if value.is_nan() {
            return region;
        }
        TrimRegion {
            start: self.clamp_start(value, region.end),
            end: region.end,
        }
    }

    /// Region with a new end, start unchanged
    pub fn with_end(&self, region: TrimRegion, value: f64) -> TrimRegion {
        if value.is_nan() {
            return region;
        }
        TrimRegion {
            start: region.start,
            end: self.clamp_end(value, region.start),
        }
    }

    /// Clamp both bounds: start first against the whole track, then end
    /// against the clamped start.
    pub fn clamp_region(&self, start: f64, end: f64) -> TrimRegion {
        let start = if start.is_nan() { 0.0 } else { start };
        let end = if end.is_nan() { self.duration } else { end };
        let start = clamp_between(start, 0.0, self.duration - self.min_length);
        TrimRegion {
            start,
            end: self.clamp_end(end, start),
        }
    }

    /// Move a region of fixed length so that it starts at `start`.
    ///
    /// If either edge would leave the track, the region is re-anchored to that
    /// boundary as a whole, so its length never changes.
    pub fn shift_to(&self, start: f64, length: f64) -> TrimRegion {
        let length = clamp_between(length, self.min_length, self.duration);
        if start.is_nan() || start <= 0.0 {
            return TrimRegion { start: 0.0, end: length };
        }
        if start + length >= self.duration {
            return TrimRegion {
                start: self.duration - length,
                end: self.duration,
            };
        }
        TrimRegion {
            start,
            end: start + length,
        }
    }

    /// Check the region invariant (with float slack)
    pub fn validate(&self, region: TrimRegion) -> Result<(), InvalidRegion> {
        let ok = region.start.is_finite()
            && region.end.is_finite()
            && region.start >= -REGION_EPSILON
            && region.start + self.min_length <= region.end + REGION_EPSILON
            && region.end <= self.duration + REGION_EPSILON;
        if ok {
            Ok(())
        } else {
            Err(InvalidRegion {
                start: region.start,
                end: region.end,
                duration: self.duration,
            })
        }
    }
}

/// `value` limited to `[lo, hi]`; never panics, `hi` wins if the bounds cross
fn clamp_between(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
