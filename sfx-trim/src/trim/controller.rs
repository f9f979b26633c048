//! Drag/click state machine for the trim view
//!
//! Converts pointer input (x positions over a waveform of known pixel width)
//! into region changes and seek requests. The controller owns the current
//! [`TrimRegion`]; every accepted change is returned as
//! [`TrimUpdate::Region`] so the caller can forward it to the pipeline.
//!
//! While a drag is active the pointer is captured through [`PointerCapture`],
//! so moves that leave the waveform still reach the controller. Capture is
//! released on pointer up, pointer cancel, and when the controller is dropped
//! mid-drag.

use super::region::{RegionLimits, TrimRegion};
use crate::config::TrimSettings;
use crate::error::Result;
use sfx_common::human_time::{format_time_field, parse_time_field};
use tracing::{debug, trace};

/// Host hook for routing all pointer events to the trim view during a drag
pub trait PointerCapture {
    fn capture(&mut self);
    fn release(&mut self);
}

/// For hosts without pointer capture (and tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&mut self) {}
    fn release(&mut self) {}
}

/// What the pointer is currently manipulating
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    DraggingStart,
    DraggingEnd,
    /// Whole-region move; positions are relative to where the drag began
    DraggingRegion {
        anchor_x: f64,
        anchor_start: f64,
        anchor_end: f64,
    },
}

/// Result of hit-testing an x position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    StartHandle,
    EndHandle,
    RegionBody,
    /// Anywhere outside the selection
    Waveform,
}

/// Effect of one controller input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimUpdate {
    Unchanged,
    Region(TrimRegion),
    /// Click on the waveform outside the region: move the playhead
    Seek(f64),
}

/// Trim view controller for one loaded source
pub struct TrimController<C: PointerCapture = NoCapture> {
    limits: RegionLimits,
    region: TrimRegion,
    drag: DragState,
    width_px: f64,
    handle_tolerance_px: f64,
    capture: C,
}

impl TrimController<NoCapture> {
    /// Controller with default settings and no pointer capture
    pub fn for_duration(duration: f64, width_px: f64) -> Self {
        Self::new(duration, width_px, &TrimSettings::default(), NoCapture)
    }
}

impl<C: PointerCapture> TrimController<C> {
    /// New controller selecting the whole source
    pub fn new(duration: f64, width_px: f64, settings: &TrimSettings, capture: C) -> Self {
        let limits = RegionLimits::new(duration, settings.min_length_secs);
        Self {
            limits,
            region: limits.full(),
            drag: DragState::Idle,
            width_px: sanitize_width(width_px),
            handle_tolerance_px: settings.handle_tolerance_px.max(0.0),
            capture,
        }
    }

    pub fn region(&self) -> TrimRegion {
        self.region
    }

    pub fn limits(&self) -> RegionLimits {
        self.limits
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Waveform was resized
    pub fn set_width(&mut self, width_px: f64) {
        self.width_px = sanitize_width(width_px);
    }

    /// Pixel x to seconds, clamped to the track
    pub fn map_x(&self, x: f64) -> f64 {
        if self.width_px <= 0.0 || x.is_nan() {
            return 0.0;
        }
        (x / self.width_px).clamp(0.0, 1.0) * self.limits.duration()
    }

    /// Seconds to pixel x
    pub fn x_of(&self, seconds: f64) -> f64 {
        let duration = self.limits.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        seconds / duration * self.width_px
    }

    /// Which part of the view lies under `x`
    ///
    /// Handles win over the region body. When both handles are within
    /// tolerance (tiny regions), the nearer one is chosen.
    pub fn hit_test(&self, x: f64) -> HitTarget {
        let start_x = self.x_of(self.region.start());
        let end_x = self.x_of(self.region.end());
        let to_start = (x - start_x).abs();
        let to_end = (x - end_x).abs();
        let tol = self.handle_tolerance_px;

        if to_start <= tol || to_end <= tol {
            if to_end < to_start || (to_end == to_start && x >= end_x) {
                HitTarget::EndHandle
            } else {
                HitTarget::StartHandle
            }
        } else if x > start_x && x < end_x {
            HitTarget::RegionBody
        } else {
            HitTarget::Waveform
        }
    }

    /// Pointer pressed at `x`; the target is found by [`Self::hit_test`]
    pub fn pointer_down(&mut self, x: f64) -> TrimUpdate {
        let target = self.hit_test(x);
        self.pointer_down_on(x, target)
    }

    /// Pointer pressed at `x` on a target the host already resolved
    pub fn pointer_down_on(&mut self, x: f64, target: HitTarget) -> TrimUpdate {
        if self.is_dragging() {
            return TrimUpdate::Unchanged;
        }
        let next = match target {
            HitTarget::StartHandle => DragState::DraggingStart,
            HitTarget::EndHandle => DragState::DraggingEnd,
            HitTarget::RegionBody => DragState::DraggingRegion {
                anchor_x: x,
                anchor_start: self.region.start(),
                anchor_end: self.region.end(),
            },
            HitTarget::Waveform => {
                let t = self.map_x(x);
                debug!(seconds = t, "Seek from waveform click");
                return TrimUpdate::Seek(t);
            }
        };
        trace!(?next, x, "Drag started");
        self.drag = next;
        self.capture.capture();
        TrimUpdate::Unchanged
    }

    /// Pointer moved to `x`; only meaningful while dragging
    pub fn pointer_move(&mut self, x: f64) -> TrimUpdate {
        let next = match self.drag {
            DragState::Idle => return TrimUpdate::Unchanged,
            DragState::DraggingStart => self.limits.with_start(self.region, self.map_x(x)),
            DragState::DraggingEnd => self.limits.with_end(self.region, self.map_x(x)),
            DragState::DraggingRegion {
                anchor_x,
                anchor_start,
                anchor_end,
            } => {
                let delta = self.map_x(x) - self.map_x(anchor_x);
                self.limits.shift_to(anchor_start + delta, anchor_end - anchor_start)
            }
        };
        self.apply(next)
    }

    /// Pointer released; ends any drag
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    /// Pointer lost (focus change, touch cancel); the region keeps its last value
    pub fn pointer_cancel(&mut self) {
        if self.is_dragging() {
            debug!("Drag cancelled");
        }
        self.end_drag();
    }

    /// Typed start value, clamped
    pub fn set_start(&mut self, seconds: f64) -> TrimUpdate {
        let next = self.limits.with_start(self.region, seconds);
        self.apply(next)
    }

    /// Typed end value, clamped
    pub fn set_end(&mut self, seconds: f64) -> TrimUpdate {
        let next = self.limits.with_end(self.region, seconds);
        self.apply(next)
    }

    /// Set both bounds at once, clamped
    pub fn set_region(&mut self, start: f64, end: f64) -> TrimUpdate {
        let next = self.limits.clamp_region(start, end);
        self.apply(next)
    }

    /// Parse a start field ("1.5", "0:01.50") and apply it
    pub fn set_start_text(&mut self, text: &str) -> Result<TrimUpdate> {
        let seconds = parse_time_field(text)?;
        Ok(self.set_start(seconds))
    }

    /// Parse an end field and apply it
    pub fn set_end_text(&mut self, text: &str) -> Result<TrimUpdate> {
        let seconds = parse_time_field(text)?;
        Ok(self.set_end(seconds))
    }

    /// Display text for the start field
    pub fn start_text(&self) -> String {
        format_time_field(self.region.start(), self.limits.duration())
    }

    /// Display text for the end field
    pub fn end_text(&self) -> String {
        format_time_field(self.region.end(), self.limits.duration())
    }

    /// Select the whole source
    pub fn select_all(&mut self) -> TrimUpdate {
        let next = self.limits.full();
        self.apply(next)
    }

    /// Select `(0, seconds)`
    pub fn first_seconds(&mut self, seconds: f64) -> TrimUpdate {
        self.set_region(0.0, seconds)
    }

    /// Select `(duration - seconds, duration)`
    pub fn last_seconds(&mut self, seconds: f64) -> TrimUpdate {
        let duration = self.limits.duration();
        self.set_region(duration - seconds, duration)
    }

    fn apply(&mut self, next: TrimRegion) -> TrimUpdate {
        if next == self.region {
            return TrimUpdate::Unchanged;
        }
        trace!(start = next.start(), end = next.end(), "Region changed");
        self.region = next;
        TrimUpdate::Region(next)
    }

    fn end_drag(&mut self) {
        if self.is_dragging() {
            self.drag = DragState::Idle;
            self.capture.release();
        }
    }
}

impl<C: PointerCapture> Drop for TrimController<C> {
    fn drop(&mut self) {
        self.end_drag();
    }
}

fn sanitize_width(width_px: f64) -> f64 {
    if width_px.is_finite() && width_px > 0.0 {
        width_px
    } else {
        0.0
    }
}
