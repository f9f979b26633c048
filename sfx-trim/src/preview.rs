//! Preview transport over the host media player
//!
//! The host owns actual playback. This wrapper keeps preview playback inside
//! the selected region: play starts at the region start when the cursor is
//! outside the selection, and reaching the region end stops and rewinds.

use crate::trim::TrimRegion;
use serde::Serialize;
use tracing::debug;

/// Host media playback capability
pub trait MediaPlayback {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
}

/// Snapshot read by the trim view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
}

pub struct PreviewTransport<P: MediaPlayback> {
    player: P,
    region: TrimRegion,
    duration: f64,
}

impl<P: MediaPlayback> PreviewTransport<P> {
    pub fn new(player: P, duration: f64) -> Self {
        let duration = duration.max(0.0);
        Self {
            player,
            region: TrimRegion::full(duration, 0.0),
            duration,
        }
    }

    /// Follow the controller's current region
    pub fn set_region(&mut self, region: TrimRegion) {
        self.region = region;
    }

    pub fn region(&self) -> TrimRegion {
        self.region
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.player.current_time(),
            is_playing: self.player.is_playing(),
        }
    }

    /// Play/pause button
    pub fn toggle(&mut self) -> PlaybackState {
        if self.player.is_playing() {
            self.player.pause();
        } else {
            if !self.region.contains(self.player.current_time()) {
                self.player.seek(self.region.start());
            }
            self.player.play();
        }
        self.state()
    }

    /// Move the cursor, e.g. from a waveform click
    pub fn seek(&mut self, seconds: f64) {
        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, self.duration)
        };
        self.player.seek(target);
    }

    /// Position update from the host; stops at the region end
    pub fn tick(&mut self) -> PlaybackState {
        if self.player.is_playing() && self.player.current_time() >= self.region.end() {
            debug!(
                end = self.region.end(),
                rewind_to = self.region.start(),
                "Preview reached region end"
            );
            self.player.pause();
            self.player.seek(self.region.start());
        }
        self.state()
    }

    /// Playhead position as a fraction of the track, for drawing
    pub fn playhead_fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.player.current_time() / self.duration).clamp(0.0, 1.0)
    }
}
