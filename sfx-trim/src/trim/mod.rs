//! Trim region model and pointer interaction

pub mod controller;
pub mod region;

pub use controller::{DragState, HitTarget, NoCapture, PointerCapture, TrimController, TrimUpdate};
pub use region::{RegionLimits, TrimRegion};
