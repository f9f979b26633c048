//! Audio data path: decode, slice, serialize, overview
//!
//! Control flow: [`decoder`] turns the uploaded blob into a [`SampleBuffer`],
//! [`slicer`] cuts the selected region out of it, and [`wav`] serializes the
//! result for the transcoder. [`waveform`] feeds the trim view.

pub mod decoder;
pub mod slicer;
pub mod types;
pub mod wav;
pub mod waveform;

pub use decoder::{is_decodable, AudioDecoder, FormatHint, SymphoniaDecoder};
pub use types::{suggested_file_name, EncodedAsset, SampleBuffer, ASSET_MIME};
