//! Audio decoder using symphonia
//!
//! Decodes an uploaded blob (MP3, FLAC, AAC/M4A, Vorbis, WAV) into a planar
//! [`SampleBuffer`] at the source's native sample rate.
//!
//! The host codec is reached through the [`AudioDecoder`] trait so the pipeline
//! can run against any platform decoder; [`SymphoniaDecoder`] is the bundled
//! implementation.

use super::types::{BufferShapeError, SampleBuffer};
use crate::error::DecodeError;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer as PacketBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// File extensions the bundled decoder understands
pub const DECODABLE_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "wave", "flac", "ogg", "oga", "m4a", "mp4", "aac",
];

/// Format hints taken from the upload (declared MIME type and file name)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatHint {
    /// Declared MIME type, e.g. `audio/mpeg`
    pub mime: Option<String>,
    /// Lowercased file extension without the dot
    pub extension: Option<String>,
}

impl FormatHint {
    /// Build from a declared MIME type and original file name
    pub fn new(mime: &str, file_name: &str) -> Self {
        let mime = mime.trim();
        Self {
            mime: (!mime.is_empty()).then(|| mime.to_ascii_lowercase()),
            extension: extension_of(file_name),
        }
    }

    fn to_symphonia(&self) -> Hint {
        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }
        if let Some(mime) = &self.mime {
            hint.mime_type(mime);
        }
        hint
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether a dropped file looks like something the trim tool can decode.
///
/// Any `audio/*` MIME type is accepted, as is a known audio extension when the
/// browser/OS reported a generic type such as `application/octet-stream`.
pub fn is_decodable(mime: &str, file_name: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.starts_with("audio/") {
        return true;
    }
    extension_of(file_name)
        .map(|ext| DECODABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Host decode capability
///
/// Implementations must be pure with respect to external state and must not
/// return a partial buffer alongside an error.
pub trait AudioDecoder: Send + Sync {
    /// Decode a complete compressed or uncompressed blob
    fn decode(&self, bytes: &[u8], hint: &FormatHint) -> Result<SampleBuffer, DecodeError>;
}

/// Decoder backed by symphonia's default format and codec registries
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    /// Decode the whole blob.
    ///
    /// The format reader and codec context live only for the duration of this
    /// call and are dropped on every return path.
    ///
    /// # Errors
    /// - `UnsupportedFormat`: no format reader or codec for the data
    /// - `CorruptData`: the stream breaks off before any audio, or yields no frames
    fn decode(&self, bytes: &[u8], hint: &FormatHint) -> Result<SampleBuffer, DecodeError> {
        debug!(
            len = bytes.len(),
            mime = ?hint.mime,
            extension = ?hint.extension,
            "Decoding source blob"
        );

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint.to_symphonia(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| match e {
                SymphoniaError::Unsupported(what) => {
                    DecodeError::UnsupportedFormat(format!("Failed to probe format: {}", what))
                }
                other => DecodeError::CorruptData(format!("Failed to probe format: {}", other)),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::UnsupportedFormat("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let reported_frames = codec_params.n_frames;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| match e {
                SymphoniaError::Unsupported(what) => {
                    DecodeError::UnsupportedFormat(format!("Unsupported codec: {}", what))
                }
                other => DecodeError::CorruptData(format!("Failed to create decoder: {}", other)),
            })?;

        let mut sample_rate = codec_params.sample_rate;
        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut packet_buf: Option<PacketBuffer<f32>> = None;
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    debug!("Stream reset required, stopping at current position");
                    break;
                }
                Err(e) => {
                    if channels.is_empty() {
                        return Err(DecodeError::CorruptData(format!(
                            "Failed to read packet: {}",
                            e
                        )));
                    }
                    warn!("Error reading packet, truncating decode: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    skipped_packets += 1;
                    warn!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::CorruptData(format!("Decode error: {}", e)));
                }
            };

            let spec = *decoded.spec();
            let channel_count = spec.channels.count();
            if channel_count == 0 {
                continue;
            }
            if channels.is_empty() {
                channels = vec![Vec::new(); channel_count];
                sample_rate = sample_rate.or(Some(spec.rate));
            } else if channels.len() != channel_count {
                return Err(DecodeError::CorruptData(format!(
                    "Channel count changed mid-stream ({} -> {})",
                    channels.len(),
                    channel_count
                )));
            }

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let needs_alloc = packet_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < decoded.capacity() * channel_count);
            if needs_alloc {
                packet_buf = Some(PacketBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = packet_buf.as_mut() else {
                continue;
            };
            buf.copy_planar_ref(decoded);

            for (channel, plane) in channels.iter_mut().zip(buf.samples().chunks_exact(frames)) {
                channel.extend_from_slice(plane);
            }
        }

        let sample_rate = sample_rate
            .ok_or_else(|| DecodeError::CorruptData("Sample rate not found".to_string()))?;

        if channels.is_empty() || channels[0].is_empty() {
            return Err(DecodeError::CorruptData("No audio frames decoded".to_string()));
        }

        // Never run past the duration the container reports
        if let Some(limit) = reported_frames {
            let limit = limit as usize;
            if channels[0].len() > limit {
                debug!(
                    decoded = channels[0].len(),
                    reported = limit,
                    "Truncating decoded frames to reported duration"
                );
                for channel in channels.iter_mut() {
                    channel.truncate(limit);
                }
            }
        }

        let buffer = SampleBuffer::new(sample_rate, channels).map_err(|e| match e {
            BufferShapeError::ChannelCount(n) => {
                DecodeError::UnsupportedFormat(format!("Unsupported channel count: {}", n))
            }
            other => DecodeError::CorruptData(other.to_string()),
        })?;

        debug!(
            sample_rate = buffer.sample_rate(),
            channels = buffer.channel_count(),
            frames = buffer.frame_count(),
            skipped_packets,
            "Decoded source"
        );

        Ok(buffer)
    }
}
