//! Canonical 16-bit PCM WAV serialization
//!
//! Layout (all integers little-endian, 44-byte header):
//!
//! | offset | size | value                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 4    | `RIFF`                                  |
//! | 4      | 4    | `36 + data_size`                        |
//! | 8      | 4    | `WAVE`                                  |
//! | 12     | 4    | `fmt `                                  |
//! | 16     | 4    | 16 (fmt chunk size)                     |
//! | 20     | 2    | 1 (PCM)                                 |
//! | 22     | 2    | channel count                           |
//! | 24     | 4    | sample rate                             |
//! | 28     | 4    | byte rate = rate * channels * 2         |
//! | 32     | 2    | block align = channels * 2              |
//! | 34     | 2    | 16 (bits per sample)                    |
//! | 36     | 4    | `data`                                  |
//! | 40     | 4    | data_size = frames * channels * 2       |
//! | 44     | ..   | interleaved i16 samples                 |

use super::types::SampleBuffer;

/// Size of the canonical header in bytes
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u32 = 2;
const FMT_CHUNK_LEN: u32 = 16;

/// Largest data chunk a RIFF header can describe (`36 + data_size` must fit in u32)
pub const MAX_DATA_LEN: u32 = u32::MAX - 36;

/// Data chunk size for `frame_count` frames, or `None` past [`MAX_DATA_LEN`].
pub fn data_len(frame_count: usize, channel_count: u8) -> Option<u32> {
    let block_align = u64::from(channel_count) * u64::from(BYTES_PER_SAMPLE);
    let bytes = u64::try_from(frame_count).ok()?.checked_mul(block_align)?;
    u32::try_from(bytes).ok().filter(|&len| len <= MAX_DATA_LEN)
}

/// Most whole frames a single WAV can hold at this channel count
pub fn max_frames(channel_count: u8) -> usize {
    let block_align = u32::from(channel_count.max(1)) * BYTES_PER_SAMPLE;
    (MAX_DATA_LEN / block_align) as usize
}

/// Serialize a buffer into a canonical PCM WAV byte stream.
///
/// Pure function; output length is `44 + frames * channels * 2`. Buffers past
/// the RIFF size limit are cut to [`max_frames`] so the header stays valid.
pub fn serialize(buffer: &SampleBuffer) -> Vec<u8> {
    let channel_count = u32::from(buffer.channel_count());
    let frame_count = buffer.frame_count().min(max_frames(buffer.channel_count()));
    let data_size = data_len(frame_count, buffer.channel_count()).unwrap_or(0);

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&(channel_count as u16).to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&(buffer.sample_rate() * channel_count * BYTES_PER_SAMPLE).to_le_bytes());
    out.extend_from_slice(&((channel_count * BYTES_PER_SAMPLE) as u16).to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    let channels = buffer.channels();
    for frame in 0..frame_count {
        for channel in channels {
            out.extend_from_slice(&sample_to_i16(channel[frame]).to_le_bytes());
        }
    }

    out
}

/// Convert a float sample to signed 16-bit.
///
/// Positive values scale by 32767 and negative values by 32768 so that both
/// -1.0 and 1.0 map onto the full i16 range. The product truncates toward zero.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}
