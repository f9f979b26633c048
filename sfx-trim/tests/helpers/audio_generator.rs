//! Test audio generation
//!
//! WAV fixtures are written with hound so the decoder is exercised against an
//! independent encoder rather than our own serializer.

use hound::{SampleFormat, WavSpec, WavWriter};
use sfx_trim::SampleBuffer;
use std::f32::consts::PI;
use std::io::Cursor;
use std::path::Path;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

fn spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn sine_sample(frame: u64, sample_rate: u32, frequency_hz: f32, amplitude: f32) -> i16 {
    let t = frame as f32 / sample_rate as f32;
    let value = amplitude * (2.0 * PI * frequency_hz * t).sin();
    (value * i16::MAX as f32) as i16
}

/// Sine wave WAV as an in-memory blob, same signal on every channel
pub fn sine_wav_bytes(sample_rate: u32, channels: u16, frames: u64, frequency_hz: f32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec(sample_rate, channels)).unwrap();
        for frame in 0..frames {
            let sample = sine_sample(frame, sample_rate, frequency_hz, 0.5);
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Sine wave WAV file on disk
pub fn write_sine_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    frames: u64,
    frequency_hz: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec(sample_rate, channels))?;
    for frame in 0..frames {
        let sample = sine_sample(frame, sample_rate, frequency_hz, 0.5);
        for _ in 0..channels {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()
}

/// Mono ramp from -1 to just under 1, handy for checking which frames a slice kept
pub fn ramp_buffer(sample_rate: u32, frames: usize) -> SampleBuffer {
    let samples = (0..frames)
        .map(|i| -1.0 + 2.0 * i as f32 / frames as f32)
        .collect();
    SampleBuffer::new(sample_rate, vec![samples]).unwrap()
}
