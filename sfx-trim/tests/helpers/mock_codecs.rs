//! Stand-ins for the decode and encode capabilities
//!
//! `MockTranscoder` passes the WAV through unchanged as the "encoded" bytes, so
//! tests can read back exactly which frames were recomputed.

use async_trait::async_trait;
use sfx_trim::audio::wav::WAV_HEADER_LEN;
use sfx_trim::{AudioDecoder, DecodeError, EncodedAsset, FormatHint, SampleBuffer, TranscodeError, Transcoder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Returns a fixed buffer for any input
pub struct MockDecoder {
    buffer: SampleBuffer,
}

impl MockDecoder {
    pub fn new(buffer: SampleBuffer) -> Arc<Self> {
        Arc::new(Self { buffer })
    }

    /// Mono silence of `seconds` at 44.1 kHz
    pub fn silence(seconds: f64) -> Arc<Self> {
        let frames = (seconds * 44100.0) as usize;
        Self::new(SampleBuffer::silence(44100, 1, frames).unwrap())
    }
}

impl AudioDecoder for MockDecoder {
    fn decode(&self, _bytes: &[u8], _hint: &FormatHint) -> Result<SampleBuffer, DecodeError> {
        Ok(self.buffer.clone())
    }
}

/// Decodes by duration: the first byte of the blob is the length in seconds
pub struct DurationByteDecoder;

impl AudioDecoder for DurationByteDecoder {
    fn decode(&self, bytes: &[u8], _hint: &FormatHint) -> Result<SampleBuffer, DecodeError> {
        let seconds = *bytes
            .first()
            .ok_or_else(|| DecodeError::CorruptData("empty".into()))?;
        SampleBuffer::silence(44100, 1, seconds as usize * 44100)
            .map_err(|e| DecodeError::CorruptData(e.to_string()))
    }
}

/// Like [`DurationByteDecoder`], but a second byte of 1 holds the decode
/// until [`GatedDecoder::open`] is called
#[derive(Default)]
pub struct GatedDecoder {
    open: Mutex<bool>,
    gate: Condvar,
    /// Signalled when a held decode starts waiting
    pub held: Notify,
    /// Signalled when a held decode returns its buffer
    pub released: Notify,
}

impl GatedDecoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.gate.notify_all();
    }
}

impl AudioDecoder for GatedDecoder {
    fn decode(&self, bytes: &[u8], hint: &FormatHint) -> Result<SampleBuffer, DecodeError> {
        let gated = bytes.get(1) == Some(&1);
        if gated {
            self.held.notify_one();
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.gate.wait(open).unwrap();
            }
        }
        let buffer = DurationByteDecoder.decode(bytes, hint);
        if gated {
            self.released.notify_one();
        }
        buffer
    }
}

/// Panics inside the blocking decode task
pub struct PanickingDecoder;

impl AudioDecoder for PanickingDecoder {
    fn decode(&self, _bytes: &[u8], _hint: &FormatHint) -> Result<SampleBuffer, DecodeError> {
        panic!("decoder crashed");
    }
}

/// Pass-through transcoder with call accounting and failure injection
#[derive(Default)]
pub struct MockTranscoder {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    /// Data payload size of every WAV received, in bytes
    payloads: Mutex<Vec<usize>>,
}

impl MockTranscoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Each transcode sleeps this long (tokio time, so paused clocks apply)
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let transcoder = Self::default();
        *transcoder.delay.lock().unwrap() = Some(delay);
        Arc::new(transcoder)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Frame counts of every mono WAV received
    pub fn mono_frames(&self) -> Vec<usize> {
        self.payloads.lock().unwrap().iter().map(|len| len / 2).collect()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, wav: &[u8], output_name: &str) -> Result<EncodedAsset, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .unwrap()
            .push(wav.len().saturating_sub(WAV_HEADER_LEN));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(TranscodeError::EncodeFailed("injected failure".into()));
        }
        Ok(EncodedAsset::mpeg(wav.to_vec(), output_name))
    }
}
