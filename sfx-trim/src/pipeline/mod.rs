//! Trim pipeline orchestrator
//!
//! One [`TrimPipeline`] per upload session. It runs as a single tokio task that
//! exclusively owns the decoded [`SampleBuffer`], the current [`TrimRegion`]
//! and the latest [`EncodedAsset`]; callers talk to it through a cloneable
//! [`PipelineHandle`]. There are no locks: all state changes happen on the
//! actor task, in the order commands arrive.
//!
//! # Recompute scheduling
//!
//! - Every region change re-arms a trailing debounce (300 ms by default).
//! - When the debounce expires, slice → serialize → transcode runs as one task.
//! - A change arriving while that task runs does not cancel it. Its result is
//!   dropped when it settles, and the newer region is recomputed.
//! - Loading a new source bumps the generation; anything still in flight for
//!   the previous source is discarded on arrival.
//!
//! Assets are only handed out on [`PipelineHandle::submit`], which waits for
//! the pipeline to settle first.

pub mod debounce;

pub use debounce::Debouncer;

use crate::audio::waveform::{self, Peak};
use crate::audio::{
    is_decodable, slicer, suggested_file_name, wav, AudioDecoder, EncodedAsset, FormatHint,
    SampleBuffer,
};
use crate::config::TrimSettings;
use crate::error::{DecodeError, Error, Result, TranscodeError};
use crate::events::TrimEvent;
use crate::transcode::Transcoder;
use crate::trim::{RegionLimits, TrimRegion};
use chrono::Utc;
use serde::Serialize;
use sfx_common::EventBus;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Command channel depth
const COMMAND_CAPACITY: usize = 64;

/// Result of loading a source, for the trim view
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    /// Generation to quote in region updates for this source
    pub generation: u64,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channel_count: u8,
    pub frame_count: usize,
    /// Initial (full) selection
    pub region: TrimRegion,
    /// Waveform overview
    pub peaks: Vec<Peak>,
}

/// Point-in-time view of the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub session_id: Uuid,
    pub generation: u64,
    pub region: Option<TrimRegion>,
    pub decoding: bool,
    pub recompute_pending: bool,
    pub recompute_in_flight: bool,
    pub asset_ready: bool,
    pub last_error: Option<String>,
}

enum Command {
    Load {
        bytes: Vec<u8>,
        mime: String,
        file_name: String,
        reply: oneshot::Sender<Result<SourceInfo>>,
    },
    UpdateRegion {
        generation: u64,
        region: TrimRegion,
        reply: oneshot::Sender<Result<()>>,
    },
    Submit {
        title: String,
        reply: oneshot::Sender<Result<EncodedAsset>>,
    },
    Status {
        reply: oneshot::Sender<PipelineStatus>,
    },
}

/// Entry point: spawns the pipeline task
pub struct TrimPipeline;

impl TrimPipeline {
    /// Spawn a pipeline for one upload session.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(
        decoder: Arc<dyn AudioDecoder>,
        transcoder: Arc<dyn Transcoder>,
        settings: TrimSettings,
    ) -> PipelineHandle {
        let session_id = Uuid::new_v4();
        let events = EventBus::new(settings.event_capacity);
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);

        let actor = PipelineActor {
            session_id,
            decoder,
            transcoder,
            debouncer: Debouncer::new(settings.debounce()),
            settings,
            events: events.clone(),
            rx,
            generation: 0,
            source: None,
            decoding: None,
            recompute: None,
            rerun: false,
            asset: None,
            last_decode_error: None,
            last_transcode_error: None,
            waiters: Vec::new(),
        };

        let span = info_span!("trim_pipeline", session_id = %session_id);
        tokio::spawn(actor.run().instrument(span));

        PipelineHandle {
            tx,
            events,
            session_id,
        }
    }
}

/// Cloneable handle to a running pipeline
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<Command>,
    events: EventBus<TrimEvent>,
    session_id: Uuid,
}

impl PipelineHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<TrimEvent> {
        self.events.subscribe()
    }

    /// Decode `bytes` and make it the current source.
    ///
    /// Anything in flight for the previous source is invalidated immediately.
    /// If another load is issued before this one finishes, this call returns
    /// [`Error::Superseded`].
    pub async fn load_source(&self, bytes: Vec<u8>, mime: &str, file_name: &str) -> Result<SourceInfo> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Load {
            bytes,
            mime: mime.to_string(),
            file_name: file_name.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::PipelineClosed)?
    }

    /// Report a region change for the source loaded as `generation`
    pub async fn update_region(&self, generation: u64, region: TrimRegion) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UpdateRegion {
            generation,
            region,
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::PipelineClosed)?
    }

    /// Wait until the pipeline has settled and return the current asset,
    /// named after `title`.
    pub async fn submit(&self, title: &str) -> Result<EncodedAsset> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            title: title.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::PipelineClosed)?
    }

    pub async fn status(&self) -> Result<PipelineStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| Error::PipelineClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::PipelineClosed)
    }
}

/// The decoded source currently being trimmed
struct Source {
    generation: u64,
    buffer: Arc<SampleBuffer>,
    limits: RegionLimits,
    region: TrimRegion,
    asset_name: String,
}

/// A spawned task plus what we need to know when it settles
struct Job<M, T> {
    meta: M,
    handle: JoinHandle<T>,
}

struct DecodeMeta {
    generation: u64,
    file_name: String,
    reply: oneshot::Sender<Result<SourceInfo>>,
}

struct RecomputeMeta {
    generation: u64,
    sequence: u64,
    region: TrimRegion,
}

type DecodeJob = Job<DecodeMeta, std::result::Result<SampleBuffer, DecodeError>>;
type RecomputeJob = Job<RecomputeMeta, std::result::Result<EncodedAsset, TranscodeError>>;

/// Resolves when the job in `slot` finishes, never if the slot is empty
async fn settled<M, T>(slot: &mut Option<Job<M, T>>) -> std::result::Result<T, JoinError> {
    match slot.as_mut() {
        Some(job) => (&mut job.handle).await,
        None => std::future::pending().await,
    }
}

/// Slice and serialize on the blocking pool; both copy the whole selection
async fn render_wav(
    buffer: Arc<SampleBuffer>,
    region: TrimRegion,
) -> std::result::Result<Vec<u8>, TranscodeError> {
    tokio::task::spawn_blocking(move || wav::serialize(&slicer::slice(&buffer, region)))
        .await
        .map_err(|e| TranscodeError::EncodeFailed(format!("Render task failed: {}", e)))
}

struct PipelineActor {
    session_id: Uuid,
    decoder: Arc<dyn AudioDecoder>,
    transcoder: Arc<dyn Transcoder>,
    settings: TrimSettings,
    events: EventBus<TrimEvent>,
    rx: mpsc::Receiver<Command>,

    /// Bumped on every load request
    generation: u64,
    source: Option<Source>,
    debouncer: Debouncer,
    decoding: Option<DecodeJob>,
    recompute: Option<RecomputeJob>,
    /// Debounce fired while a recompute was in flight
    rerun: bool,

    asset: Option<EncodedAsset>,
    last_decode_error: Option<DecodeError>,
    last_transcode_error: Option<TranscodeError>,
    waiters: Vec<(String, oneshot::Sender<Result<EncodedAsset>>)>,
}

impl PipelineActor {
    async fn run(mut self) {
        debug!("Trim pipeline started");

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = debounce::expired(self.debouncer.deadline()) => self.on_debounce_expired(),
                result = settled(&mut self.decoding) => self.on_decoded(result),
                result = settled(&mut self.recompute) => self.on_recomputed(result),
            }

            self.resolve_waiters();
        }

        debug!("Trim pipeline stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load {
                bytes,
                mime,
                file_name,
                reply,
            } => self.start_load(bytes, &mime, file_name, reply),
            Command::UpdateRegion {
                generation,
                region,
                reply,
            } => {
                let _ = reply.send(self.update_region(generation, region));
            }
            Command::Submit { title, reply } => self.waiters.push((title, reply)),
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn start_load(
        &mut self,
        bytes: Vec<u8>,
        mime: &str,
        file_name: String,
        reply: oneshot::Sender<Result<SourceInfo>>,
    ) {
        self.generation += 1;
        let generation = self.generation;

        // Everything belonging to the previous source is now stale
        self.source = None;
        self.asset = None;
        self.last_decode_error = None;
        self.last_transcode_error = None;
        self.debouncer.cancel();
        self.rerun = false;

        if let Some(previous) = self.decoding.take() {
            debug!(
                superseded = previous.meta.generation,
                generation, "Load superseded an unfinished decode"
            );
            let _ = previous.meta.reply.send(Err(Error::Superseded { generation }));
        }

        if !is_decodable(mime, &file_name) {
            let error = DecodeError::UnsupportedFormat(format!("{} ({})", file_name, mime));
            self.fail_source(generation, &file_name, error.clone());
            let _ = reply.send(Err(error.into()));
            return;
        }

        info!(generation, file_name = %file_name, mime, bytes = bytes.len(), "Decoding source");

        let hint = FormatHint::new(mime, &file_name);
        let decoder = Arc::clone(&self.decoder);
        let handle = tokio::task::spawn_blocking(move || decoder.decode(&bytes, &hint));

        self.decoding = Some(Job {
            meta: DecodeMeta {
                generation,
                file_name,
                reply,
            },
            handle,
        });
    }

    fn on_decoded(&mut self, result: std::result::Result<std::result::Result<SampleBuffer, DecodeError>, JoinError>) {
        let Some(job) = self.decoding.take() else {
            return;
        };
        let DecodeMeta {
            generation,
            file_name,
            reply,
        } = job.meta;

        let decoded = match result {
            Ok(Ok(buffer)) if buffer.frame_count() == 0 => {
                Err(DecodeError::CorruptData("Decoded audio is empty".into()))
            }
            Ok(Ok(buffer)) if wav::data_len(buffer.frame_count(), buffer.channel_count()).is_none() => {
                Err(DecodeError::UnsupportedFormat(format!(
                    "{} frames of {}-channel audio exceed the WAV size limit",
                    buffer.frame_count(),
                    buffer.channel_count()
                )))
            }
            Ok(decoded) => decoded,
            Err(e) => Err(DecodeError::CapabilityUnavailable(format!("Decode task failed: {}", e))),
        };

        let buffer = match decoded {
            Ok(buffer) => buffer,
            Err(error) => {
                self.fail_source(generation, &file_name, error.clone());
                let _ = reply.send(Err(error.into()));
                return;
            }
        };

        let limits = RegionLimits::new(buffer.duration_secs(), self.settings.min_length_secs);
        let region = limits.full();
        let info = SourceInfo {
            generation,
            duration_secs: buffer.duration_secs(),
            sample_rate: buffer.sample_rate(),
            channel_count: buffer.channel_count(),
            frame_count: buffer.frame_count(),
            region,
            peaks: waveform::peaks(&buffer, self.settings.waveform_buckets),
        };

        info!(
            generation,
            duration_secs = info.duration_secs,
            sample_rate = info.sample_rate,
            channels = info.channel_count,
            "Source loaded"
        );

        let asset_name = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(suggested_file_name)
            .unwrap_or_else(|| suggested_file_name(""));

        self.source = Some(Source {
            generation,
            buffer: Arc::new(buffer),
            limits,
            region,
            asset_name,
        });

        // Produce an asset for the full selection without waiting for an edit
        self.debouncer.touch(Instant::now());

        self.events.emit_lossy(TrimEvent::SourceLoaded {
            session_id: self.session_id,
            generation,
            duration_secs: info.duration_secs,
            sample_rate: info.sample_rate,
            channel_count: info.channel_count,
            timestamp: Utc::now(),
        });

        if reply.send(Ok(info)).is_err() {
            debug!(generation, "Load caller went away before decode finished");
        }
    }

    fn fail_source(&mut self, generation: u64, file_name: &str, error: DecodeError) {
        warn!(generation, file_name, error = %error, "Source rejected");
        self.last_decode_error = Some(error.clone());
        self.events.emit_lossy(TrimEvent::SourceFailed {
            session_id: self.session_id,
            generation,
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn update_region(&mut self, generation: u64, region: TrimRegion) -> Result<()> {
        let current = self.generation;
        let source = match self.source.as_mut() {
            Some(source) if source.generation == generation => source,
            _ => {
                debug!(requested = generation, current, "Dropping region update for stale source");
                return Err(Error::Superseded { generation: current });
            }
        };

        source.limits.validate(region)?;
        if source.region == region {
            return Ok(());
        }

        source.region = region;
        let sequence = self.debouncer.touch(Instant::now());
        debug!(
            generation,
            sequence,
            start = region.start(),
            end = region.end(),
            "Region changed"
        );
        Ok(())
    }

    fn on_debounce_expired(&mut self) {
        if self.debouncer.fire().is_none() {
            return;
        }
        if self.recompute.is_some() {
            debug!("Recompute still in flight; re-running once it settles");
            self.rerun = true;
            return;
        }
        self.start_recompute();
    }

    fn start_recompute(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };

        let meta = RecomputeMeta {
            generation: source.generation,
            sequence: self.debouncer.sequence(),
            region: source.region,
        };

        info!(
            generation = meta.generation,
            sequence = meta.sequence,
            start = meta.region.start(),
            end = meta.region.end(),
            "Recomputing trimmed asset"
        );
        self.events.emit_lossy(TrimEvent::RecomputeStarted {
            session_id: self.session_id,
            generation: meta.generation,
            sequence: meta.sequence,
            region: meta.region,
            timestamp: Utc::now(),
        });

        let buffer = Arc::clone(&source.buffer);
        let transcoder = Arc::clone(&self.transcoder);
        let region = meta.region;
        let name = source.asset_name.clone();

        let handle = tokio::spawn(async move {
            let wav_bytes = render_wav(buffer, region).await?;
            transcoder.transcode(&wav_bytes, &name).await
        });

        self.recompute = Some(Job { meta, handle });
    }

    fn on_recomputed(
        &mut self,
        result: std::result::Result<std::result::Result<EncodedAsset, TranscodeError>, JoinError>,
    ) {
        let Some(job) = self.recompute.take() else {
            return;
        };
        let RecomputeMeta {
            generation,
            sequence,
            region,
        } = job.meta;

        let current = self
            .source
            .as_ref()
            .is_some_and(|s| s.generation == generation)
            && sequence == self.debouncer.sequence();

        if !current {
            debug!(generation, sequence, "Discarding stale recompute result");
            self.events.emit_lossy(TrimEvent::RecomputeDiscarded {
                session_id: self.session_id,
                generation,
                sequence,
                timestamp: Utc::now(),
            });
        } else {
            let outcome = result.unwrap_or_else(|e| {
                Err(TranscodeError::EncodeFailed(format!("Recompute task failed: {}", e)))
            });

            match outcome {
                Ok(mut asset) => {
                    asset.region = Some(region);
                    info!(
                        generation,
                        sequence,
                        bytes = asset.bytes.len(),
                        name = %asset.suggested_name,
                        "Trimmed asset ready"
                    );
                    self.events.emit_lossy(TrimEvent::AssetReady {
                        session_id: self.session_id,
                        generation,
                        sequence,
                        region,
                        byte_len: asset.bytes.len(),
                        suggested_name: asset.suggested_name.clone(),
                        timestamp: Utc::now(),
                    });
                    self.asset = Some(asset);
                    self.last_transcode_error = None;
                }
                Err(error) => {
                    warn!(
                        generation,
                        sequence,
                        error = %error,
                        kept_previous = self.asset.is_some(),
                        "Transcode failed"
                    );
                    self.events.emit_lossy(TrimEvent::TranscodeFailed {
                        session_id: self.session_id,
                        generation,
                        sequence,
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                    self.last_transcode_error = Some(error);
                }
            }
        }

        if std::mem::take(&mut self.rerun) && !self.debouncer.is_armed() {
            self.start_recompute();
        }
    }

    fn is_settled(&self) -> bool {
        self.decoding.is_none() && self.recompute.is_none() && !self.debouncer.is_armed()
    }

    /// Answer pending submissions once nothing is scheduled or running
    fn resolve_waiters(&mut self) {
        if self.waiters.is_empty() || !self.is_settled() {
            return;
        }

        for (title, reply) in std::mem::take(&mut self.waiters) {
            let _ = reply.send(self.submission(&title));
        }
    }

    fn submission(&self, title: &str) -> Result<EncodedAsset> {
        if let Some(asset) = &self.asset {
            let name = suggested_file_name(title);
            info!(name = %name, bytes = asset.bytes.len(), "Submitting trimmed asset");
            return Ok(asset.clone().renamed(name));
        }
        if let Some(error) = &self.last_transcode_error {
            return Err(error.clone().into());
        }
        if let Some(error) = &self.last_decode_error {
            return Err(error.clone().into());
        }
        Err(Error::NothingToSubmit("No audio has been loaded".into()))
    }

    fn status(&self) -> PipelineStatus {
        PipelineStatus {
            session_id: self.session_id,
            generation: self.generation,
            region: self.source.as_ref().map(|s| s.region),
            decoding: self.decoding.is_some(),
            recompute_pending: self.debouncer.is_armed() || self.rerun,
            recompute_in_flight: self.recompute.is_some(),
            asset_ready: self.asset.is_some(),
            last_error: self
                .last_transcode_error
                .as_ref()
                .map(|e| e.to_string())
                .or_else(|| self.last_decode_error.as_ref().map(|e| e.to_string())),
        }
    }
}
