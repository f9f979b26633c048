//! Transcoding trimmed WAV into the distributable format
//!
//! [`Transcoder`] is the narrow capability the pipeline depends on.
//! [`FfmpegTranscoder`] is the stock implementation: it runs an external
//! encoder with the WAV on stdin and reads MP3 from stdout, so nothing touches
//! the filesystem.

use crate::audio::EncodedAsset;
use crate::config::EncoderSettings;
use crate::error::TranscodeError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Compressed-audio encoder capability
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode a complete WAV container; `output_name` becomes the asset's suggested name
    async fn transcode(&self, wav: &[u8], output_name: &str) -> Result<EncodedAsset, TranscodeError>;
}

/// MP3 encoder backed by an `ffmpeg`-compatible executable
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    bitrate_kbps: u32,
    channels: u8,
}

impl FfmpegTranscoder {
    pub fn new(settings: &EncoderSettings) -> Self {
        Self {
            program: settings.program.clone(),
            bitrate_kbps: settings.bitrate_kbps,
            channels: settings.channels,
        }
    }

    /// Encoder arguments: WAV on stdin, MP3 on stdout
    fn args(&self) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "wav".into(),
            "-i".into(),
            "pipe:0".into(),
            "-vn".into(),
            "-ac".into(),
            self.channels.to_string(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            format!("{}k", self.bitrate_kbps),
            "-f".into(),
            "mp3".into(),
            "pipe:1".into(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, wav: &[u8], output_name: &str) -> Result<EncodedAsset, TranscodeError> {
        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    TranscodeError::EncoderUnavailable(format!(
                        "{}: {}",
                        self.program.display(),
                        e
                    ))
                }
                _ => TranscodeError::EncodeFailed(format!("Failed to start encoder: {}", e)),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TranscodeError::EncodeFailed("Encoder stdin not captured".into()))?;

        // Feed stdin concurrently; the encoder may fill stdout before reading all input
        let input = wav.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TranscodeError::EncodeFailed(format!("Encoder did not finish: {}", e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Encoder closed stdin early"),
            Err(e) => debug!(error = %e, "Encoder stdin task failed"),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Encoder failed");
            return Err(TranscodeError::EncodeFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(TranscodeError::EncodeFailed("Encoder produced no output".into()));
        }

        debug!(
            input_bytes = wav.len(),
            output_bytes = output.stdout.len(),
            bitrate_kbps = self.bitrate_kbps,
            "Transcode complete"
        );

        Ok(EncodedAsset::mpeg(output.stdout, output_name))
    }
}
