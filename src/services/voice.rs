use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::core::audio::{decode_pcm, encode_pcm, PcmBlob, PlaybackScheduler, OUTPUT_SAMPLE_RATE};
use crate::core::prompts::{LIVE_AUDIO_MODEL, VOICE_INSTRUCTION};
use crate::core::session::{MediaConstraints, MediaStream};
use crate::services::media::{MediaDevice, MediaError};

pub const MIC_NOTICE: &str = "Microphone access is required for Voice Sesh.";
pub const VOICE_NAME: &str = "Kore";

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Microphone access is required for Voice Sesh.")]
    MicrophoneDenied(#[source] MediaError),

    #[error("Voice session is not active")]
    NotActive,

    #[error("Voice transport error: {0}")]
    Transport(String),

    #[error("Malformed server message: {0}")]
    Message(#[from] serde_json::Error),

    #[error("Malformed audio payload: {0}")]
    Audio(#[from] base64::DecodeError),
}

/// First message on a live connection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSetup {
    pub model: String,
    pub generation_config: serde_json::Value,
    pub system_instruction: serde_json::Value,
}

impl LiveSetup {
    pub fn assistant() -> Self {
        Self {
            model: format!("models/{}", LIVE_AUDIO_MODEL),
            generation_config: serde_json::json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": VOICE_NAME } }
                }
            }),
            system_instruction: serde_json::json!({ "parts": [{ "text": VOICE_INSTRUCTION }] }),
        }
    }
}

/// Bidirectional connection to the live voice model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn open(&self, setup: &LiveSetup) -> Result<(), VoiceError>;
    async fn send_audio(&self, chunk: &PcmBlob) -> Result<(), VoiceError>;
    /// Server messages received since the last call, oldest first
    async fn drain(&self) -> Vec<String>;
    async fn close(&self);
}

/// Transport that drops outgoing audio on the floor; used when no API key is
/// configured, or when the shell holds the live socket and relays messages
#[derive(Debug, Default)]
pub struct LoggingVoiceTransport {
    open: AtomicBool,
    chunks: AtomicU64,
}

impl LoggingVoiceTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks_sent(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VoiceTransport for LoggingVoiceTransport {
    async fn open(&self, setup: &LiveSetup) -> Result<(), VoiceError> {
        tracing::info!("Live voice session opened with {}", setup.model);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_audio(&self, chunk: &PcmBlob) -> Result<(), VoiceError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(VoiceError::Transport("connection closed".to_string()));
        }
        tracing::trace!("Audio chunk: {} bytes of {}", chunk.data.len(), chunk.mime_type);
        self.chunks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn drain(&self) -> Vec<String> {
        Vec::new()
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        tracing::info!("Live voice session closed");
    }
}

/// Model audio queued for playback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAudio {
    pub source_id: u64,
    pub start: f64,
    pub duration: f64,
    pub data: String,
}

/// What the shell should do after a server message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackUpdate {
    pub stopped: Vec<u64>,
    pub scheduled: Option<ScheduledAudio>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    server_content: Option<ServerContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    #[serde(default)]
    interrupted: bool,
}

#[derive(Debug, Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<TurnPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnPart {
    inline_data: Option<PcmBlob>,
}

#[derive(Default)]
struct VoiceState {
    stream: Option<MediaStream>,
    scheduler: PlaybackScheduler,
}

/// Live voice conversation with the assistant
pub struct VoiceSession {
    media: Arc<dyn MediaDevice>,
    transport: Arc<dyn VoiceTransport>,
    state: Mutex<VoiceState>,
}

impl VoiceSession {
    pub fn new(media: Arc<dyn MediaDevice>, transport: Arc<dyn VoiceTransport>) -> Self {
        Self {
            media,
            transport,
            state: Mutex::new(VoiceState::default()),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.stream.is_some()
    }

    /// Acquire the microphone and open the live connection. Idempotent.
    pub async fn start(&self) -> Result<(), VoiceError> {
        let mut state = self.state.lock().await;
        if state.stream.is_some() {
            return Ok(());
        }

        let stream = self
            .media
            .acquire(MediaConstraints::MIC_ONLY)
            .await
            .map_err(VoiceError::MicrophoneDenied)?;

        if let Err(e) = self.transport.open(&LiveSetup::assistant()).await {
            if let Err(release) = self.media.release(stream) {
                tracing::warn!("Failed to release microphone: {}", release);
            }
            return Err(e);
        }

        state.stream = Some(stream);
        state.scheduler = PlaybackScheduler::new();
        Ok(())
    }

    /// Forward one captured block of microphone samples
    pub async fn send_samples(&self, samples: &[f32]) -> Result<(), VoiceError> {
        if !self.is_active().await {
            return Err(VoiceError::NotActive);
        }
        self.transport.send_audio(&encode_pcm(samples)).await
    }

    /// Handle a server message at output clock time `now`
    pub async fn receive(&self, message: &str, now: f64) -> Result<PlaybackUpdate, VoiceError> {
        let message: ServerMessage = serde_json::from_str(message)?;
        let mut state = self.state.lock().await;
        if state.stream.is_none() {
            return Err(VoiceError::NotActive);
        }

        let mut update = PlaybackUpdate::default();
        let Some(content) = message.server_content else {
            return Ok(update);
        };

        if content.interrupted {
            update.stopped = state.scheduler.stop();
        }

        let audio = content
            .model_turn
            .and_then(|turn| turn.parts.into_iter().next())
            .and_then(|part| part.inline_data);

        if let Some(blob) = audio {
            let buffer = decode_pcm(&blob.data, OUTPUT_SAMPLE_RATE, 1)?;
            state.scheduler.reap(now);
            let (source_id, start) = state.scheduler.schedule(now, buffer.duration());
            update.scheduled = Some(ScheduledAudio {
                source_id,
                start,
                duration: buffer.duration(),
                data: blob.data,
            });
        }
        Ok(update)
    }

    /// Apply every message the live connection delivered since the last poll.
    /// Malformed messages are skipped.
    pub async fn poll(&self, now: f64) -> Result<Vec<PlaybackUpdate>, VoiceError> {
        if !self.is_active().await {
            return Err(VoiceError::NotActive);
        }

        let mut updates = Vec::new();
        for message in self.transport.drain().await {
            match self.receive(&message, now).await {
                Ok(update) => updates.push(update),
                Err(e @ (VoiceError::Message(_) | VoiceError::Audio(_))) => {
                    tracing::warn!("Skipping live message: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(updates)
    }

    /// Hang up: close the connection, release the microphone, stop playback
    pub async fn end(&self) -> Vec<u64> {
        let mut state = self.state.lock().await;
        if let Some(stream) = state.stream.take() {
            self.transport.close().await;
            if let Err(e) = self.media.release(stream) {
                tracing::warn!("Failed to release microphone: {}", e);
            }
        }
        state.scheduler.stop()
    }
}
