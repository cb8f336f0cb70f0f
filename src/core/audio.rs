//! Raw PCM framing for the live voice channel.
//!
//! Microphone audio goes up as 16 kHz mono s16le in base64; model audio comes
//! back as 24 kHz s16le and is scheduled back to back for gapless playback.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

pub const INPUT_SAMPLE_RATE: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;
pub const INPUT_MIME: &str = "audio/pcm;rate=16000";

const PCM_SCALE: f32 = 32768.0;

/// Base64 audio chunk as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcmBlob {
    pub data: String,
    pub mime_type: String,
}

/// Convert float samples to a base64 s16le blob. Out-of-range samples saturate.
pub fn encode_pcm(samples: &[f32]) -> PcmBlob {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let value = (sample * PCM_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    PcmBlob {
        data: STANDARD.encode(&bytes),
        mime_type: INPUT_MIME.to_string(),
    }
}

/// Decoded audio, one sample vector per channel
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Playback length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode base64 interleaved s16le into per-channel float samples.
/// A trailing odd byte or partial frame is dropped.
pub fn decode_pcm(
    data: &str,
    sample_rate: u32,
    num_channels: usize,
) -> Result<AudioBuffer, base64::DecodeError> {
    let bytes = STANDARD.decode(data)?;
    let num_channels = num_channels.max(1);

    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let frame_count = samples.len() / num_channels;

    let channels = (0..num_channels)
        .map(|channel| {
            (0..frame_count)
                .map(|i| f32::from(samples[i * num_channels + channel]) / PCM_SCALE)
                .collect()
        })
        .collect();

    Ok(AudioBuffer {
        sample_rate,
        channels,
    })
}

/// Playback cursor for queued model audio
#[derive(Debug, Default, Clone)]
pub struct PlaybackScheduler {
    next_start: f64,
    active: Vec<(u64, f64)>,
    next_id: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// Sources queued and not yet finished or stopped
    pub fn active_sources(&self) -> usize {
        self.active.len()
    }

    /// Queue a buffer of `duration` seconds at clock time `now`.
    /// Returns the source id and its start time.
    pub fn schedule(&mut self, now: f64, duration: f64) -> (u64, f64) {
        let start = self.next_start.max(now);
        self.next_start = start + duration;

        let id = self.next_id;
        self.next_id += 1;
        self.active.push((id, start + duration));
        (id, start)
    }

    /// Forget sources whose playback ended by `now`
    pub fn reap(&mut self, now: f64) {
        self.active.retain(|(_, end)| *end > now);
    }

    /// Interrupt playback: drop every source and rewind the cursor
    pub fn stop(&mut self) -> Vec<u64> {
        self.next_start = 0.0;
        self.active.drain(..).map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scales_and_saturates() {
        let blob = encode_pcm(&[0.0, 0.5, -1.0, 1.0]);
        assert_eq!(blob.mime_type, "audio/pcm;rate=16000");

        let bytes = STANDARD.decode(&blob.data).unwrap();
        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(values, vec![0, 16384, -32768, 32767]);
    }

    #[test]
    fn test_decode_deinterleaves() {
        let raw: Vec<u8> = [16384i16, -16384, 8192, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let buffer = decode_pcm(&STANDARD.encode(raw), OUTPUT_SAMPLE_RATE, 2).unwrap();

        assert_eq!(buffer.channels, vec![vec![0.5, 0.25], vec![-0.5, 0.0]]);
        assert_eq!(buffer.frames(), 2);
    }

    #[test]
    fn test_decode_duration_at_24k() {
        let raw = vec![0u8; 24_000 * 2];
        let buffer = decode_pcm(&STANDARD.encode(raw), OUTPUT_SAMPLE_RATE, 1).unwrap();
        assert_eq!(buffer.duration(), 1.0);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(decode_pcm("not base64!", OUTPUT_SAMPLE_RATE, 1).is_err());
    }

    #[test]
    fn test_scheduler_is_gapless() {
        let mut scheduler = PlaybackScheduler::new();

        let (_, first) = scheduler.schedule(1.0, 0.5);
        let (_, second) = scheduler.schedule(1.2, 0.5);
        assert_eq!(first, 1.0);
        assert_eq!(second, 1.5);

        // Queue drained before the next chunk arrives: start now
        let (_, third) = scheduler.schedule(5.0, 0.25);
        assert_eq!(third, 5.0);
        assert_eq!(scheduler.next_start(), 5.25);
    }

    #[test]
    fn test_scheduler_stop_and_reap() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.schedule(0.0, 1.0);
        scheduler.schedule(0.0, 1.0);
        scheduler.reap(1.5);
        assert_eq!(scheduler.active_sources(), 1);

        assert_eq!(scheduler.stop().len(), 1);
        assert_eq!(scheduler.active_sources(), 0);
        assert_eq!(scheduler.next_start(), 0.0);
    }
}
