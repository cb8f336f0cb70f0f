use crate::core::session::{MediaConstraints, MediaStream};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when talking to the capture device
#[derive(Debug, Error, PartialEq)]
pub enum MediaError {
    #[error("Permission denied for {0:?}")]
    PermissionDenied(MediaConstraints),

    #[error("No capture device available")]
    Unavailable,

    #[error("Stream {0} is not live")]
    UnknownStream(Uuid),
}

/// Camera/microphone capture on the device
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// Ask for a stream. Suspends until the user answers the permission prompt.
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError>;

    /// Stop every track of the stream.
    fn release(&self, stream: MediaStream) -> Result<(), MediaError>;
}

/// Capture device stand-in for the bridge.
///
/// Grants or denies according to its permission switch and keeps track of
/// live streams so leaks are observable.
pub struct SimulatedMediaDevice {
    granted: bool,
    live: Mutex<HashSet<Uuid>>,
}

impl SimulatedMediaDevice {
    pub fn new(granted: bool) -> Self {
        Self {
            granted,
            live: Mutex::new(HashSet::new()),
        }
    }

    pub fn granting() -> Self {
        Self::new(true)
    }

    pub fn denying() -> Self {
        Self::new(false)
    }

    /// Number of streams acquired and not yet released
    pub fn live_streams(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MediaDevice for SimulatedMediaDevice {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError> {
        if !self.granted {
            tracing::info!("Capture permission denied for {:?}", constraints);
            return Err(MediaError::PermissionDenied(constraints));
        }

        let stream = MediaStream::new(constraints);
        self.live
            .lock()
            .map_err(|_| MediaError::Unavailable)?
            .insert(stream.id);
        tracing::debug!("Acquired stream {}", stream.id);
        Ok(stream)
    }

    fn release(&self, stream: MediaStream) -> Result<(), MediaError> {
        let removed = self
            .live
            .lock()
            .map_err(|_| MediaError::Unavailable)?
            .remove(&stream.id);

        if !removed {
            return Err(MediaError::UnknownStream(stream.id));
        }
        tracing::debug!("Released stream {}", stream.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let device = SimulatedMediaDevice::granting();

        let stream = device.acquire(MediaConstraints::CAMERA_AND_MIC).await.unwrap();
        assert_eq!(device.live_streams(), 1);

        device.release(stream).unwrap();
        assert_eq!(device.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_denied() {
        let device = SimulatedMediaDevice::denying();

        let result = device.acquire(MediaConstraints::MIC_ONLY).await;
        assert_eq!(result, Err(MediaError::PermissionDenied(MediaConstraints::MIC_ONLY)));
        assert_eq!(device.live_streams(), 0);
    }

    #[test]
    fn test_release_unknown_stream() {
        let device = SimulatedMediaDevice::granting();
        let stranger = MediaStream::new(MediaConstraints::MIC_ONLY);
        let id = stranger.id;

        assert_eq!(device.release(stranger), Err(MediaError::UnknownStream(id)));
    }
}
