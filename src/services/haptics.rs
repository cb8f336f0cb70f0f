use crate::core::effects::HapticPulse;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Errors reported by the device bridge plugins
#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("Plugin not available on this platform: {0}")]
    Unavailable(&'static str),

    #[error("Plugin call failed: {0}")]
    CallFailed(String),
}

/// Haptic feedback on the device. Calls must not block.
#[cfg_attr(test, mockall::automock)]
pub trait HapticSink: Send + Sync {
    fn pulse(&self, pulse: HapticPulse) -> Result<(), BridgeError>;
}

/// Fire a pulse and forget about it. Failures are logged and dropped.
pub fn fire(sink: &dyn HapticSink, pulse: HapticPulse) {
    if let Err(e) = sink.pulse(pulse) {
        tracing::debug!("Haptic pulse {:?} failed: {}", pulse, e);
    }
}

/// Haptic sink for hosts without a vibration motor; records pulses in the log.
#[derive(Debug, Default)]
pub struct LoggingHaptics {
    history: Mutex<Vec<HapticPulse>>,
}

impl LoggingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulses fired so far, oldest first
    pub fn history(&self) -> Vec<HapticPulse> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl HapticSink for LoggingHaptics {
    fn pulse(&self, pulse: HapticPulse) -> Result<(), BridgeError> {
        tracing::trace!("Haptic pulse: {:?}", pulse);
        self.history
            .lock()
            .map_err(|e| BridgeError::CallFailed(e.to_string()))?
            .push(pulse);
        Ok(())
    }
}

/// Haptic sink that always fails, as on a desktop browser
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl HapticSink for NoHaptics {
    fn pulse(&self, _pulse: HapticPulse) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable("haptics"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBarStyle {
    Dark,
    Light,
}

/// Status bar appearance on the device
#[cfg_attr(test, mockall::automock)]
pub trait StatusBar: Send + Sync {
    fn set_style(&self, style: StatusBarStyle) -> Result<(), BridgeError>;
    fn set_overlays_webview(&self, overlay: bool) -> Result<(), BridgeError>;
}

/// Launch-time status bar setup: dark style drawn over the webview.
/// Platforms without the plugin are ignored.
pub fn init_status_bar(bar: &dyn StatusBar) {
    let result = bar
        .set_style(StatusBarStyle::Dark)
        .and_then(|_| bar.set_overlays_webview(true));
    if let Err(e) = result {
        tracing::debug!("Status bar setup skipped: {}", e);
    }
}

/// Status bar stand-in that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingStatusBar;

impl StatusBar for LoggingStatusBar {
    fn set_style(&self, style: StatusBarStyle) -> Result<(), BridgeError> {
        tracing::debug!("Status bar style: {:?}", style);
        Ok(())
    }

    fn set_overlays_webview(&self, overlay: bool) -> Result<(), BridgeError> {
        tracing::debug!("Status bar overlays webview: {}", overlay);
        Ok(())
    }
}
