use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::effects::{Effect, HapticPulse};

pub const HOST_STEPS: u8 = 3;

pub const HOST_SUBMITTED_NOTICE: &str =
    "Application successfully transmitted to ScissHER HQ. We'll verify your Scene presence shortly.";

#[derive(Debug, Error, PartialEq)]
pub enum HostError {
    #[error("Finish every step before submitting")]
    NotFinalStep,

    #[error("Describe your vision before submitting")]
    MissingVision,
}

/// Host application wizard: intro, vision, verify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostApplication {
    step: u8,
    vision: String,
    submitted: bool,
}

impl Default for HostApplication {
    fn default() -> Self {
        Self {
            step: 1,
            vision: String::new(),
            submitted: false,
        }
    }
}

impl HostApplication {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn vision(&self) -> &str {
        &self.vision
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn next(&mut self) {
        self.step = (self.step + 1).min(HOST_STEPS);
    }

    pub fn back(&mut self) {
        self.step = self.step.saturating_sub(1).max(1);
    }

    pub fn set_vision(&mut self, vision: impl Into<String>) {
        self.vision = vision.into();
    }

    pub fn submit(&mut self) -> Result<Vec<Effect>, HostError> {
        if self.step != HOST_STEPS {
            return Err(HostError::NotFinalStep);
        }
        if self.vision.trim().is_empty() {
            return Err(HostError::MissingVision);
        }

        self.submitted = true;
        tracing::info!("Host application submitted");
        Ok(vec![
            Effect::Haptic(HapticPulse::HEAVY),
            Effect::notice(HOST_SUBMITTED_NOTICE),
        ])
    }
}
