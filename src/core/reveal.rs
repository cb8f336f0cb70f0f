use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Talking prompt while the counterpart is still fully obscured
pub const VISION_PROMPT: &str = "Discuss your long-term vision for community.";

/// Talking prompt once the reveal window has opened
pub const REVEAL_PROMPT: &str = "The reveal has begun. Stay present.";

#[derive(Debug, Error, PartialEq)]
pub enum RevealConfigError {
    #[error("Session duration must be greater than zero")]
    ZeroDuration,

    #[error("Reveal threshold ({reveal_start}s) exceeds session duration ({duration}s)")]
    ThresholdExceedsDuration { reveal_start: u32, duration: u32 },

    #[error("Initial obscurity must be a finite, non-negative number: {0}")]
    InvalidObscurity(f64),
}

/// Timing of a blind session: how long it lasts, when the reveal starts and how
/// obscured the counterpart is before that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealConfig {
    /// Total session length in seconds (D)
    pub duration_secs: u32,
    /// Remaining seconds at which the reveal starts (R)
    pub reveal_start_secs: u32,
    /// Blur magnitude applied until the reveal starts (M)
    pub initial_obscurity: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            duration_secs: 180,
            reveal_start_secs: 30,
            initial_obscurity: 45.0,
        }
    }
}

impl RevealConfig {
    pub fn validate(&self) -> Result<(), RevealConfigError> {
        if self.duration_secs == 0 {
            return Err(RevealConfigError::ZeroDuration);
        }
        if self.reveal_start_secs > self.duration_secs {
            return Err(RevealConfigError::ThresholdExceedsDuration {
                reveal_start: self.reveal_start_secs,
                duration: self.duration_secs,
            });
        }
        if !self.initial_obscurity.is_finite() || self.initial_obscurity < 0.0 {
            return Err(RevealConfigError::InvalidObscurity(self.initial_obscurity));
        }
        Ok(())
    }
}

/// Blur magnitude for a given number of remaining seconds.
///
/// Constant at M while `remaining > R`, then linear from M at `remaining == R`
/// down to exactly 0 at `remaining == 0`.
#[inline]
pub fn obscurity_at(config: &RevealConfig, remaining: u32) -> f64 {
    if remaining == 0 {
        return 0.0;
    }
    if remaining > config.reveal_start_secs || config.reveal_start_secs == 0 {
        return config.initial_obscurity;
    }
    config.initial_obscurity * (remaining as f64 / config.reveal_start_secs as f64)
}

/// One tick of the countdown. Saturates at zero.
#[inline]
pub fn next_remaining(remaining: u32) -> u32 {
    remaining.saturating_sub(1)
}

#[inline]
pub fn is_revealing(config: &RevealConfig, remaining: u32) -> bool {
    remaining <= config.reveal_start_secs
}

/// `m:ss` clock text
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn session_prompt(config: &RevealConfig, remaining: u32) -> &'static str {
    if is_revealing(config, remaining) {
        REVEAL_PROMPT
    } else {
        VISION_PROMPT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obscurity_reference_points() {
        let config = RevealConfig::default();

        assert_eq!(obscurity_at(&config, 180), 45.0);
        assert_eq!(obscurity_at(&config, 31), 45.0);
        assert_eq!(obscurity_at(&config, 30), 45.0);
        assert_eq!(obscurity_at(&config, 15), 22.5);
        assert_eq!(obscurity_at(&config, 0), 0.0);
    }

    #[test]
    fn test_obscurity_linear_inside_window() {
        let config = RevealConfig::default();

        for remaining in 0..=30u32 {
            let expected = 45.0 * remaining as f64 / 30.0;
            assert!((obscurity_at(&config, remaining) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_obscurity_never_increases_as_time_runs_out() {
        let config = RevealConfig::default();
        let mut previous = f64::MAX;

        for remaining in (0..=180u32).rev() {
            let current = obscurity_at(&config, remaining);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn test_zero_threshold_reveals_only_at_end() {
        let config = RevealConfig {
            reveal_start_secs: 0,
            ..RevealConfig::default()
        };

        assert_eq!(obscurity_at(&config, 1), 45.0);
        assert_eq!(obscurity_at(&config, 0), 0.0);
    }

    #[test]
    fn test_next_remaining_saturates() {
        assert_eq!(next_remaining(2), 1);
        assert_eq!(next_remaining(1), 0);
        assert_eq!(next_remaining(0), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(180), "3:00");
        assert_eq!(format_clock(69), "1:09");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn test_session_prompt_switches_at_threshold() {
        let config = RevealConfig::default();

        assert_eq!(session_prompt(&config, 31), VISION_PROMPT);
        assert_eq!(session_prompt(&config, 30), REVEAL_PROMPT);
    }

    #[test]
    fn test_validate() {
        assert!(RevealConfig::default().validate().is_ok());

        let zero = RevealConfig { duration_secs: 0, ..RevealConfig::default() };
        assert_eq!(zero.validate(), Err(RevealConfigError::ZeroDuration));

        let late = RevealConfig { reveal_start_secs: 200, ..RevealConfig::default() };
        assert!(matches!(
            late.validate(),
            Err(RevealConfigError::ThresholdExceedsDuration { .. })
        ));

        let nan = RevealConfig { initial_obscurity: f64::NAN, ..RevealConfig::default() };
        assert!(matches!(nan.validate(), Err(RevealConfigError::InvalidObscurity(_))));
    }
}
