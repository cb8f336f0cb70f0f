use serde::{Deserialize, Serialize};

/// Impact feedback strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Notification feedback kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Warning,
    Error,
}

/// A single haptic pulse requested from the device bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "style", rename_all = "lowercase")]
pub enum HapticPulse {
    Impact(ImpactStyle),
    Notification(NotificationType),
}

impl HapticPulse {
    pub const LIGHT: Self = Self::Impact(ImpactStyle::Light);
    pub const MEDIUM: Self = Self::Impact(ImpactStyle::Medium);
    pub const HEAVY: Self = Self::Impact(ImpactStyle::Heavy);
    pub const SUCCESS: Self = Self::Notification(NotificationType::Success);
    pub const WARNING: Self = Self::Notification(NotificationType::Warning);
}

/// Side effect requested by a screen transition.
///
/// Transitions only describe these; the bridge layer runs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Effect {
    Haptic(HapticPulse),
    /// Write the verified flag that lets a relaunch skip onboarding
    PersistVerified(bool),
    ScrollToTop,
    /// User-facing notice (toast or alert)
    Notice(String),
}

impl Effect {
    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice(text.into())
    }
}

/// Collect the notices out of a batch of effects, in order
pub fn notices(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Notice(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}
