use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::discovery::DiscoveryTab;
use crate::core::router::Action;
use crate::core::session::Decision;
use crate::core::vault::VaultTab;
use crate::models::domain::LatLng;

/// Router action sent by the shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub action: Action,
}

/// Typed birth year from the age gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthYearRequest {
    pub birth_year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddPhotosRequest {
    #[validate(length(min = 1, max = 12))]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EulaRequest {
    pub accepted: bool,
}

/// Crop-and-rotate controls; rotation in degrees, snapped to quarter turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoEditRequest {
    #[serde(default)]
    pub rotation: i32,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabRequest<T> {
    pub tab: T,
}

pub type DiscoveryTabRequest = TabRequest<DiscoveryTab>;
pub type VaultTabRequest = TabRequest<VaultTab>;

/// Proposal for a date in one of the target's windows
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeshRequestBody {
    #[validate(length(min = 1))]
    pub target_id: String,
    #[validate(length(min = 1))]
    pub day: String,
    #[validate(length(min = 1))]
    pub slot: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleSlotRequest {
    #[validate(length(min = 1))]
    pub day: String,
    #[validate(length(min = 1))]
    pub slot: String,
}

/// Join the blind sesh; defaults to the signed-in user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleKeyRequest {
    #[validate(length(min = 1))]
    pub profile_id: String,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 2000))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HostApplicationRequest {
    #[validate(length(max = 1000))]
    pub vision: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IcebreakerRequest {
    #[validate(length(min = 1))]
    pub target_id: String,
    #[serde(default)]
    pub lat_lng: Option<LatLng>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    pub lat_lng: Option<LatLng>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SuggestionRequest {
    #[validate(length(min = 1))]
    pub field: String,
}

/// Photo as a data URL, for the vault studio tools
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhotoRequest {
    #[validate(length(min = 1))]
    pub photo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MagicEditRequest {
    #[validate(length(min = 1))]
    pub photo: String,
    #[validate(length(min = 1, max = 500))]
    pub prompt: String,
}

/// One block of captured microphone samples
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VoiceAudioRequest {
    #[validate(length(min = 1, max = 16384))]
    pub samples: Vec<f32>,
}

/// Output clock of the shell when it collects live-model audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicePollRequest {
    pub now: f64,
}

/// Raw live-model message relayed by the shell with its output clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceMessageRequest {
    pub message: String,
    pub now: f64,
}
