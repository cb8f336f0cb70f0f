use serde::{Deserialize, Serialize};

use crate::core::discovery::{DiscoverySnapshot, LikeOutcome};
use crate::core::effects::Effect;
use crate::core::router::AppState;
use crate::core::session::SessionSnapshot;
use crate::models::domain::Profile;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Root controller state plus what the shell has to do next
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshotResponse {
    pub app: AppState,
    pub user: Option<Profile>,
    pub unread_count: usize,
    pub effects: Vec<Effect>,
}

/// Effects left for the shell after the bridge ran its own
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectsResponse {
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub outcome: Option<LikeOutcome>,
    pub discovery: DiscoverySnapshot,
    pub app: AppState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: SessionSnapshot,
    pub effects: Vec<Effect>,
}
