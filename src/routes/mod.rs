// Route exports
pub mod ai;
pub mod app;
pub mod calendar;
pub mod chat;
pub mod discovery;
pub mod events;
pub mod onboarding;
pub mod session;
pub mod vault;

use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use crate::config::Settings;
use crate::core::availability::Calendar;
use crate::core::chat::Inbox;
use crate::core::discovery::DiscoveryDeck;
use crate::core::effects::Effect;
use crate::core::events::EventBoard;
use crate::core::host::HostApplication;
use crate::core::onboarding::{IdentityScan, PhotoCurator};
use crate::core::router;
use crate::core::vault::Vault;
use crate::models::{ErrorResponse, Profile};
use crate::services::haptics::fire;
use crate::services::{
    AiFeatures, Catalog, FlagStore, GenerativeService, HapticSink, MediaDevice, ProfileStore,
    ResponseCache, SessionController, SessionTiming, VoiceSession, VoiceTransport,
};

/// Device and network collaborators the bridge runs against
pub struct Ports {
    pub media: Arc<dyn MediaDevice>,
    pub haptics: Arc<dyn HapticSink>,
    pub flags: Arc<dyn FlagStore>,
    pub genai: Arc<dyn GenerativeService>,
    pub voice: Arc<dyn VoiceTransport>,
}

/// Per-screen state of the signed-in app
pub struct Screens {
    pub router: router::AppState,
    pub deck: DiscoveryDeck,
    pub calendar: Calendar,
    pub vault: Vault,
    pub inbox: Inbox,
    pub identity: IdentityScan,
    pub curator: PhotoCurator,
    pub host: HostApplication,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub profiles: Arc<ProfileStore>,
    pub board: Arc<EventBoard>,
    pub screens: Arc<Mutex<Screens>>,
    pub session: Arc<SessionController>,
    pub voice: Arc<VoiceSession>,
    pub ai: Arc<AiFeatures>,
    pub cache: Arc<ResponseCache>,
    pub haptics: Arc<dyn HapticSink>,
    pub flags: Arc<dyn FlagStore>,
}

impl AppState {
    pub fn new(settings: Settings, catalog: Catalog, ports: Ports) -> Self {
        let user_id = settings.discovery.default_user.clone();
        let verified = ports.flags.is_verified();
        tracing::info!("Restoring app for {} (verified: {})", user_id, verified);

        let screens = Screens {
            router: router::AppState::restore(verified, user_id.clone()),
            deck: DiscoveryDeck::new(
                user_id.clone(),
                catalog.profiles.clone(),
                settings.discovery.match_threshold,
            ),
            calendar: Calendar::seeded(),
            vault: Vault::seeded(user_id),
            inbox: Inbox::new(catalog.conversations),
            identity: IdentityScan::default(),
            curator: PhotoCurator::new(),
            host: HostApplication::new(),
        };

        let profiles = Arc::new(ProfileStore::new(catalog.profiles));
        let cache = Arc::new(ResponseCache::new(
            settings.cache.max_entries,
            settings.cache.ttl_secs,
        ));

        let session = SessionController::new(
            settings.session.reveal(),
            SessionTiming {
                match_delay: settings.session.match_delay(),
                tick: settings.session.tick(),
            },
            ports.media.clone(),
            ports.haptics.clone(),
            profiles.clone(),
        );

        Self {
            board: Arc::new(EventBoard::new(catalog.events, catalog.perks, catalog.hype_quote)),
            screens: Arc::new(Mutex::new(screens)),
            session: Arc::new(session),
            voice: Arc::new(VoiceSession::new(ports.media, ports.voice)),
            ai: Arc::new(AiFeatures::new(ports.genai, cache.clone())),
            cache,
            profiles,
            haptics: ports.haptics,
            flags: ports.flags,
            settings: Arc::new(settings),
        }
    }

    /// Run the effects the bridge owns (haptics, the verified flag) and hand
    /// back the rest for the shell
    pub fn run_effects(&self, effects: Vec<Effect>) -> Vec<Effect> {
        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Haptic(pulse) => {
                    fire(self.haptics.as_ref(), pulse);
                    None
                }
                Effect::PersistVerified(verified) => {
                    if let Err(e) = self.flags.set_verified(verified) {
                        tracing::warn!("Failed to persist verified flag: {}", e);
                    }
                    None
                }
                other => Some(other),
            })
            .collect()
    }

    /// 409 unless the router is in the authorized state
    pub async fn require_authorized(&self, action: &'static str) -> Result<(), HttpResponse> {
        self.screens
            .lock()
            .await
            .router
            .require_authorized(action)
            .map_err(|e| {
                tracing::info!("Refused before sign-in: {}", e);
                error_response(StatusCode::CONFLICT, "Invalid transition", e)
            })
    }

    /// Profile of the signed-in user
    pub async fn current_user(&self) -> Result<Profile, HttpResponse> {
        let user_id = self.screens.lock().await.router.current_user.clone();
        self.profiles.get(&user_id).await.map_err(|e| {
            tracing::error!("Signed-in profile missing: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Profile unavailable", e)
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(app::configure)
            .configure(onboarding::configure)
            .configure(discovery::configure)
            .configure(session::configure)
            .configure(vault::configure)
            .configure(calendar::configure)
            .configure(chat::configure)
            .configure(events::configure)
            .configure(ai::configure),
    );
}

pub fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

/// 400 with the validation errors, if any
pub fn validation_failed<T: Validate>(req: &T) -> Option<HttpResponse> {
    req.validate().err().map(|errors| {
        tracing::info!("Validation failed: field_errors={:?}", errors);
        error_response(StatusCode::BAD_REQUEST, "Validation failed", errors)
    })
}

/// JSON extractor config sized for data-URL photo uploads
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(handle_json_payload_error)
}

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path segment errors (e.g. a malformed photo id)
pub fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_error_response_shape() {
        let response = error_response(StatusCode::CONFLICT, "Session busy", "try later");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Session busy");
        assert_eq!(parsed.status_code, 409);
    }
}
