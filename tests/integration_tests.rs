// Integration tests for the ScissHER bridge

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use scissher::config::Settings;
use scissher::core::prompts::TextPrompt;
use scissher::routes::{configure_routes, json_config, AppState, Ports};
use scissher::services::genai::{GeneratedText, InlineImage};
use scissher::services::{
    Catalog, FlagStore, GenAiError, GenerativeService, LoggingHaptics, LoggingVoiceTransport,
    MemoryFlagStore, SimulatedMediaDevice,
};

/// Canned model: every text call answers `reply`, or fails when `reply` is None
struct StubModel {
    reply: Option<String>,
}

#[async_trait]
impl GenerativeService for StubModel {
    async fn generate_text(&self, _prompt: &TextPrompt) -> Result<GeneratedText, GenAiError> {
        match &self.reply {
            Some(text) => Ok(GeneratedText {
                text: text.clone(),
                grounding: Vec::new(),
            }),
            None => Err(GenAiError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            }),
        }
    }

    async fn edit_image(
        &self,
        _image: &InlineImage,
        _instruction: &str,
    ) -> Result<Option<InlineImage>, GenAiError> {
        Ok(Some(InlineImage::png("ZWRpdGVk")))
    }

    async fn animate(&self, _image: &InlineImage, _prompt: &str) -> Result<String, GenAiError> {
        Ok("https://video.example/clip".to_string())
    }

    async fn fetch_video(&self, _uri: &str) -> Result<Vec<u8>, GenAiError> {
        Ok(b"mp4-bytes".to_vec())
    }
}

struct Harness {
    state: AppState,
    flags: Arc<MemoryFlagStore>,
}

fn harness(verified: bool, reply: Option<&str>) -> Harness {
    let mut settings = Settings::default();
    settings.device.identity_scan_ms = 0;

    let flags = Arc::new(MemoryFlagStore::new());
    flags.set_verified(verified).unwrap();

    let ports = Ports {
        media: Arc::new(SimulatedMediaDevice::granting()),
        haptics: Arc::new(LoggingHaptics::new()),
        flags: flags.clone(),
        genai: Arc::new(StubModel {
            reply: reply.map(str::to_string),
        }),
        voice: Arc::new(LoggingVoiceTransport::new()),
    };

    Harness {
        state: AppState::new(settings, Catalog::seeded().unwrap(), ports),
        flags,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(json_config($state.settings.server.json_limit_bytes))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let h = harness(false, None);
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_sign_up_funnel_persists_verified_flag() {
    let h = harness(false, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/app/dispatch")
        .set_json(json!({ "action": { "type": "createAccount" } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["app"]["auth"], "verifying");

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/age")
        .set_json(json!({ "birthYear": "2015" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/age")
        .set_json(json!({ "birthYear": "1996" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["app"]["auth"], "identity");

    let req = test::TestRequest::post().uri("/api/v1/onboarding/identity/confirm").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post().uri("/api/v1/onboarding/identity/scan").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["step"], "complete");

    let req = test::TestRequest::post().uri("/api/v1/onboarding/identity/confirm").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["app"]["auth"], "onboarding");

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/photos")
        .set_json(json!({ "urls": ["a.jpg", "b.jpg", "c.jpg"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["photos"].as_array().unwrap().len(), 3);
    assert_eq!(body["photos"][0]["isLead"], true);
    assert_eq!(body["ready"], false);

    let req = test::TestRequest::post().uri("/api/v1/onboarding/submit").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/v1/onboarding/eula")
        .set_json(json!({ "accepted": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ready"], true);

    let req = test::TestRequest::post().uri("/api/v1/onboarding/submit").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["app"]["auth"], "authorized");
    assert_eq!(body["app"]["showHype"], true);
    assert_eq!(body["user"]["mainPhoto"], "a.jpg");
    assert!(h.flags.is_verified());
}

#[actix_web::test]
async fn test_invalid_transition_is_conflict() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/app/dispatch")
        .set_json(json!({ "action": { "type": "login" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_reset_clears_verified_flag() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/app/dispatch")
        .set_json(json!({ "action": { "type": "reset" } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["app"]["auth"], "landing");
    assert!(!h.flags.is_verified());
}

#[actix_web::test]
async fn test_navigation_returns_scroll_effect() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/app/dispatch")
        .set_json(json!({ "action": { "type": "navigate", "value": "vault" } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["app"]["view"], "vault");
    assert_eq!(body["effects"], json!([{ "type": "scrollToTop" }]));
}

#[actix_web::test]
async fn test_like_advances_deck() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/api/v1/discovery").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["current"]["id"], "u2");

    let req = test::TestRequest::post().uri("/api/v1/discovery/like").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["outcome"]["profileId"], "u2");
    assert_eq!(body["discovery"]["liked"], json!(["u2"]));
    assert_eq!(body["discovery"]["current"]["id"], "u3");
    assert_eq!(body["discovery"]["sparksBadge"], true);
}

#[actix_web::test]
async fn test_sesh_request_checks_offered_windows() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/discovery/sesh-request")
        .set_json(json!({ "targetId": "u2", "day": "Fri", "slot": "Evening" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/discovery/sesh-request")
        .set_json(json!({ "targetId": "u2", "day": "Tue", "slot": "Evening", "note": "Wine bar?" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["effects"][0]["type"], "notice");

    let req = test::TestRequest::get().uri("/api/v1/calendar").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sent"][0]["targetId"], "u2");
    assert_eq!(body["sent"][0]["note"], "Wine bar?");

    let req = test::TestRequest::get().uri("/api/v1/discovery").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["liked"], json!(["u2"]));
}

#[actix_web::test]
async fn test_session_lifecycle_over_http() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/start")
        .set_json(json!({ "userId": "u3" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/start")
        .set_json(json!({}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["session"]["phase"], "searching");

    let req = test::TestRequest::post()
        .uri("/api/v1/session/start")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/decide")
        .set_json(json!({ "decision": "accept" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post().uri("/api/v1/session/cancel").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["session"]["phase"], "idle");
}

#[actix_web::test]
async fn test_vault_revoke_needs_confirmation() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/api/v1/vault").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["activeKeys"], 1);
    assert_eq!(body["connections"][0]["profile"]["id"], "u2");

    let req = test::TestRequest::post()
        .uri("/api/v1/vault/keys/toggle")
        .set_json(json!({ "profileId": "u2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("SECURITY ALERT"));

    let req = test::TestRequest::post()
        .uri("/api/v1/vault/keys/toggle")
        .set_json(json!({ "profileId": "u2", "confirmed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/vault").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["activeKeys"], 0);
}

#[actix_web::test]
async fn test_chat_send_and_skip_small_talk() {
    let h = harness(true, Some("\"Basement, Saturday, 11pm.\""));
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/api/v1/chat/u2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["conversation"]["unread"], false);

    let req = test::TestRequest::post().uri("/api/v1/chat/u2/skip-small-talk").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["draft"], "Basement, Saturday, 11pm.");

    let req = test::TestRequest::post()
        .uri("/api/v1/chat/u2/messages")
        .set_json(json!({ "text": "See you there" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["conversation"]["lastMessage"], "See you there");

    let req = test::TestRequest::get().uri("/api/v1/chat/nobody").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_ai_failure_carries_notice() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/icebreaker")
        .set_json(json!({ "targetId": "u2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Scene Architect currently unavailable.");
}

#[actix_web::test]
async fn test_animate_returns_video_bytes() {
    let h = harness(true, Some("unused"));
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/animate")
        .set_json(json!({ "photo": "data:image/png;base64,aGVsbG8=" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "video/mp4");

    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"mp4-bytes");
}

#[actix_web::test]
async fn test_host_application_flow() {
    let h = harness(true, Some("A silent disco on a rooftop."));
    let app = app!(h.state);

    let req = test::TestRequest::post().uri("/api/v1/host/submit").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/api/v1/host/next").to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::post().uri("/api/v1/host/vision/draft").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["application"]["vision"], "A silent disco on a rooftop.");

    let req = test::TestRequest::post().uri("/api/v1/host/submit").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["application"]["submitted"], true);
    assert_eq!(body["effects"][0]["type"], "notice");
}

#[actix_web::test]
async fn test_malformed_json_is_reported_as_json() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/discovery/sesh-request")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_signed_out_user_cannot_like_or_start_session() {
    let h = harness(false, None);
    let app = app!(h.state);

    let req = test::TestRequest::post().uri("/api/v1/discovery/like").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/discovery/sesh-request")
        .set_json(json!({ "targetId": "u2", "day": "Tue", "slot": "Evening" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/session/start")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get().uri("/api/v1/session").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["phase"], "idle");

    let req = test::TestRequest::get().uri("/api/v1/discovery").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["liked"], json!([]));
    assert_eq!(h.state.profiles.get("u1").await.unwrap().speed_dating_tickets, 1);
}

#[actix_web::test]
async fn test_reset_locks_signed_in_actions() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/app/dispatch")
        .set_json(json!({ "action": { "type": "reset" } }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post().uri("/api/v1/discovery/like").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid transition");
}

#[actix_web::test]
async fn test_phone_sized_photo_upload_is_accepted() {
    let h = harness(false, None);
    let app = app!(h.state);

    // a 3 MiB photo is about 4 MiB once base64 encoded
    let url = format!("data:image/jpeg;base64,{}", "A".repeat(4 * 1024 * 1024));
    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/photos")
        .set_json(json!({ "urls": [url] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["photos"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_voice_poll_needs_an_open_session() {
    let h = harness(true, None);
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/voice/poll")
        .set_json(json!({ "now": 0.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post().uri("/api/v1/voice/start").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["active"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/voice/poll")
        .set_json(json!({ "now": 1.5 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["updates"], json!([]));
}
