use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::models::{
    AssistantRequest, IcebreakerRequest, MagicEditRequest, PhotoRequest, SuggestionRequest,
    VoiceAudioRequest, VoiceMessageRequest, VoicePollRequest,
};
use crate::routes::{error_response, validation_failed, AppState};
use crate::services::{AiError, AiText, VoiceError};

/// Configure generative feature and voice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ai/icebreaker", web::post().to(icebreaker))
        .route("/ai/captions", web::post().to(captions))
        .route("/ai/assistant", web::post().to(assistant))
        .route("/ai/suggestion", web::post().to(suggestion))
        .route("/ai/magic-edit", web::post().to(magic_edit))
        .route("/ai/animate", web::post().to(animate))
        .route("/voice/start", web::post().to(voice_start))
        .route("/voice/end", web::post().to(voice_end))
        .route("/voice/audio", web::post().to(voice_audio))
        .route("/voice/message", web::post().to(voice_message))
        .route("/voice/poll", web::post().to(voice_poll))
        .route("/cache/stats", web::get().to(cache_stats));
}

/// 502 carrying the user-facing notice for a failed generative call
pub(crate) fn ai_error(e: AiError) -> HttpResponse {
    match e {
        AiError::Service { .. } => error_response(StatusCode::BAD_GATEWAY, "Generation failed", e.notice()),
        AiError::UnknownField(_) | AiError::InvalidPhoto => {
            error_response(StatusCode::BAD_REQUEST, "Invalid request", e)
        }
    }
}

fn voice_error(e: VoiceError) -> HttpResponse {
    let (status, error) = match &e {
        VoiceError::MicrophoneDenied(_) => (StatusCode::FORBIDDEN, "Permission denied"),
        VoiceError::NotActive => (StatusCode::CONFLICT, "Voice session not active"),
        VoiceError::Transport(_) => (StatusCode::BAD_GATEWAY, "Voice transport failed"),
        VoiceError::Message(_) | VoiceError::Audio(_) => (StatusCode::BAD_REQUEST, "Malformed message"),
    };
    error_response(status, error, e)
}

fn ai_text(state: &AppState, mut text: AiText) -> HttpResponse {
    text.effects = state.run_effects(std::mem::take(&mut text.effects));
    HttpResponse::Ok().json(text)
}

/// Grounded date proposal for a profile
///
/// POST /api/v1/ai/icebreaker
///
/// Request body:
/// ```json
/// { "targetId": "u2", "latLng": { "latitude": 40.71, "longitude": -74.0 } }
/// ```
async fn icebreaker(state: web::Data<AppState>, req: web::Json<IcebreakerRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let target = match state.profiles.get(&req.target_id).await {
        Ok(profile) => profile,
        Err(e) => return error_response(StatusCode::NOT_FOUND, "Profile not found", e),
    };

    match state.ai.icebreaker(&target, req.lat_lng).await {
        Ok(text) => ai_text(&state, text),
        Err(e) => ai_error(e),
    }
}

async fn captions(state: web::Data<AppState>) -> impl Responder {
    let user = match state.current_user().await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.ai.captions(&user).await {
        Ok(text) => ai_text(&state, text),
        Err(e) => ai_error(e),
    }
}

/// Scene assistant chat turn; always answers
async fn assistant(state: web::Data<AppState>, req: web::Json<AssistantRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let reply = state.ai.assistant(&req.message, req.lat_lng).await;
    ai_text(&state, reply)
}

async fn suggestion(state: web::Data<AppState>, req: web::Json<SuggestionRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let user = match state.current_user().await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.ai.prompt_suggestion(&user, &req.field).await {
        Ok(text) => ai_text(&state, text),
        Err(e) => ai_error(e),
    }
}

/// Edit a photo from a text instruction
///
/// POST /api/v1/ai/magic-edit
///
/// Request body:
/// ```json
/// { "photo": "data:image/png;base64,...", "prompt": "add neon rim light" }
/// ```
///
/// `photo` is null when the model answered without an image.
async fn magic_edit(state: web::Data<AppState>, req: web::Json<MagicEditRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    match state.ai.magic_edit(&req.photo, &req.prompt).await {
        Ok(Some((photo, effects))) => HttpResponse::Ok().json(serde_json::json!({
            "photo": photo,
            "effects": state.run_effects(effects),
        })),
        Ok(None) => {
            tracing::info!("Magic edit returned no image");
            HttpResponse::Ok().json(serde_json::json!({ "photo": null, "effects": [] }))
        }
        Err(e) => ai_error(e),
    }
}

/// Animate a photo into a short vertical clip; answers with the MP4 bytes
async fn animate(state: web::Data<AppState>, req: web::Json<PhotoRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    match state.ai.animate(&req.photo).await {
        Ok(video) => HttpResponse::Ok().content_type("video/mp4").body(video),
        Err(e) => ai_error(e),
    }
}

async fn voice_start(state: web::Data<AppState>) -> impl Responder {
    match state.voice.start().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "active": true })),
        Err(e) => {
            tracing::info!("Voice sesh refused: {}", e);
            voice_error(e)
        }
    }
}

async fn voice_end(state: web::Data<AppState>) -> impl Responder {
    let stopped = state.voice.end().await;
    HttpResponse::Ok().json(serde_json::json!({ "active": false, "stopped": stopped }))
}

/// Forward one block of captured microphone samples
async fn voice_audio(state: web::Data<AppState>, req: web::Json<VoiceAudioRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    match state.voice.send_samples(&req.samples).await {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(e) => voice_error(e),
    }
}

/// Relay a live-model message; answers with the playback changes
async fn voice_message(state: web::Data<AppState>, req: web::Json<VoiceMessageRequest>) -> impl Responder {
    match state.voice.receive(&req.message, req.now).await {
        Ok(update) => HttpResponse::Ok().json(update),
        Err(e) => voice_error(e),
    }
}

/// Collect what the live model said since the last poll
///
/// POST /api/v1/voice/poll
///
/// Request body:
/// ```json
/// { "now": 12.4 }
/// ```
async fn voice_poll(state: web::Data<AppState>, req: web::Json<VoicePollRequest>) -> impl Responder {
    match state.voice.poll(req.now).await {
        Ok(updates) => HttpResponse::Ok().json(serde_json::json!({ "updates": updates })),
        Err(e) => voice_error(e),
    }
}

async fn cache_stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.cache.stats())
}
