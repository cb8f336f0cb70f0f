use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::core::chat::ChatError;
use crate::models::SendMessageRequest;
use crate::routes::ai::ai_error;
use crate::routes::{error_response, validation_failed, AppState};

/// Configure DM routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::get().to(list_conversations))
        .route("/chat/{id}", web::get().to(open_conversation))
        .route("/chat/{id}/messages", web::post().to(send_message))
        .route("/chat/{id}/skip-small-talk", web::post().to(skip_small_talk));
}

fn chat_error(e: ChatError) -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, "Conversation not found", e)
}

async fn list_conversations(state: web::Data<AppState>) -> impl Responder {
    let screens = state.screens.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "conversations": screens.inbox.conversations(),
        "unreadCount": screens.inbox.unread_count(),
    }))
}

/// Open a thread; marks it read and returns it with its draft
async fn open_conversation(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    match screens.inbox.open(&path) {
        Ok(conversation) => HttpResponse::Ok().json(serde_json::json!({
            "conversation": conversation,
            "draft": screens.inbox.draft(&path),
        })),
        Err(e) => chat_error(e),
    }
}

/// Send a message in a thread
///
/// POST /api/v1/chat/{id}/messages
///
/// Request body:
/// ```json
/// { "text": "Saturday at Basement?" }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let now = chrono::Local::now().time();
    let result = {
        let mut screens = state.screens.lock().await;
        screens
            .inbox
            .send(&path, &req.text, now)
            .and_then(|effects| screens.inbox.open(&path).map(|c| (effects, c)))
    };

    match result {
        Ok((effects, conversation)) => HttpResponse::Ok().json(serde_json::json!({
            "conversation": conversation,
            "effects": state.run_effects(effects),
        })),
        Err(e) => chat_error(e),
    }
}

/// Replace the thread draft with an AI date proposal
async fn skip_small_talk(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    if let Err(e) = state.screens.lock().await.inbox.open(&path) {
        return chat_error(e);
    }

    let user = match state.current_user().await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let proposal = match state.ai.skip_small_talk(&user).await {
        Ok(proposal) => proposal,
        Err(e) => return ai_error(e),
    };

    if let Err(e) = state
        .screens
        .lock()
        .await
        .inbox
        .set_draft(&path, proposal.text.clone())
    {
        return chat_error(e);
    }

    HttpResponse::Ok().json(serde_json::json!({
        "draft": proposal.text,
        "effects": state.run_effects(proposal.effects),
    }))
}
