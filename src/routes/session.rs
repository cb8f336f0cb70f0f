use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::core::session::SessionError;
use crate::models::{DecisionRequest, SessionResponse, StartSessionRequest};
use crate::routes::{error_response, AppState};

/// Configure blind sesh routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/session", web::get().to(get_session))
        .route("/session/start", web::post().to(start_session))
        .route("/session/decide", web::post().to(decide))
        .route("/session/cancel", web::post().to(cancel));
}

fn session_error(e: SessionError) -> HttpResponse {
    let (status, error) = match &e {
        SessionError::OutOfTickets => (StatusCode::PAYMENT_REQUIRED, "Out of tickets"),
        SessionError::PermissionDenied => (StatusCode::FORBIDDEN, "Permission denied"),
        SessionError::InvalidPhase { .. } => (StatusCode::CONFLICT, "Session busy"),
        SessionError::UnknownUser(_) => (StatusCode::NOT_FOUND, "Profile not found"),
    };
    error_response(status, error, e)
}

async fn get_session(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.session.snapshot().await)
}

/// Join the blind sesh queue
///
/// POST /api/v1/session/start
///
/// Request body (optional):
/// ```json
/// { "userId": "u1" }
/// ```
async fn start_session(
    state: web::Data<AppState>,
    req: Option<web::Json<StartSessionRequest>>,
) -> impl Responder {
    if let Err(response) = state.require_authorized("startSession").await {
        return response;
    }

    let requested = req.and_then(|r| r.into_inner().user_id);
    let user_id = match requested {
        Some(id) => id,
        None => state.screens.lock().await.router.current_user.clone(),
    };

    match state.session.start(&user_id).await {
        Ok(session) => HttpResponse::Ok().json(SessionResponse {
            session,
            effects: Vec::new(),
        }),
        Err(e) => {
            tracing::info!("Blind sesh start refused for {}: {}", user_id, e);
            session_error(e)
        }
    }
}

/// Answer the decision prompt
///
/// POST /api/v1/session/decide
///
/// Request body:
/// ```json
/// { "decision": "accept" }
/// ```
async fn decide(state: web::Data<AppState>, req: web::Json<DecisionRequest>) -> impl Responder {
    match state.session.decide(req.decision).await {
        Ok(effects) => HttpResponse::Ok().json(SessionResponse {
            session: state.session.snapshot().await,
            effects,
        }),
        Err(e) => session_error(e),
    }
}

async fn cancel(state: web::Data<AppState>) -> impl Responder {
    let effects = state.session.cancel().await;
    HttpResponse::Ok().json(SessionResponse {
        session: state.session.snapshot().await,
        effects,
    })
}
