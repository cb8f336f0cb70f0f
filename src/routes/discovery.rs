use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::core::availability::{AvailabilityError, SeshRequest};
use crate::core::discovery::SESH_REQUEST_NOTICE;
use crate::core::effects::Effect;
use crate::core::filters::CandidateFilter;
use crate::core::router::Action;
use crate::models::{DiscoveryTabRequest, EffectsResponse, LikeResponse, SeshRequestBody};
use crate::routes::{error_response, validation_failed, AppState, Screens};

/// Configure discovery hub routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/discovery", web::get().to(get_discovery))
        .route("/discovery/tab", web::post().to(switch_tab))
        .route("/discovery/filter", web::put().to(set_filter))
        .route("/discovery/like", web::post().to(like))
        .route("/discovery/pass", web::post().to(pass))
        .route("/discovery/sparks", web::get().to(get_sparks))
        .route("/discovery/sesh-request", web::post().to(send_sesh_request));
}

async fn get_discovery(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.screens.lock().await.deck.snapshot())
}

async fn switch_tab(state: web::Data<AppState>, req: web::Json<DiscoveryTabRequest>) -> impl Responder {
    let (effects, snapshot) = {
        let mut screens = state.screens.lock().await;
        let effects = screens.deck.switch_tab(req.tab);
        (effects, screens.deck.snapshot())
    };
    state.run_effects(effects);
    HttpResponse::Ok().json(snapshot)
}

/// Narrow the deck by intention and/or shared availability
///
/// PUT /api/v1/discovery/filter
///
/// Request body:
/// ```json
/// { "intention": "Long-term", "overlappingOnly": true }
/// ```
async fn set_filter(state: web::Data<AppState>, req: web::Json<CandidateFilter>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    let Screens { deck, calendar, .. } = &mut *screens;
    deck.set_filter(req.into_inner(), &calendar.planner);
    HttpResponse::Ok().json(deck.snapshot())
}

/// Like the current card
///
/// POST /api/v1/discovery/like
///
/// An instant match raises the match overlay on the root controller.
async fn like(state: web::Data<AppState>) -> impl Responder {
    let (outcome, discovery, app) = {
        let mut screens = state.screens.lock().await;
        if let Err(e) = screens.router.require_authorized("like") {
            tracing::info!("Refused before sign-in: {}", e);
            return error_response(StatusCode::CONFLICT, "Invalid transition", e);
        }
        let outcome = screens.deck.like(&mut rand::thread_rng());

        if let Some(outcome) = outcome.as_ref().filter(|o| o.matched) {
            tracing::info!("Instant match with {}", outcome.profile_id);
            if let Err(e) = screens
                .router
                .dispatch(Action::MatchFound(outcome.profile_id.clone()))
            {
                tracing::warn!("Match overlay not shown: {}", e);
            }
        }
        (outcome, screens.deck.snapshot(), screens.router.clone())
    };

    let outcome = outcome.map(|mut outcome| {
        outcome.effects = state.run_effects(std::mem::take(&mut outcome.effects));
        outcome
    });

    HttpResponse::Ok().json(LikeResponse {
        outcome,
        discovery,
        app,
    })
}

async fn pass(state: web::Data<AppState>) -> impl Responder {
    let (effects, snapshot) = {
        let mut screens = state.screens.lock().await;
        let effects = screens.deck.pass();
        (effects, screens.deck.snapshot())
    };
    state.run_effects(effects);
    HttpResponse::Ok().json(snapshot)
}

/// Profiles on the Sparks tab, with the ids already liked
async fn get_sparks(state: web::Data<AppState>) -> impl Responder {
    let screens = state.screens.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "sparks": screens.deck.sparks(),
        "liked": screens.deck.liked(),
    }))
}

/// Send a date request for one of the target's open windows
///
/// POST /api/v1/discovery/sesh-request
///
/// Request body:
/// ```json
/// { "targetId": "u2", "day": "Fri", "slot": "Evening", "note": "Natural wine?" }
/// ```
async fn send_sesh_request(state: web::Data<AppState>, req: web::Json<SeshRequestBody>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }
    if let Err(response) = state.require_authorized("seshRequest").await {
        return response;
    }
    let req = req.into_inner();

    let target = match state.profiles.get(&req.target_id).await {
        Ok(profile) => profile,
        Err(e) => return error_response(StatusCode::NOT_FOUND, "Profile not found", e),
    };

    let request = match SeshRequest::new(&target, &req.day, &req.slot, req.note) {
        Ok(request) => request,
        Err(e @ (AvailabilityError::UnknownDay(_) | AvailabilityError::UnknownSlot(_))) => {
            return error_response(StatusCode::BAD_REQUEST, "Invalid window", e)
        }
        Err(e) => {
            tracing::info!("Sesh request refused: {}", e);
            return error_response(StatusCode::CONFLICT, "Window not offered", e);
        }
    };

    {
        let mut screens = state.screens.lock().await;
        screens.deck.record_like(&request.target_id);
        screens.calendar.record(request);
    }

    HttpResponse::Ok().json(EffectsResponse {
        effects: vec![Effect::notice(SESH_REQUEST_NOTICE)],
    })
}
