use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::core::effects::Effect;
use crate::core::host::{HostApplication, HostError};
use crate::models::{EffectsResponse, HostApplicationRequest};
use crate::routes::ai::ai_error;
use crate::routes::{error_response, validation_failed, AppState};

/// Configure events, premium and host application routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/events", web::get().to(get_board))
        .route("/premium/purchase", web::post().to(purchase))
        .route("/host", web::get().to(get_host))
        .route("/host/next", web::post().to(host_next))
        .route("/host/back", web::post().to(host_back))
        .route("/host/vision", web::put().to(set_vision))
        .route("/host/vision/draft", web::post().to(draft_vision))
        .route("/host/submit", web::post().to(submit_host));
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HostView {
    application: HostApplication,
    effects: Vec<Effect>,
}

fn host_view(application: HostApplication) -> HttpResponse {
    HttpResponse::Ok().json(HostView {
        application,
        effects: Vec::new(),
    })
}

/// Events, premium perks and the hype quote
async fn get_board(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.board.as_ref())
}

async fn purchase(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(EffectsResponse {
        effects: state.run_effects(state.board.purchase()),
    })
}

async fn get_host(state: web::Data<AppState>) -> impl Responder {
    host_view(state.screens.lock().await.host.clone())
}

async fn host_next(state: web::Data<AppState>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    screens.host.next();
    host_view(screens.host.clone())
}

async fn host_back(state: web::Data<AppState>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    screens.host.back();
    host_view(screens.host.clone())
}

async fn set_vision(state: web::Data<AppState>, req: web::Json<HostApplicationRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let mut screens = state.screens.lock().await;
    screens.host.set_vision(req.into_inner().vision);
    host_view(screens.host.clone())
}

/// Let the model write the event vision
async fn draft_vision(state: web::Data<AppState>) -> impl Responder {
    let user = match state.current_user().await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let draft = match state.ai.host_vision(&user).await {
        Ok(draft) => draft,
        Err(e) => return ai_error(e),
    };

    let application = {
        let mut screens = state.screens.lock().await;
        screens.host.set_vision(draft.text);
        screens.host.clone()
    };
    HttpResponse::Ok().json(HostView {
        application,
        effects: state.run_effects(draft.effects),
    })
}

async fn submit_host(state: web::Data<AppState>) -> impl Responder {
    let result = {
        let mut screens = state.screens.lock().await;
        screens.host.submit().map(|effects| (effects, screens.host.clone()))
    };

    match result {
        Ok((effects, application)) => HttpResponse::Ok().json(HostView {
            application,
            effects: state.run_effects(effects),
        }),
        Err(e @ HostError::NotFinalStep) => error_response(StatusCode::CONFLICT, "Application incomplete", e),
        Err(e) => error_response(StatusCode::BAD_REQUEST, "Application incomplete", e),
    }
}
