use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::core::effects::Effect;
use crate::core::onboarding::{IdentityScan, PhotoCurator};
use crate::core::router::Action;
use crate::models::{AppSnapshotResponse, DispatchRequest, HealthResponse};
use crate::routes::{error_response, AppState};

/// Configure root controller routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/app", web::get().to(get_app))
        .route("/app/dispatch", web::post().to(dispatch))
        .route("/profiles", web::get().to(list_profiles))
        .route("/profiles/{id}", web::get().to(get_profile));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Router state, the signed-in profile and the unread badge
pub(crate) async fn snapshot(state: &AppState, effects: Vec<Effect>) -> AppSnapshotResponse {
    let (app, unread_count) = {
        let screens = state.screens.lock().await;
        (screens.router.clone(), screens.inbox.unread_count())
    };
    let user = state.profiles.get(&app.current_user).await.ok();

    AppSnapshotResponse {
        app,
        user,
        unread_count,
        effects,
    }
}

async fn get_app(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(snapshot(&state, Vec::new()).await)
}

/// Apply a router action
///
/// POST /api/v1/app/dispatch
///
/// Request body:
/// ```json
/// { "action": { "type": "navigate", "value": "calendar" } }
/// ```
async fn dispatch(state: web::Data<AppState>, req: web::Json<DispatchRequest>) -> impl Responder {
    let action = req.into_inner().action;

    let result = {
        let mut screens = state.screens.lock().await;
        let reset = action == Action::Reset;
        let result = screens.router.dispatch(action);
        if reset && result.is_ok() {
            screens.identity = IdentityScan::default();
            screens.curator = PhotoCurator::new();
        }
        result
    };

    match result {
        Ok(effects) => {
            let effects = state.run_effects(effects);
            HttpResponse::Ok().json(snapshot(&state, effects).await)
        }
        Err(e) => {
            tracing::info!("Rejected dispatch: {}", e);
            error_response(StatusCode::CONFLICT, "Invalid transition", e)
        }
    }
}

async fn list_profiles(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.profiles.all().await)
}

async fn get_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.profiles.get(&path).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => error_response(StatusCode::NOT_FOUND, "Profile not found", e),
    }
}
