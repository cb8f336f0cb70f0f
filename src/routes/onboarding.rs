use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use chrono::Datelike;
use serde::Serialize;
use uuid::Uuid;

use crate::core::onboarding::{verify_birth_year, CuratedPhoto, OnboardingError, PhotoCurator};
use crate::core::photo_editor::{edit_data_url, EditParams, Rotation, Zoom};
use crate::core::router::Action;
use crate::models::{AddPhotosRequest, BirthYearRequest, EulaRequest, PhotoEditRequest};
use crate::routes::app::snapshot;
use crate::routes::{error_response, validation_failed, AppState};

/// Configure sign-up funnel routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/onboarding/age", web::post().to(verify_age))
        .route("/onboarding/identity", web::get().to(get_identity))
        .route("/onboarding/identity/scan", web::post().to(scan_identity))
        .route("/onboarding/identity/confirm", web::post().to(confirm_identity))
        .route("/onboarding/photos", web::get().to(get_photos))
        .route("/onboarding/photos", web::post().to(add_photos))
        .route("/onboarding/photos/{id}", web::delete().to(remove_photo))
        .route("/onboarding/photos/{id}/private", web::post().to(toggle_private))
        .route("/onboarding/photos/{id}/lead", web::post().to(set_lead))
        .route("/onboarding/photos/{id}/edit", web::post().to(edit_photo))
        .route("/onboarding/eula", web::put().to(set_eula))
        .route("/onboarding/submit", web::post().to(submit));
}

/// Photo grid with the identity score
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CuratorView {
    photos: Vec<CuratedPhoto>,
    completion: u8,
    hint: Option<&'static str>,
    eula_accepted: bool,
    ready: bool,
}

impl From<&PhotoCurator> for CuratorView {
    fn from(curator: &PhotoCurator) -> Self {
        Self {
            photos: curator.photos().to_vec(),
            completion: curator.completion(),
            hint: curator.hint(),
            eula_accepted: curator.eula_accepted(),
            ready: curator.is_ready(),
        }
    }
}

fn onboarding_error(e: OnboardingError) -> HttpResponse {
    match e {
        OnboardingError::PhotoNotFound(_) => error_response(StatusCode::NOT_FOUND, "Photo not found", e),
        _ => error_response(StatusCode::BAD_REQUEST, "Onboarding step incomplete", e),
    }
}

/// Dispatch the funnel action that follows a passed check
async fn advance(state: &AppState, action: Action) -> HttpResponse {
    let result = state.screens.lock().await.router.dispatch(action);
    match result {
        Ok(effects) => {
            let effects = state.run_effects(effects);
            HttpResponse::Ok().json(snapshot(state, effects).await)
        }
        Err(e) => error_response(StatusCode::CONFLICT, "Invalid transition", e),
    }
}

/// Age gate
///
/// POST /api/v1/onboarding/age
///
/// Request body:
/// ```json
/// { "birthYear": "1998" }
/// ```
async fn verify_age(state: web::Data<AppState>, req: web::Json<BirthYearRequest>) -> impl Responder {
    let current_year = chrono::Local::now().year();
    match verify_birth_year(&req.birth_year, current_year) {
        Ok(age) => {
            tracing::info!("Age gate passed (age {})", age);
            advance(&state, Action::AgeVerified).await
        }
        Err(e) => {
            tracing::info!("Age gate refused: {}", e);
            error_response(StatusCode::BAD_REQUEST, "Age verification failed", e)
        }
    }
}

async fn get_identity(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.screens.lock().await.identity)
}

/// Run the simulated biometric scan to completion
async fn scan_identity(state: web::Data<AppState>) -> impl Responder {
    state.screens.lock().await.identity.start();

    let duration = std::time::Duration::from_millis(state.settings.device.identity_scan_ms);
    tokio::time::sleep(duration).await;

    let mut screens = state.screens.lock().await;
    screens.identity.finish();
    HttpResponse::Ok().json(screens.identity)
}

async fn confirm_identity(state: web::Data<AppState>) -> impl Responder {
    let scanned = state.screens.lock().await.identity.confirm();
    match scanned {
        Ok(()) => advance(&state, Action::IdentityConfirmed).await,
        Err(e) => onboarding_error(e),
    }
}

async fn get_photos(state: web::Data<AppState>) -> impl Responder {
    let screens = state.screens.lock().await;
    HttpResponse::Ok().json(CuratorView::from(&screens.curator))
}

async fn add_photos(state: web::Data<AppState>, req: web::Json<AddPhotosRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let mut screens = state.screens.lock().await;
    let ids = screens.curator.add(req.into_inner().urls);
    tracing::debug!("Added {} photos", ids.len());
    HttpResponse::Ok().json(CuratorView::from(&screens.curator))
}

async fn remove_photo(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    match screens.curator.remove(*path) {
        Ok(()) => HttpResponse::Ok().json(CuratorView::from(&screens.curator)),
        Err(e) => onboarding_error(e),
    }
}

async fn toggle_private(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    match screens.curator.toggle_private(*path) {
        Ok(_) => HttpResponse::Ok().json(CuratorView::from(&screens.curator)),
        Err(e) => onboarding_error(e),
    }
}

async fn set_lead(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    match screens.curator.set_lead(*path) {
        Ok(()) => HttpResponse::Ok().json(CuratorView::from(&screens.curator)),
        Err(e) => onboarding_error(e),
    }
}

/// Crop and rotate an uploaded photo onto the square canvas
///
/// POST /api/v1/onboarding/photos/{id}/edit
///
/// Request body:
/// ```json
/// { "rotation": 90, "zoom": 1.4 }
/// ```
async fn edit_photo(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<PhotoEditRequest>,
) -> impl Responder {
    let id = *path;
    let source = match state.screens.lock().await.curator.url_of(id) {
        Ok(url) => url.to_string(),
        Err(e) => return onboarding_error(e),
    };

    let params = EditParams {
        rotation: Rotation::from_degrees(req.rotation),
        zoom: Zoom::new(req.zoom),
    };

    let edited = match web::block(move || edit_data_url(&source, params)).await {
        Ok(Ok(url)) => url,
        Ok(Err(e)) => {
            tracing::info!("Photo edit failed: {}", e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Photo edit failed", e);
        }
        Err(e) => {
            tracing::error!("Photo edit worker failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Photo edit failed", e);
        }
    };

    let mut screens = state.screens.lock().await;
    match screens.curator.replace_url(id, edited) {
        Ok(()) => HttpResponse::Ok().json(CuratorView::from(&screens.curator)),
        Err(e) => onboarding_error(e),
    }
}

async fn set_eula(state: web::Data<AppState>, req: web::Json<EulaRequest>) -> impl Responder {
    let mut screens = state.screens.lock().await;
    screens.curator.set_eula(req.accepted);
    HttpResponse::Ok().json(CuratorView::from(&screens.curator))
}

/// Publish the curated galleries and finish onboarding
async fn submit(state: web::Data<AppState>) -> impl Responder {
    let (gallery, user_id) = {
        let screens = state.screens.lock().await;
        match screens.curator.submit() {
            Ok(gallery) => (gallery, screens.router.current_user.clone()),
            Err(e) => return onboarding_error(e),
        }
    };

    if let Err(e) = state
        .profiles
        .set_gallery(&user_id, gallery.public_photos, gallery.private_photos)
        .await
    {
        tracing::error!("Failed to publish gallery for {}: {}", user_id, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to publish gallery", e);
    }

    advance(&state, Action::OnboardingComplete).await
}
