use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::core::vault::{Connection, VaultError, VaultTab};
use crate::models::{ConfirmRequest, EffectsResponse, ToggleKeyRequest, VaultTabRequest};
use crate::routes::{error_response, validation_failed, AppState};

/// Configure vault routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/vault", web::get().to(get_vault))
        .route("/vault/tab", web::put().to(set_tab))
        .route("/vault/keys/toggle", web::post().to(toggle_key))
        .route("/vault/keys/revoke-all", web::post().to(revoke_all));
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VaultView {
    tab: VaultTab,
    photos: Vec<String>,
    connections: Vec<Connection>,
    active_keys: usize,
}

fn vault_error(e: VaultError) -> HttpResponse {
    match e {
        VaultError::ConfirmationRequired(_) => {
            error_response(StatusCode::CONFLICT, "Confirmation required", e)
        }
        VaultError::UnknownConnection(_) => {
            error_response(StatusCode::NOT_FOUND, "Unknown connection", e)
        }
    }
}

async fn vault_view(state: &AppState) -> Result<VaultView, HttpResponse> {
    let owner = state.current_user().await?;
    let profiles = state.profiles.all().await;

    let screens = state.screens.lock().await;
    Ok(VaultView {
        tab: screens.vault.tab(),
        photos: screens.vault.photos(&owner).to_vec(),
        connections: screens.vault.connections(&profiles),
        active_keys: screens.vault.active_count(),
    })
}

async fn get_vault(state: web::Data<AppState>) -> impl Responder {
    match vault_view(&state).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(response) => response,
    }
}

async fn set_tab(state: web::Data<AppState>, req: web::Json<VaultTabRequest>) -> impl Responder {
    state.screens.lock().await.vault.set_tab(req.tab);
    match vault_view(&state).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(response) => response,
    }
}

/// Grant or revoke a private access key
///
/// POST /api/v1/vault/keys/toggle
///
/// Request body:
/// ```json
/// { "profileId": "u2", "confirmed": true }
/// ```
///
/// Revoking without `confirmed` answers 409 with the prompt to show.
async fn toggle_key(state: web::Data<AppState>, req: web::Json<ToggleKeyRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let profile = match state.profiles.get(&req.profile_id).await {
        Ok(profile) => profile,
        Err(e) => return error_response(StatusCode::NOT_FOUND, "Profile not found", e),
    };

    let result = state.screens.lock().await.vault.toggle(&profile, req.confirmed);
    match result {
        Ok(effects) => HttpResponse::Ok().json(EffectsResponse {
            effects: state.run_effects(effects),
        }),
        Err(e) => vault_error(e),
    }
}

async fn revoke_all(state: web::Data<AppState>, req: web::Json<ConfirmRequest>) -> impl Responder {
    let result = state.screens.lock().await.vault.revoke_all(req.confirmed);
    match result {
        Ok(effects) => HttpResponse::Ok().json(EffectsResponse {
            effects: state.run_effects(effects),
        }),
        Err(e) => vault_error(e),
    }
}
