use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::core::availability::{overlap, Day, Planner, Slot};
use crate::models::{AvailabilitySlot, ToggleSlotRequest};
use crate::routes::{error_response, validation_failed, AppState};

/// Configure calendar routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/calendar", web::get().to(get_calendar))
        .route("/calendar/toggle", web::post().to(toggle_slot))
        .route("/calendar/overlap/{id}", web::get().to(get_overlap));
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Window {
    day: Day,
    slot: Slot,
}

async fn get_calendar(state: web::Data<AppState>) -> impl Responder {
    let screens = state.screens.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "availability": screens.calendar.planner.to_slots(),
        "sent": screens.calendar.sent,
    }))
}

/// Flip one window of the user's planner
///
/// POST /api/v1/calendar/toggle
///
/// Request body:
/// ```json
/// { "day": "Sun", "slot": "Morning" }
/// ```
async fn toggle_slot(state: web::Data<AppState>, req: web::Json<ToggleSlotRequest>) -> impl Responder {
    if let Some(response) = validation_failed(&*req) {
        return response;
    }

    let parsed = req
        .day
        .parse::<Day>()
        .and_then(|day| req.slot.parse::<Slot>().map(|slot| (day, slot)));
    let (day, slot) = match parsed {
        Ok(window) => window,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid window", e),
    };

    let mut screens = state.screens.lock().await;
    let open = screens.calendar.planner.toggle(day, slot);
    tracing::debug!("{} {} is now {}", day, slot, if open { "open" } else { "closed" });

    let availability: Vec<AvailabilitySlot> = screens.calendar.planner.to_slots();
    HttpResponse::Ok().json(serde_json::json!({ "availability": availability }))
}

/// Windows the user shares with another profile
async fn get_overlap(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let other = match state.profiles.get(&path).await {
        Ok(profile) => profile,
        Err(e) => return error_response(StatusCode::NOT_FOUND, "Profile not found", e),
    };

    let screens = state.screens.lock().await;
    let shared: Vec<Window> = overlap(&screens.calendar.planner, &Planner::from_profile(&other))
        .into_iter()
        .map(|(day, slot)| Window { day, slot })
        .collect();
    HttpResponse::Ok().json(shared)
}
