use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/reports", get(handlers::reports_page))
        .route("/reports/generate", post(handlers::generate_report_form))
        .route("/reports/:id/delete", post(handlers::delete_report_form))
        .route("/api/health", get(handlers::health))
        .route("/api/login", post(handlers::api_login))
        .route("/api/logout", post(handlers::api_logout))
        .route("/api/me", get(handlers::api_me))
        .route("/api/dashboard", get(handlers::api_dashboard))
        .route("/api/locations", get(handlers::api_locations))
        .route("/api/locations/:id", get(handlers::api_location))
        .route(
            "/api/locations/:id/evaluations",
            get(handlers::api_location_evaluations),
        )
        .route(
            "/api/evaluations",
            get(handlers::api_evaluations).post(handlers::api_create_evaluation),
        )
        .route("/api/volunteers", get(handlers::api_volunteers))
        .route("/api/volunteers/:id", get(handlers::api_volunteer))
        .route(
            "/api/volunteers/:id/availability",
            put(handlers::api_set_availability),
        )
        .route("/api/regions", get(handlers::api_regions))
        .route(
            "/api/reports",
            get(handlers::api_list_reports).post(handlers::api_generate_report),
        )
        .route("/api/reports/:id", delete(handlers::api_delete_report))
        .route("/api/reports/:id/download", get(handlers::api_download_report))
        .with_state(state)
}
