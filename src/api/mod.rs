mod admin;
pub mod auth;
mod error;
mod listings;
mod policy;
mod uploads;
mod validation;
mod vendor;

pub use error::{ApiError, ErrorCode};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes; register/login are public, the rest carry a bearer token
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile));

    // Marketplace routes. Browse and inquiries are public; creation and
    // likes authenticate via the extractor. The body limit covers image
    // uploads on the multipart create route.
    let listing_routes = Router::new()
        .route("/", get(listings::list_listings))
        .route("/", post(listings::create_listing))
        .route("/like", post(listings::toggle_like))
        .route("/liked", get(listings::liked_listings))
        .route("/:id", get(listings::get_listing))
        .route("/:id/leads", post(listings::create_lead))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_upload_bytes));

    let vendor_routes = Router::new()
        .route("/stats", get(vendor::stats))
        .route("/listings", get(vendor::list_listings))
        .route("/listings/:id", put(vendor::update_listing))
        .route("/listings/:id", delete(vendor::delete_listing))
        .route("/leads", get(vendor::list_leads))
        .route("/leads/:id/status", put(vendor::update_lead_status));

    let admin_routes = Router::new()
        .route("/stats", get(admin::stats))
        .route("/listings", get(admin::list_listings))
        .route("/listings/:id/status", put(admin::update_listing_status))
        .route("/users", get(admin::list_users))
        .route("/users/:id/status", put(admin::update_user_status));

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/listings", listing_routes)
        .nest("/api/vendor", vendor_routes)
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(cors_layer(&state.config.cors.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
