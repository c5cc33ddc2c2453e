use axum::{Router, extract::DefaultBodyLimit};
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod clients;
pub mod custom;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;
pub mod uploads;

// Build the API router without binding state; it will be provided at the top level.
// Uploads get their own body limit; everything else keeps the global one.
pub fn create_api_router(upload_body_limit: usize) -> Router<AppState> {
    let uploads = uploads::router()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_body_limit));

    Router::new()
        .nest("/products", products::router())
        .nest("/reviews", reviews::router())
        .nest("/auth", auth::router())
        .nest("/orders", orders::route())
        .nest("/custom", custom::router())
        .nest("/clients", clients::router())
        .nest("/uploads", uploads)
        .nest("/admin", admin::router())
}
