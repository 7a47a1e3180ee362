use axum::Router;

use crate::state::AppState;

pub mod applications;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod parts;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/parts", parts::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/applications", applications::router())
        .nest("/profile", profile::router())
}
