//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (record store ping)
//!
//! # Auth
//! POST   /api/auth/register               - Create citizen or store owner
//! POST   /api/auth/login                  - Start session
//! POST   /api/auth/logout                 - End session
//! GET    /api/auth/me                     - Current user
//!
//! # Users
//! GET    /api/users/{id}                  - Profile with totals and friend count
//! GET    /api/users/by-username/{name}    - Lookup by username
//! GET    /api/users/{id}/totals           - Walk totals
//!
//! # Walks
//! POST   /api/walks                       - Record a walk (caller owns it)
//! GET    /api/walks/user/{id}             - A user's walks
//!
//! # Ranking
//! GET    /api/ranking?friendsOnly&userId  - Leaderboard
//!
//! # Friends
//! POST   /api/friends/request             - Send request
//! PUT    /api/friends/{id}/accept         - Accept (recipient only)
//! PUT    /api/friends/{id}/reject         - Reject (recipient only)
//! DELETE /api/friends/{id}                - Unfriend
//! GET    /api/friends/{id}                - Accepted friends of a user
//! GET    /api/friends/{id}/requests       - Pending incoming (self or city admin)
//!
//! # City (city_admin)
//! GET    /api/city/stats                  - City statistics
//! GET    /api/city/stores                 - Store rollup
//!
//! # Stores
//! GET    /api/stores                      - All stores (city_admin)
//! POST   /api/stores                      - Create store (city_admin)
//! GET    /api/stores/my-store             - Own store (store_owner)
//! GET    /api/stores/{id}/stats           - Store stats (city_admin or owner)
//! POST   /api/stores/{id}/traffic         - Record traffic (city_admin or owner)
//! ```

pub mod auth;
pub mod city;
pub mod friends;
pub mod health;
pub mod ranking;
pub mod stores;
pub mod users;
pub mod walks;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(users::profile))
        .route("/{id}/totals", get(users::totals))
        .route("/by-username/{username}", get(users::by_username))
}

/// Create the walk routes router.
pub fn walk_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(walks::create))
        .route("/user/{id}", get(walks::for_user))
}

/// Create the friend routes router.
pub fn friend_routes() -> Router<AppState> {
    Router::new()
        .route("/request", post(friends::send_request))
        .route("/{id}", get(friends::list).delete(friends::unfriend))
        .route("/{id}/accept", put(friends::accept))
        .route("/{id}/reject", put(friends::reject))
        .route("/{id}/requests", get(friends::pending))
}

/// Create the city dashboard routes router.
pub fn city_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(city::stats))
        .route("/stores", get(city::store_rollup))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::list).post(stores::create))
        .route("/my-store", get(stores::my_store))
        .route("/{id}/stats", get(stores::stats))
        .route("/{id}/traffic", post(stores::record_traffic))
}

/// Create the API router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/walks", walk_routes())
        .route("/api/ranking", get(ranking::ranking))
        .nest("/api/friends", friend_routes())
        .nest("/api/city", city_routes())
        .nest("/api/stores", store_routes())
}
