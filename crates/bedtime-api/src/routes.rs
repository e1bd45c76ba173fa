use axum::{
    Json, Router, middleware,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};

use crate::auth::AppState;
use crate::middleware::{require_admin, require_auth};
use crate::{admin, bookmarks, settings, stories};

/// All HTTP routes. Transport layers (CORS, tracing) are added by the server.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/stories", get(stories::list_published))
        .route("/api/stories/preview", get(stories::preview));

    let protected_routes = Router::new()
        .route("/api/stories", post(stories::create_story))
        .route("/api/stories/my-submissions", get(stories::my_submissions))
        .route("/api/stories/{id}", patch(stories::edit_story))
        .route("/api/stories/{id}/submit", post(stories::submit_story))
        .route(
            "/api/parent-settings",
            get(settings::get_settings).post(settings::save_settings),
        )
        .route("/api/verify-pin", post(settings::verify_pin))
        .route(
            "/api/bookmarks",
            get(bookmarks::list_bookmarks).post(bookmarks::add_bookmark),
        )
        .route("/api/bookmarks/{story_id}", delete(bookmarks::remove_bookmark))
        .route("/api/admin/check", get(admin::check_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Layers run bottom-up: authentication first, then the admin gate.
    let admin_routes = Router::new()
        .route("/api/admin/pending-stories", get(admin::pending_stories))
        .route("/api/admin/review-story/{id}", post(admin::review_story))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/stories", get(admin::all_stories))
        .route("/api/admin/stories/{story_id}", delete(admin::delete_story))
        .route("/api/admin/users", get(admin::users))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
