//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use super::handlers;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root_redirect))
        .nest("/api/v1", api_routes())
        .route("/api/voice-token", get(handlers::voice::voice_token))
        .route("/webhooks/identity", post(handlers::webhook::identity_webhook))
        .route("/files/{file_id}", get(handlers::storage::get_file))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(handlers::health::metrics_handler))
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(server_routes())
        .merge(channel_routes())
        .merge(invite_routes())
        .merge(friend_routes())
        .merge(direct_message_routes())
        .merge(message_routes())
        .merge(typing_routes())
        .merge(storage_routes())
}

/// User directory and profile routes
fn user_routes() -> Router<AppState> {
    use handlers::user;

    Router::new()
        .route("/users/@me", get(user::get_current_user))
        .route("/users/@me/admin", get(user::is_admin))
        .route("/users/@me/privacy", patch(user::set_privacy))
        .route("/users/@me/email/sync", post(user::sync_email))
        .route("/users", get(user::list_all))
        .route("/users/public", get(user::list_public))
        .route("/users/private", get(user::list_private))
        .route("/users/visible", get(user::list_visible))
        .route("/users/{user_id}/email", put(user::set_email))
        .route("/admin/direct-messages", post(user::admin_send_direct_message))
}

/// Server management routes
fn server_routes() -> Router<AppState> {
    use handlers::server;

    Router::new()
        .route(
            "/servers",
            get(server::list_servers).post(server::create_server),
        )
        .route(
            "/servers/{server_id}",
            get(server::get_server).delete(server::delete_server),
        )
        .route("/servers/{server_id}/members", get(server::get_server_members))
        .route(
            "/servers/{server_id}/channels",
            get(server::get_server_channels).post(server::create_channel),
        )
        .route("/servers/{server_id}/invites", post(server::create_invite))
}

/// Channel routes
fn channel_routes() -> Router<AppState> {
    use handlers::channel;

    Router::new().route(
        "/channels/{channel_id}",
        get(channel::get_channel).delete(channel::delete_channel),
    )
}

/// Invite routes
fn invite_routes() -> Router<AppState> {
    use handlers::invite;

    Router::new()
        .route("/invites/{invite_id}", get(invite::get_invite))
        .route("/invites/{invite_id}/join", post(invite::join_invite))
}

/// Friend routes
fn friend_routes() -> Router<AppState> {
    use handlers::friend;

    Router::new()
        .route(
            "/friends",
            get(friend::list_friends).post(friend::send_request),
        )
        .route("/friends/pending", get(friend::list_pending))
        .route("/friends/{friend_id}", patch(friend::update_status))
}

/// Direct message routes
fn direct_message_routes() -> Router<AppState> {
    use handlers::direct_message;

    Router::new()
        .route(
            "/dms",
            get(direct_message::list_direct_messages).post(direct_message::open_direct_message),
        )
        .route("/dms/{dm_id}", get(direct_message::get_direct_message))
}

/// Message routes
fn message_routes() -> Router<AppState> {
    use handlers::message;

    Router::new()
        .route(
            "/messages",
            get(message::get_messages).post(message::send_message),
        )
        .route("/messages/{message_id}", delete(message::delete_message))
}

/// Typing indicator routes
fn typing_routes() -> Router<AppState> {
    use handlers::typing;

    Router::new().route(
        "/typing",
        get(typing::get_typing).put(typing::start_typing),
    )
}

/// File upload routes
fn storage_routes() -> Router<AppState> {
    use handlers::storage;

    Router::new()
        .route("/storage/upload-url", post(storage::generate_upload_url))
        .route("/storage/upload/{ticket}", put(storage::upload))
}
