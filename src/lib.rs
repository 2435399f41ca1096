// Library crate for TaskHub
// Exports modules for use by the seed binary and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::{
    approve_task, complete_task, create_task, delete_task, delete_user, get_task, health,
    list_tasks, list_users, login, me, register, reject_task, route_fallback, start_task,
    update_task, update_user,
};
use crate::middlewares::{auth_middleware, require_admin};
use crate::state::AppState;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Admin-only routes (authentication + admin role)
    let admin_routes = Router::new()
        .route("/api/v1/auth/users", get(list_users))
        .route("/api/v1/auth/users/{id}", patch(update_user))
        .route("/api/v1/auth/users/{id}", delete(delete_user))
        // Later route_layer calls wrap earlier ones, so auth runs first
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Protected routes (require authentication; task-level role checks
    // happen in the service so that a missing task still reports 404)
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(me))
        // Task CRUD
        .route("/api/v1/tasks", get(list_tasks))
        .route("/api/v1/tasks", post(create_task))
        .route("/api/v1/tasks/{id}", get(get_task))
        .route("/api/v1/tasks/{id}", patch(update_task))
        .route("/api/v1/tasks/{id}", delete(delete_task))
        // Lifecycle transitions
        .route("/api/v1/tasks/{id}/start", post(start_task))
        .route("/api/v1/tasks/{id}/complete", post(complete_task))
        .route("/api/v1/tasks/{id}/approve", post(approve_task))
        .route("/api/v1/tasks/{id}/reject", post(reject_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        // Public auth routes
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        // Protected routes
        .merge(protected_routes)
        .merge(admin_routes)
        .fallback(route_fallback)
        .with_state(state)
}
