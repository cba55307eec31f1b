// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;

/// Creates and configures the application router.
pub fn create_router(pool: SqlitePool) -> Router {
    Router::new()
        // Task CRUD
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/tasks", post(handlers::create_task))
        .route("/api/tasks", put(handlers::update_task))
        .route("/api/tasks/{id}", get(handlers::get_task))
        .route("/api/tasks/{id}", delete(handlers::delete_task))
        .route("/api/tasks/{id}/category", get(handlers::get_task_category))
        // Search operations
        .route("/api/tasks/search", post(handlers::search_tasks))
        .route("/api/tasks/by-login/{login}", get(handlers::tasks_by_login))
        .route("/api/tasks/by-email/{email}", get(handlers::tasks_by_email))
        .route(
            "/api/tasks/by-email-title",
            post(handlers::tasks_by_email_and_title),
        )
        // Categories and employees
        .route("/api/categories", post(handlers::create_category))
        .route(
            "/api/categories/{id}/tasks",
            get(handlers::tasks_by_category),
        )
        .route("/api/employees", post(handlers::create_employee))
        .route(
            "/api/tasks/{id}/employees/{employee_id}",
            put(handlers::assign_employee),
        )
        // Adds the database pool to the application state
        .with_state(pool)
}
