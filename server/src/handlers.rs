// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::database;
use crate::service::{self, ServiceError};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    Category, CreateCategoryPayload, CreateEmployeePayload, EmailTitleQuery, Employee,
    SearchResult, Task, TaskPage, TaskPayload, TaskSearchCriteria,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Handler for listing all tasks.
pub async fn list_tasks(
    State(pool): State<SqlitePool>, // State injection (DB pool)
) -> Result<Json<SearchResult<Vec<Task>>>, AppError> {
    let found = service::find_all(&pool).await?;
    info!("Successfully retrieved {} tasks.", found.result.len());
    Ok(Json(found))
}

/// Handler for creating a new task.
pub async fn create_task(
    State(pool): State<SqlitePool>,
    Json(payload): Json<TaskPayload>, // Extracting the request body as JSON
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!("Received request to create task '{}'", payload.title);

    let task = service::create_task(&pool, payload).await?;

    info!("Task created successfully with ID: {}", task.id);

    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for updating an existing task.
pub async fn update_task(
    State(pool): State<SqlitePool>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<Task>, AppError> {
    debug!("Received request to update task {:?}", payload.id);

    let task = service::update_task(&pool, payload).await?;
    Ok(Json(task))
}

/// Handler for fetching a single task by ID.
pub async fn get_task(
    State(pool): State<SqlitePool>,
    Path(task_id): Path<i64>, // Extract task ID from the URL path
) -> Result<Json<Task>, AppError> {
    let task = service::find_task(&pool, task_id).await?;
    Ok(Json(task))
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(pool): State<SqlitePool>,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    service::delete_task(&pool, task_id).await?;

    info!("Task with ID {} deleted successfully.", task_id);
    Ok(StatusCode::NO_CONTENT) // 204 No Content for successful deletion
}

/// Handler resolving the category a task belongs to.
pub async fn get_task_category(
    State(pool): State<SqlitePool>,
    Path(task_id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let category = service::find_category_of_task(&pool, task_id).await?;
    Ok(Json(category))
}

/// Handler for the multi-criteria, paginated task search.
pub async fn search_tasks(
    State(pool): State<SqlitePool>,
    Json(criteria): Json<TaskSearchCriteria>,
) -> Result<Json<SearchResult<TaskPage>>, AppError> {
    debug!("Received search request: {:?}", criteria);

    let found = service::search_by_params(&pool, &criteria).await?;
    Ok(Json(found))
}

/// Handler for listing the tasks assigned to one employee, by login.
pub async fn tasks_by_login(
    State(pool): State<SqlitePool>,
    Path(login): Path<String>,
) -> Result<Json<SearchResult<Vec<Task>>>, AppError> {
    let found = service::search_by_login(&pool, &login).await?;
    Ok(Json(found))
}

/// Handler for listing the tasks assigned to one employee, by email.
pub async fn tasks_by_email(
    State(pool): State<SqlitePool>,
    Path(email): Path<String>,
) -> Result<Json<SearchResult<Vec<Task>>>, AppError> {
    let found = service::search_by_email(&pool, &email).await?;
    Ok(Json(found))
}

/// Handler for the title-within-one-owner search.
pub async fn tasks_by_email_and_title(
    State(pool): State<SqlitePool>,
    Json(query): Json<EmailTitleQuery>,
) -> Result<Json<SearchResult<Vec<Task>>>, AppError> {
    let found = service::search_by_email_and_title(
        &pool,
        query.title.as_deref(),
        query.email.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(found))
}

/// Handler for listing the tasks under one category.
pub async fn tasks_by_category(
    State(pool): State<SqlitePool>,
    Path(category_id): Path<i64>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = service::find_by_category(&pool, category_id).await?;
    Ok(Json(tasks))
}

/// Handler for creating a category.
pub async fn create_category(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    if payload.name.is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Category name cannot be empty.",
        ));
    }

    let category = database::create_category_in_db(&pool, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for creating an employee.
pub async fn create_employee(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    if payload.login.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Employee login and email cannot be blank.",
        ));
    }

    let employee = database::create_employee_in_db(&pool, &payload.login, &payload.email).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Handler assigning an employee to a task.
pub async fn assign_employee(
    State(pool): State<SqlitePool>,
    Path((task_id, employee_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    if database::task_by_id_in_db(&pool, task_id).await?.is_none() {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            &format!("id {task_id} not found"),
        ));
    }
    if database::employee_by_id_in_db(&pool, employee_id).await?.is_none() {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            &format!("id {employee_id} not found"),
        ));
    }

    database::assign_employee_in_db(&pool, task_id, employee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Custom Error Handling ---
// This is a good practice for transforming our internal errors
// (e.g., from the database) into appropriate HTTP responses.

/// Our custom error type for the application.
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

/// Maps the service taxonomy onto status codes: invalid input is the
/// caller's fault, a missing id is 404, anything from storage is a 500
/// with the detail kept out of the response body.
impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, &message),
            ServiceError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, &message),
            ServiceError::Storage(err) => {
                tracing::error!("Internal server error: {:?}", err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.",
                )
            }
        }
    }
}

/// Allows converting an `anyhow::Error` (coming from `database.rs`)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred.".to_string(),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_task_validation_empty_title() {
        // Arrange
        // We can use a schemaless pool because the validation fails before
        // any DB access.
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let payload = Json(TaskPayload {
            id: None,
            title: String::new(),
            completed: false,
            task_date: None,
            category_id: None,
        });

        // Act
        let result = create_task(State(pool), payload).await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "title must not be empty");
    }

    #[tokio::test]
    async fn search_without_email_is_rejected() {
        // Arrange
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let criteria = Json(TaskSearchCriteria::default());

        // Act
        let result = search_tasks(State(pool), criteria).await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "email must not be blank");
    }
}
