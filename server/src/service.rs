// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::{database, search};

use common::{Category, SearchResult, Task, TaskPage, TaskPayload, TaskSearchCriteria};
use sqlx::SqlitePool;
use thiserror::Error;

/// Failures of the exposed task operations.
///
/// `Validation` and `NotFound` are checked before any mutating storage call
/// and surface to the caller immediately; storage failures propagate as-is,
/// without retries. An empty result set is not an error; see
/// [`SearchResult`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn id_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("id {id} not found"))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// Some clients send the string "null" for an unset field; it is as invalid
// a title as an empty one.
fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.is_empty() {
        return Err(ServiceError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    if title.eq_ignore_ascii_case("null") {
        return Err(ServiceError::Validation(
            "title must not be the literal 'null'".to_string(),
        ));
    }
    Ok(())
}

/// Creates a task. The id is assigned by storage and must not be supplied.
pub async fn create_task(pool: &SqlitePool, payload: TaskPayload) -> Result<Task, ServiceError> {
    if payload.id.is_some() {
        return Err(ServiceError::Validation(
            "id is assigned automatically and must not be supplied".to_string(),
        ));
    }
    validate_title(&payload.title)?;

    Ok(database::create_task_in_db(pool, &payload).await?)
}

/// Updates a task. The completion counter of the affected categories is
/// maintained inside the same transaction as the row update.
pub async fn update_task(pool: &SqlitePool, payload: TaskPayload) -> Result<Task, ServiceError> {
    let id = match payload.id {
        Some(id) if id != 0 => id,
        _ => {
            return Err(ServiceError::Validation(
                "id must not be missing or zero".to_string(),
            ));
        }
    };
    validate_title(&payload.title)?;

    database::update_task_in_db(pool, id, &payload)
        .await?
        .ok_or_else(|| id_not_found(id))
}

pub async fn delete_task(pool: &SqlitePool, id: i64) -> Result<(), ServiceError> {
    if id == 0 {
        return Err(ServiceError::Validation("id must not be zero".to_string()));
    }

    if database::delete_task_in_db(pool, id).await? {
        Ok(())
    } else {
        Err(id_not_found(id))
    }
}

pub async fn find_task(pool: &SqlitePool, id: i64) -> Result<Task, ServiceError> {
    if id == 0 {
        return Err(ServiceError::Validation("id must not be zero".to_string()));
    }

    database::task_by_id_in_db(pool, id)
        .await?
        .ok_or_else(|| id_not_found(id))
}

pub async fn find_all(pool: &SqlitePool) -> Result<SearchResult<Vec<Task>>, ServiceError> {
    let tasks = database::all_tasks_in_db(pool).await?;
    let note = tasks.is_empty().then(|| "no tasks exist yet".to_string());
    Ok(SearchResult { result: tasks, note })
}

/// All tasks assigned to the employee with this login, by id ascending.
pub async fn search_by_login(
    pool: &SqlitePool,
    login: &str,
) -> Result<SearchResult<Vec<Task>>, ServiceError> {
    if is_blank(login) {
        return Err(ServiceError::Validation(
            "login must not be blank".to_string(),
        ));
    }

    let tasks = database::tasks_by_login_in_db(pool, login).await?;
    let note = tasks
        .is_empty()
        .then(|| format!("no task found for login: {login}"));
    Ok(SearchResult { result: tasks, note })
}

/// All tasks assigned to the employee with this email, by title ascending.
pub async fn search_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<SearchResult<Vec<Task>>, ServiceError> {
    if is_blank(email) {
        return Err(ServiceError::Validation(
            "email must not be blank".to_string(),
        ));
    }

    let tasks = database::tasks_by_email_in_db(pool, email).await?;
    let note = tasks
        .is_empty()
        .then(|| format!("no task found for email: {email}"));
    Ok(SearchResult { result: tasks, note })
}

/// One owner's tasks narrowed by an optional case-insensitive title
/// substring, by title ascending.
pub async fn search_by_email_and_title(
    pool: &SqlitePool,
    title: Option<&str>,
    email: &str,
) -> Result<SearchResult<Vec<Task>>, ServiceError> {
    if is_blank(email) {
        return Err(ServiceError::Validation(
            "email must not be blank".to_string(),
        ));
    }

    let tasks = database::tasks_by_email_and_title_in_db(pool, title, email).await?;
    let note = tasks.is_empty().then(|| {
        format!(
            "no task found for email: {email}, title: {}",
            title.unwrap_or_default()
        )
    });
    Ok(SearchResult { result: tasks, note })
}

/// The full search pipeline: validate the mandatory owner email, normalize
/// the optional filters, resolve the ordering, then run the composed,
/// paginated query.
pub async fn search_by_params(
    pool: &SqlitePool,
    criteria: &TaskSearchCriteria,
) -> Result<SearchResult<TaskPage>, ServiceError> {
    let email = criteria.email.as_deref().unwrap_or_default();
    if is_blank(email) {
        return Err(ServiceError::Validation(
            "email must not be blank".to_string(),
        ));
    }

    let query = search::compose(email, criteria)?;
    let page = database::search_tasks_in_db(pool, &query).await?;

    let note = page
        .items
        .is_empty()
        .then(|| format!("no task found for email: {email}"));
    Ok(SearchResult { result: page, note })
}

/// Tasks under one category, by id ascending. The category must be
/// referenced by at least one task.
pub async fn find_by_category(
    pool: &SqlitePool,
    category_id: i64,
) -> Result<Vec<Task>, ServiceError> {
    if category_id == 0 {
        return Err(ServiceError::Validation("id must not be zero".to_string()));
    }

    if !database::category_has_tasks_in_db(pool, category_id).await? {
        return Err(ServiceError::NotFound(format!(
            "no task found for category id {category_id}"
        )));
    }

    Ok(database::tasks_by_category_in_db(pool, category_id).await?)
}

/// Resolves the category a task belongs to.
pub async fn find_category_of_task(
    pool: &SqlitePool,
    task_id: i64,
) -> Result<Category, ServiceError> {
    let task = find_task(pool, task_id).await?;

    let Some(category_id) = task.category_id else {
        return Err(ServiceError::NotFound(format!(
            "task {task_id} has no category"
        )));
    };

    database::category_by_id_in_db(pool, category_id)
        .await?
        .ok_or_else(|| id_not_found(category_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        database::create_schema(&pool).await.unwrap();
        pool
    }

    /// A pool without any schema: every storage call against it fails, so a
    /// test passing with it proves validation ran before storage access.
    async fn schemaless_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    fn payload(title: &str) -> TaskPayload {
        TaskPayload {
            id: None,
            title: title.to_string(),
            completed: false,
            task_date: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_an_id() {
        let pool = setup_test_db().await;

        let task = create_task(&pool, payload("Ship report")).await.unwrap();

        assert!(task.id > 0);
        assert_eq!(task.title, "Ship report");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn create_rejects_a_supplied_id() {
        let pool = schemaless_pool().await;

        let mut body = payload("Ship report");
        body.id = Some(9);

        let err = create_task(&pool, body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_an_empty_title() {
        let pool = schemaless_pool().await;

        let err = create_task(&pool, payload("")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg.contains("empty")));
    }

    #[tokio::test]
    async fn create_rejects_the_null_placeholder_title() {
        let pool = schemaless_pool().await;

        let err = create_task(&pool, payload("NULL")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rejects_a_missing_or_zero_id() {
        let pool = schemaless_pool().await;

        let err = update_task(&pool, payload("Renamed")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut body = payload("Renamed");
        body.id = Some(0);
        let err = update_task(&pool, body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_of_an_unknown_id_is_not_found() {
        let pool = setup_test_db().await;

        let mut body = payload("Renamed");
        body.id = Some(77);

        let err = update_task(&pool, body).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn completing_a_task_lowers_the_category_count_by_one() {
        let pool = setup_test_db().await;
        let inbox = database::create_category_in_db(&pool, "Inbox").await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..4 {
            let mut body = payload(&format!("Task {i}"));
            body.category_id = Some(inbox.id);
            tasks.push(create_task(&pool, body).await.unwrap());
        }
        assert_eq!(
            database::category_by_id_in_db(&pool, inbox.id).await.unwrap().unwrap().uncompleted_count,
            4
        );

        let mut body = payload("Task 0");
        body.id = Some(tasks[0].id);
        body.completed = true;
        body.category_id = Some(inbox.id);
        update_task(&pool, body).await.unwrap();

        assert_eq!(
            database::category_by_id_in_db(&pool, inbox.id).await.unwrap().unwrap().uncompleted_count,
            3
        );
    }

    #[tokio::test]
    async fn delete_with_id_zero_never_reaches_storage() {
        let pool = schemaless_pool().await;

        let err = delete_task(&pool, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn blank_login_and_email_are_rejected() {
        let pool = schemaless_pool().await;

        assert!(matches!(
            search_by_login(&pool, "  ").await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            search_by_email(&pool, "").await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            search_by_email_and_title(&pool, Some("report"), " ").await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            search_by_params(&pool, &TaskSearchCriteria::default()).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn an_empty_search_is_a_success_with_a_note() {
        let pool = setup_test_db().await;
        database::create_employee_in_db(&pool, "ada", "ada@corp.io").await.unwrap();

        let criteria = TaskSearchCriteria {
            email: Some("ada@corp.io".to_string()),
            ..TaskSearchCriteria::default()
        };

        let found = search_by_params(&pool, &criteria).await.unwrap();
        assert!(found.result.items.is_empty());
        assert_eq!(
            found.note.as_deref(),
            Some("no task found for email: ada@corp.io")
        );
    }

    #[tokio::test]
    async fn category_lookup_requires_a_referencing_task() {
        let pool = setup_test_db().await;
        let lonely = database::create_category_in_db(&pool, "Lonely").await.unwrap();

        let err = find_by_category(&pool, lonely.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn category_of_a_task_resolves_through_the_task() {
        let pool = setup_test_db().await;
        let inbox = database::create_category_in_db(&pool, "Inbox").await.unwrap();

        let mut body = payload("Sorted");
        body.category_id = Some(inbox.id);
        let task = create_task(&pool, body).await.unwrap();

        let category = find_category_of_task(&pool, task.id).await.unwrap();
        assert_eq!(category.id, inbox.id);

        let loose = create_task(&pool, payload("Loose")).await.unwrap();
        let err = find_category_of_task(&pool, loose.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
