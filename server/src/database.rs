// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::counter;
use crate::search::TaskQuery;

use anyhow::{Context, Result};
use common::{Category, Employee, Task, TaskPage, TaskPayload};
use sqlx::{migrate::MigrateDatabase, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

const SELECT_TASK_COLUMNS: &str =
    "SELECT t.id, t.title, t.completed, t.task_date, t.category_id FROM tasks t";

/// Establishes the database connection pool.
/// If the database does not exist, it creates it.
/// It also ensures all tables have the correct schema.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;

    info!("Database schema is ready.");

    Ok(pool)
}

/// Creates the tables the service works with. Exposed so tests run against
/// the exact same schema as the application and the two cannot drift.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            uncompleted_count INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'categories' table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            task_date TIMESTAMP NULL,
            category_id INTEGER NULL REFERENCES categories(id)
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'tasks' table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            login TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'employees' table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_employees (
            task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            employee_id INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
            PRIMARY KEY (task_id, employee_id)
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'task_employees' table")?;

    Ok(())
}

/// Inserts a new task. When the task lands uncompleted in a category, the
/// category's uncompleted count moves with it in the same transaction.
pub async fn create_task_in_db(pool: &SqlitePool, payload: &TaskPayload) -> Result<Task> {
    debug!(
        "Insert values: title={}, completed={}, task_date={:?}, category_id={:?}",
        payload.title, payload.completed, payload.task_date, payload.category_id
    );

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(
        "INSERT INTO tasks (title, completed, task_date, category_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(payload.completed)
    .bind(payload.task_date)
    .bind(payload.category_id)
    .execute(&mut *tx)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    apply_category_deltas(
        &mut tx,
        &counter::category_deltas(None, Some((payload.completed, payload.category_id))),
    )
    .await?;

    tx.commit().await.context("Failed to commit task creation")?;

    Ok(Task {
        id,
        title: payload.title.clone(),
        completed: payload.completed,
        task_date: payload.task_date,
        category_id: payload.category_id,
    })
}

/// Rewrites a task row and keeps the affected categories' uncompleted
/// counts consistent. The old state is read, the counters adjusted and the
/// row written inside one transaction.
/// Returns `Ok(None)` when no task with the given ID exists.
pub async fn update_task_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: &TaskPayload,
) -> Result<Option<Task>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let old: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read task before update")?;

    let Some(old) = old else {
        return Ok(None);
    };

    apply_category_deltas(
        &mut tx,
        &counter::category_deltas(
            Some((old.completed, old.category_id)),
            Some((payload.completed, payload.category_id)),
        ),
    )
    .await?;

    sqlx::query("UPDATE tasks SET title = ?, completed = ?, task_date = ?, category_id = ? WHERE id = ?")
        .bind(&payload.title)
        .bind(payload.completed)
        .bind(payload.task_date)
        .bind(payload.category_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update task in DB")?;

    tx.commit().await.context("Failed to commit task update")?;

    info!("Updated task with ID: {}", id);

    Ok(Some(Task {
        id,
        title: payload.title.clone(),
        completed: payload.completed,
        task_date: payload.task_date,
        category_id: payload.category_id,
    }))
}

/// Deletes a task, giving back its uncompleted-count unit if it held one.
/// Returns false when no task with the given ID was found.
pub async fn delete_task_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    debug!("Attempting to delete task with ID: {}", id);

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let old: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read task before delete")?;

    let Some(old) = old else {
        return Ok(false);
    };

    apply_category_deltas(
        &mut tx,
        &counter::category_deltas(Some((old.completed, old.category_id)), None),
    )
    .await?;

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete task from DB")?;

    tx.commit().await.context("Failed to commit task deletion")?;

    info!("Deleted task with ID: {}", id);

    Ok(true)
}

// Counter adjustments are in-place increments inside the caller's
// transaction: concurrent updates of the same category serialize on the
// row write instead of racing a read-modify-write.
async fn apply_category_deltas(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    deltas: &[counter::CategoryDelta],
) -> Result<()> {
    for delta in deltas {
        sqlx::query("UPDATE categories SET uncompleted_count = uncompleted_count + ? WHERE id = ?")
            .bind(delta.delta)
            .bind(delta.category_id)
            .execute(&mut **tx)
            .await
            .context("Failed to adjust category uncompleted count")?;
    }
    Ok(())
}

pub async fn task_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Task>> {
    sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve task by id from DB")
}

pub async fn all_tasks_in_db(pool: &SqlitePool) -> Result<Vec<Task>> {
    sqlx::query_as("SELECT * FROM tasks ORDER BY id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve tasks from DB")
}

/// Tasks assigned to the employee with the given login, by id ascending.
pub async fn tasks_by_login_in_db(pool: &SqlitePool, login: &str) -> Result<Vec<Task>> {
    sqlx::query_as(
        "SELECT t.id, t.title, t.completed, t.task_date, t.category_id \
         FROM tasks t \
         JOIN task_employees te ON te.task_id = t.id \
         JOIN employees e ON e.id = te.employee_id \
         WHERE e.login = ? \
         ORDER BY t.id ASC",
    )
    .bind(login)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve tasks by login from DB")
}

/// Tasks assigned to the employee with the given email, by title ascending.
pub async fn tasks_by_email_in_db(pool: &SqlitePool, email: &str) -> Result<Vec<Task>> {
    sqlx::query_as(
        "SELECT t.id, t.title, t.completed, t.task_date, t.category_id \
         FROM tasks t \
         JOIN task_employees te ON te.task_id = t.id \
         JOIN employees e ON e.id = te.employee_id \
         WHERE e.email = ? \
         ORDER BY t.title ASC",
    )
    .bind(email)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve tasks by email from DB")
}

/// One owner's tasks, optionally narrowed by a case-insensitive title
/// substring, by title ascending. An absent title narrows nothing.
pub async fn tasks_by_email_and_title_in_db(
    pool: &SqlitePool,
    title: Option<&str>,
    email: &str,
) -> Result<Vec<Task>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT t.id, t.title, t.completed, t.task_date, t.category_id \
         FROM tasks t \
         JOIN task_employees te ON te.task_id = t.id \
         JOIN employees e ON e.id = te.employee_id \
         WHERE e.email = ",
    );
    query.push_bind(email);

    if let Some(title) = title.filter(|t| !t.is_empty()) {
        query.push(" AND lower(t.title) LIKE '%' || lower(");
        query.push_bind(title);
        query.push(") || '%'");
    }

    query.push(" ORDER BY t.title ASC");

    query
        .build_query_as()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve tasks by email and title from DB")
}

/// Runs a composed search: one filter predicate shared by the COUNT query
/// and the page query, the resolved ordering, then the page window.
pub async fn search_tasks_in_db(pool: &SqlitePool, query: &TaskQuery) -> Result<TaskPage> {
    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM tasks t WHERE ");
    push_task_filters(&mut count_query, query);

    let total_elements: i64 = count_query
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .context("Failed to count matching tasks")?;

    let mut page_query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("{SELECT_TASK_COLUMNS} WHERE "));
    push_task_filters(&mut page_query, query);

    page_query.push(" ORDER BY ");
    for (i, key) in query.order.iter().enumerate() {
        if i > 0 {
            page_query.push(", ");
        }
        page_query.push(key.column.as_sql());
        page_query.push(" ");
        page_query.push(key.direction.as_sql());
    }

    let offset = i64::from(query.page_number) * i64::from(query.page_size);
    page_query.push(" LIMIT ");
    page_query.push_bind(i64::from(query.page_size));
    page_query.push(" OFFSET ");
    page_query.push_bind(offset);

    let items: Vec<Task> = page_query
        .build_query_as()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve task page from DB")?;

    let total_pages =
        (total_elements as u64).div_ceil(u64::from(query.page_size.max(1))) as u32;

    debug!(
        "Search matched {} tasks across {} pages",
        total_elements, total_pages
    );

    Ok(TaskPage {
        items,
        total_elements,
        total_pages,
        page_number: query.page_number,
        page_size: query.page_size,
    })
}

// Folds the filter set into the builder with logical AND. The mandatory
// owner-email scope always leads; an absent optional filter contributes
// nothing to the predicate instead of a false comparison.
fn push_task_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &'a TaskQuery) {
    builder.push(
        "EXISTS (SELECT 1 FROM task_employees te \
         JOIN employees e ON e.id = te.employee_id \
         WHERE te.task_id = t.id AND e.email = ",
    );
    builder.push_bind(query.email.as_str());
    builder.push(")");

    if let Some(title) = query.title.as_deref() {
        builder.push(" AND lower(t.title) LIKE '%' || lower(");
        builder.push_bind(title);
        builder.push(") || '%'");
    }
    if let Some(completed) = query.completed {
        builder.push(" AND t.completed = ");
        builder.push_bind(completed);
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND t.category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(date_from) = query.date_from {
        builder.push(" AND t.task_date >= ");
        builder.push_bind(date_from);
    }
    if let Some(date_to) = query.date_to {
        builder.push(" AND t.task_date <= ");
        builder.push_bind(date_to);
    }
}

/// Existence probe: does any task reference this category?
pub async fn category_has_tasks_in_db(pool: &SqlitePool, category_id: i64) -> Result<bool> {
    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE category_id = ?)")
            .bind(category_id)
            .fetch_one(pool)
            .await
            .context("Failed to probe category for tasks")?;

    Ok(exists != 0)
}

pub async fn tasks_by_category_in_db(pool: &SqlitePool, category_id: i64) -> Result<Vec<Task>> {
    sqlx::query_as("SELECT * FROM tasks WHERE category_id = ? ORDER BY id ASC")
        .bind(category_id)
        .fetch_all(pool)
        .await
        .context("Failed to retrieve tasks by category from DB")
}

pub async fn category_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    sqlx::query_as("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve category by id from DB")
}

pub async fn create_category_in_db(pool: &SqlitePool, name: &str) -> Result<Category> {
    let id = sqlx::query("INSERT INTO categories (name, uncompleted_count) VALUES (?, 0)")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to insert category into DB")?
        .last_insert_rowid();

    Ok(Category {
        id,
        name: name.to_string(),
        uncompleted_count: 0,
    })
}

pub async fn employee_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Employee>> {
    sqlx::query_as("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve employee by id from DB")
}

pub async fn create_employee_in_db(pool: &SqlitePool, login: &str, email: &str) -> Result<Employee> {
    let id = sqlx::query("INSERT INTO employees (login, email) VALUES (?, ?)")
        .bind(login)
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to insert employee into DB")?
        .last_insert_rowid();

    Ok(Employee {
        id,
        login: login.to_string(),
        email: email.to_string(),
    })
}

/// Assigns an employee to a task. Assigning twice is not an error.
pub async fn assign_employee_in_db(pool: &SqlitePool, task_id: i64, employee_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO task_employees (task_id, employee_id) VALUES (?, ?)")
        .bind(task_id)
        .bind(employee_id)
        .execute(pool)
        .await
        .context("Failed to assign employee to task")?;

    Ok(())
}
