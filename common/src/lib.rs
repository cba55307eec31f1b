// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Represents a task within the system.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from JSON.
/// - `sqlx::FromRow`: Allows `sqlx` to create a `Task` instance directly
///   from a database result row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    pub title: String,

    pub completed: bool,

    // The column is datetime-typed even though search criteria arrive as
    // calendar days; the search layer widens a day to datetime bounds.
    pub task_date: Option<NaiveDateTime>,

    // Many tasks may reference one category.
    pub category_id: Option<i64>,
}

/// A category of tasks. `uncompleted_count` is a denormalized count of the
/// tasks under this category with `completed = false`, maintained eagerly
/// by the task mutation path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub uncompleted_count: i64,
}

/// An employee tasks can be assigned to. `login` and `email` are both
/// unique and both usable to scope a task search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub login: String,
    pub email: String,
}

/// Structure used to receive task data from the API, for both create and
/// update. It's a good practice to separate database models (`Task`)
/// from API models, as they may have different fields.
/// `id` must be absent on create and present (nonzero) on update.
#[derive(Deserialize, Debug, Clone)]
pub struct TaskPayload {
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub task_date: Option<NaiveDateTime>,
    pub category_id: Option<i64>,
}

/// Raw search criteria as received from the caller. Every field except the
/// owner email may be absent; absent or degenerate fields mean "no filter".
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskSearchCriteria {
    /// Mandatory: every search is scoped to one owner's tasks.
    pub email: Option<String>,
    pub title: Option<String>,
    /// 1 means completed, 0 means uncompleted, anything else is no filter.
    pub completed: Option<i64>,
    pub category_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_column: Option<String>,
    pub sort_direction: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

/// Body of the title-within-one-owner search. The title is optional; the
/// email is validated by the service.
#[derive(Deserialize, Debug)]
pub struct EmailTitleQuery {
    pub email: Option<String>,
    pub title: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateCategoryPayload {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateEmployeePayload {
    pub login: String,
    pub email: String,
}

/// One window of an ordered result set, plus the totals computed from the
/// same filter predicate as the window itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total_elements: i64,
    pub total_pages: u32,
    pub page_number: u32,
    pub page_size: u32,
}

/// A successful search payload. `note` is set when the query matched
/// nothing: an empty result is a success with an explanation, not an error.
#[derive(Serialize, Deserialize, Debug)]
pub struct SearchResult<T> {
    pub result: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
