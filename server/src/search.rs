// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::service::ServiceError;
use chrono::{NaiveDate, NaiveDateTime};
use common::TaskSearchCriteria;

/// Sort column used when the caller supplies none.
pub const SORT_COLUMN_DEFAULT: SortColumn = SortColumn::Id;

/// Fixed secondary sort key. Rows tied on the primary column keep a stable
/// relative order across repeated queries; without it, ties may reorder
/// nondeterministically between calls.
pub const SORT_TIEBREAK: SortKey = SortKey {
    column: SortColumn::Title,
    direction: SortDirection::Asc,
};

/// Page the search starts from. 0 is the first page.
pub const PAGE_NUMBER_DEFAULT: u32 = 0;

/// How many elements a page contains when the caller does not say.
pub const PAGE_SIZE_DEFAULT: u32 = 5;

/// Columns a caller may sort by. The name-to-column mapping is a fixed
/// allow-list; caller-supplied strings never reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Completed,
    TaskDate,
    CategoryId,
}

impl SortColumn {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "completed" => Some(Self::Completed),
            "task_date" => Some(Self::TaskDate),
            "category_id" => Some(Self::CategoryId),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "t.id",
            Self::Title => "t.title",
            Self::Completed => "t.completed",
            Self::TaskDate => "t.task_date",
            Self::CategoryId => "t.category_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Canonical search request: normalized filters, resolved ordering and the
/// page window, ready for the query composer in `database.rs`.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub email: String,
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub category_id: Option<i64>,
    pub date_from: Option<NaiveDateTime>,
    pub date_to: Option<NaiveDateTime>,
    pub order: Vec<SortKey>,
    pub page_number: u32,
    pub page_size: u32,
}

/// Turns raw criteria into a canonical `TaskQuery`.
///
/// The caller has already validated the mandatory owner email. Everything
/// else degrades to "no filter" rather than erroring: an empty title is
/// absent, a completed flag other than 0/1 is absent, a page size of 0
/// falls back to the default. Only an unknown sort column is rejected.
pub fn compose(email: &str, criteria: &TaskSearchCriteria) -> Result<TaskQuery, ServiceError> {
    let order = resolve_ordering(
        criteria.sort_column.as_deref(),
        criteria.sort_direction.as_deref(),
    )?;

    Ok(TaskQuery {
        email: email.to_string(),
        title: criteria.title.clone().filter(|t| !t.is_empty()),
        completed: match criteria.completed {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        category_id: criteria.category_id,
        date_from: criteria.date_from.map(start_of_day),
        date_to: criteria.date_to.map(end_of_day),
        order,
        page_number: criteria.page_number.unwrap_or(PAGE_NUMBER_DEFAULT),
        page_size: criteria
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(PAGE_SIZE_DEFAULT),
    })
}

// Callers pass calendar days without a time of day; the stored column is a
// datetime. Widening both ends makes the day range behave as a closed
// interval. The lower bound is 00:00:01.001, not true midnight.
fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli_opt(0, 0, 1, 1).expect("in-range time of day")
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .expect("in-range time of day")
}

/// Resolves the requested sort into a deterministic ordering: the primary
/// key followed by the fixed `(title, asc)` tie-break. When the caller
/// sorts by title itself, the ordering collapses to that single key.
///
/// The direction is ascending unless the caller says otherwise: absent,
/// empty or a case-insensitive "asc" all mean ascending.
pub fn resolve_ordering(
    column: Option<&str>,
    direction: Option<&str>,
) -> Result<Vec<SortKey>, ServiceError> {
    let column = match column {
        None | Some("") => SORT_COLUMN_DEFAULT,
        Some(name) => SortColumn::parse(name)
            .ok_or_else(|| ServiceError::Validation(format!("unknown sort column: {name}")))?,
    };

    let direction = match direction {
        None => SortDirection::Asc,
        Some(d) if d.trim().is_empty() || d.trim().eq_ignore_ascii_case("asc") => {
            SortDirection::Asc
        }
        Some(_) => SortDirection::Desc,
    };

    let mut order = vec![SortKey { column, direction }];
    if column != SORT_TIEBREAK.column {
        order.push(SORT_TIEBREAK);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> TaskSearchCriteria {
        TaskSearchCriteria {
            email: Some("a@b.com".to_string()),
            ..TaskSearchCriteria::default()
        }
    }

    #[test]
    fn empty_optional_fields_mean_no_filter() {
        let query = compose("a@b.com", &criteria()).unwrap();

        assert_eq!(query.title, None);
        assert_eq!(query.completed, None);
        assert_eq!(query.category_id, None);
        assert_eq!(query.date_from, None);
        assert_eq!(query.date_to, None);
        assert_eq!(query.page_number, PAGE_NUMBER_DEFAULT);
        assert_eq!(query.page_size, PAGE_SIZE_DEFAULT);
    }

    #[test]
    fn empty_title_is_treated_as_absent() {
        let mut c = criteria();
        c.title = Some(String::new());

        let query = compose("a@b.com", &c).unwrap();
        assert_eq!(query.title, None);
    }

    #[test]
    fn completed_flag_accepts_only_zero_and_one() {
        let mut c = criteria();

        c.completed = Some(1);
        assert_eq!(compose("a@b.com", &c).unwrap().completed, Some(true));

        c.completed = Some(0);
        assert_eq!(compose("a@b.com", &c).unwrap().completed, Some(false));

        c.completed = Some(7);
        assert_eq!(compose("a@b.com", &c).unwrap().completed, None);
    }

    #[test]
    fn dates_widen_to_day_bounds() {
        let mut c = criteria();
        c.date_from = Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        c.date_to = Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let query = compose("a@b.com", &c).unwrap();
        assert_eq!(
            query.date_from.unwrap().to_string(),
            "2024-01-01 00:00:01.001"
        );
        assert_eq!(
            query.date_to.unwrap().to_string(),
            "2024-01-31 23:59:59.999"
        );
    }

    #[test]
    fn zero_page_size_falls_back_to_default() {
        let mut c = criteria();
        c.page_size = Some(0);

        assert_eq!(compose("a@b.com", &c).unwrap().page_size, PAGE_SIZE_DEFAULT);
    }

    #[test]
    fn ordering_defaults_to_id_asc_with_title_tiebreak() {
        let order = resolve_ordering(None, None).unwrap();

        assert_eq!(
            order,
            vec![
                SortKey {
                    column: SortColumn::Id,
                    direction: SortDirection::Asc
                },
                SORT_TIEBREAK,
            ]
        );
    }

    #[test]
    fn anything_but_asc_sorts_descending() {
        let order = resolve_ordering(Some("task_date"), Some("DESC")).unwrap();
        assert_eq!(order[0].direction, SortDirection::Desc);

        let order = resolve_ordering(Some("task_date"), Some("sideways")).unwrap();
        assert_eq!(order[0].direction, SortDirection::Desc);

        let order = resolve_ordering(Some("task_date"), Some(" ASC ")).unwrap();
        assert_eq!(order[0].direction, SortDirection::Asc);
    }

    #[test]
    fn sorting_by_title_collapses_to_a_single_key() {
        let order = resolve_ordering(Some("title"), Some("desc")).unwrap();

        assert_eq!(order.len(), 1);
        assert_eq!(order[0].column, SortColumn::Title);
        assert_eq!(order[0].direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let err = resolve_ordering(Some("priority; DROP TABLE tasks"), None).unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
