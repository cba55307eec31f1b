// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

/// Signed adjustment to one category's uncompleted-task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDelta {
    pub category_id: i64,
    pub delta: i64,
}

/// The slice of task state the counter cares about: the completion flag and
/// the owning category.
pub type CounterState = (bool, Option<i64>);

/// Computes the per-category count adjustments for one task transition.
///
/// A task contributes one unit to its category's uncompleted count iff it
/// is uncompleted and categorized. Diffing the old and new contributions
/// covers every transition with a single rule: completing a task
/// decrements, un-completing increments, an unchanged flag is a no-op, and
/// a move between categories carries the unit along. `None` on either side
/// models creation and deletion.
pub fn category_deltas(old: Option<CounterState>, new: Option<CounterState>) -> Vec<CategoryDelta> {
    let mut deltas: Vec<CategoryDelta> = Vec::new();

    let mut add = |category_id: Option<i64>, delta: i64| {
        let Some(category_id) = category_id else {
            return;
        };
        match deltas.iter_mut().find(|d| d.category_id == category_id) {
            Some(existing) => existing.delta += delta,
            None => deltas.push(CategoryDelta { category_id, delta }),
        }
    };

    if let Some((completed, category_id)) = old {
        if !completed {
            add(category_id, -1);
        }
    }
    if let Some((completed, category_id)) = new {
        if !completed {
            add(category_id, 1);
        }
    }

    deltas.retain(|d| d.delta != 0);
    deltas
}
