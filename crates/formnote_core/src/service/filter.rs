//! Column value filtering and row ordering.
//!
//! # Responsibility
//! - Count distinct column values into `FilterOption` candidates.
//! - Turn a user's checked options into a set of visible rows.
//! - Order rows by one column with type-aware comparison.
//!
//! # Invariants
//! - Candidate order: non-empty values by count desc, then value
//!   case-insensitively asc; the empty value always last.
//! - Nothing checked, everything checked, or a selection covering every
//!   column value all mean "no filter".

use crate::model::cell::{Cell, CellType};
use crate::model::column::SortOrder;
use crate::model::filter_option::FilterOption;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Effective value selection for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelection {
    /// Show every row.
    All,
    /// Show rows whose value is in the set (`""` is the empty value).
    Values(BTreeSet<String>),
}

impl FilterSelection {
    /// Derives the selection from checked candidates.
    pub fn from_options(options: &[FilterOption]) -> Self {
        let selected = options
            .iter()
            .filter(|option| option.checked)
            .map(|option| option.value().to_string())
            .collect::<BTreeSet<_>>();

        if selected.is_empty() || options.iter().all(|option| option.checked) {
            return Self::All;
        }
        Self::Values(selected)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Builds filter candidates for `column_index`, all initially checked.
pub fn build_value_counts(cells: &[Cell], column_index: u32) -> Vec<FilterOption> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for cell in cells.iter().filter(|cell| cell.col_index == column_index) {
        *counts.entry(cell.content.as_str()).or_insert(0) += 1;
    }

    let mut options = counts
        .into_iter()
        .map(|(value, count)| FilterOption::checked(value, count))
        .collect::<Vec<_>>();
    options.sort_by(compare_options);
    options
}

fn compare_options(a: &FilterOption, b: &FilterOption) -> Ordering {
    match (a.is_empty_value(), b.is_empty_value()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    b.count
        .cmp(&a.count)
        .then_with(|| compare_ignore_case(a.value(), b.value()))
        .then_with(|| a.value().cmp(b.value()))
}

/// Returns the rows left visible by `selection`, or `None` for no filter.
pub fn visible_rows(
    cells: &[Cell],
    column_index: u32,
    selection: &FilterSelection,
) -> Option<BTreeSet<u32>> {
    let FilterSelection::Values(selected) = selection else {
        return None;
    };
    if selected.is_empty() {
        return None;
    }

    let column_cells = cells
        .iter()
        .filter(|cell| cell.col_index == column_index)
        .collect::<Vec<_>>();
    if column_cells
        .iter()
        .all(|cell| selected.contains(cell.content.as_str()))
    {
        return None;
    }

    Some(
        column_cells
            .into_iter()
            .filter(|cell| selected.contains(cell.content.as_str()))
            .map(|cell| cell.row_index)
            .collect(),
    )
}

/// Every row index that holds at least one cell.
pub fn row_indices(cells: &[Cell]) -> BTreeSet<u32> {
    cells.iter().map(|cell| cell.row_index).collect()
}

/// Orders `rows` by the content of `column_index`.
///
/// `Number` columns compare numerically with unparsable values after all
/// numbers; other kinds compare case-insensitively. Rows without a cell in
/// the column sort as empty text. The sort is stable.
pub fn sort_rows(
    cells: &[Cell],
    column_index: u32,
    kind: CellType,
    order: SortOrder,
    rows: impl IntoIterator<Item = u32>,
) -> Vec<u32> {
    let contents = cells
        .iter()
        .filter(|cell| cell.col_index == column_index)
        .map(|cell| (cell.row_index, cell.content.as_str()))
        .collect::<BTreeMap<_, _>>();

    let mut rows = rows.into_iter().collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        let left = contents.get(a).copied().unwrap_or_default();
        let right = contents.get(b).copied().unwrap_or_default();
        let ordering = compare_contents(left, right, kind);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    rows
}

fn compare_contents(left: &str, right: &str, kind: CellType) -> Ordering {
    if kind == CellType::Number {
        let parse = |value: &str| value.trim().parse::<f64>().ok().filter(|n| n.is_finite());
        match (parse(left), parse(right)) {
            (Some(l), Some(r)) => return l.total_cmp(&r),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }
    }
    compare_ignore_case(left, right)
}

fn compare_ignore_case(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{compare_contents, FilterSelection};
    use crate::model::cell::CellType;
    use crate::model::filter_option::FilterOption;
    use std::cmp::Ordering;

    #[test]
    fn selection_with_nothing_checked_means_all() {
        let options = vec![
            FilterOption::new(Some("a"), 1, false),
            FilterOption::new(Some("b"), 1, false),
        ];
        assert!(FilterSelection::from_options(&options).is_all());
        assert!(FilterSelection::from_options(&[]).is_all());
    }

    #[test]
    fn selection_with_partial_check_lists_values() {
        let options = vec![
            FilterOption::new(Some("a"), 1, true),
            FilterOption::new(None, 2, true),
            FilterOption::new(Some("b"), 1, false),
        ];
        let FilterSelection::Values(values) = FilterSelection::from_options(&options) else {
            panic!("expected value selection");
        };
        assert!(values.contains("a"));
        assert!(values.contains(""));
        assert!(!values.contains("b"));
    }

    #[test]
    fn numeric_comparison_puts_text_after_numbers() {
        assert_eq!(compare_contents("10", "9", CellType::Number), Ordering::Greater);
        assert_eq!(compare_contents("abc", "9", CellType::Number), Ordering::Greater);
        assert_eq!(compare_contents("10", "9", CellType::Text), Ordering::Less);
    }
}
