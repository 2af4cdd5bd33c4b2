use std::cmp::Ordering;

use super::builder::MatrixData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    TotalAsc,
    TotalDesc,
    FinalAsc,
    FinalDesc,
}

impl SortKey {
    /// Next key after clicking the total-failure header.
    pub fn toggle_total(self) -> Self {
        match self {
            SortKey::TotalDesc => SortKey::TotalAsc,
            _ => SortKey::TotalDesc,
        }
    }

    /// Next key after clicking the final-failure header.
    pub fn toggle_final(self) -> Self {
        match self {
            SortKey::FinalDesc => SortKey::FinalAsc,
            _ => SortKey::FinalDesc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::TotalAsc => "total-asc",
            SortKey::TotalDesc => "total-desc",
            SortKey::FinalAsc => "final-asc",
            SortKey::FinalDesc => "final-desc",
        }
    }

    /// Parse the persisted form. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SortKey::None),
            "total-asc" => Some(SortKey::TotalAsc),
            "total-desc" => Some(SortKey::TotalDesc),
            "final-asc" => Some(SortKey::FinalAsc),
            "final-desc" => Some(SortKey::FinalDesc),
            _ => None,
        }
    }

    /// Header arrow for the total column, if it is the active sort.
    pub fn total_arrow(self) -> &'static str {
        match self {
            SortKey::TotalAsc => "▲",
            SortKey::TotalDesc => "▼",
            _ => "",
        }
    }

    pub fn final_arrow(self) -> &'static str {
        match self {
            SortKey::FinalAsc => "▲",
            SortKey::FinalDesc => "▼",
            _ => "",
        }
    }
}

/// Reorder rows by `key`, moving every column's cells along with them.
///
/// Ties fall back to graph order, so the result depends only on the key and
/// the data, never on the previous order.
pub fn sort_rows(data: &mut MatrixData, key: SortKey) {
    let mut order: Vec<usize> = (0..data.rows.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&data.rows[a], &data.rows[b]);
        let primary = match key {
            SortKey::None => Ordering::Equal,
            SortKey::TotalAsc => ra.total_failure_percent.cmp(&rb.total_failure_percent),
            SortKey::TotalDesc => rb.total_failure_percent.cmp(&ra.total_failure_percent),
            SortKey::FinalAsc => ra.final_failure_percent.cmp(&rb.final_failure_percent),
            SortKey::FinalDesc => rb.final_failure_percent.cmp(&ra.final_failure_percent),
        };
        primary.then(ra.graph_index.cmp(&rb.graph_index))
    });

    if order.iter().enumerate().all(|(pos, &idx)| pos == idx) {
        return;
    }
    data.rows = permute(&data.rows, &order);
    for column in &mut data.columns {
        column.steps = permute(&column.steps, &order);
    }
}

fn permute<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().filter_map(|&i| items.get(i).cloned()).collect()
}
