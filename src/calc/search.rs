use crate::calc::snapshot::CellTexts;
use crate::data::CellKey;
use std::collections::BTreeSet;

/// Result of a free-text search over the table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchHits {
    /// Employees whose name matches or who have a matching cell.
    pub rows: BTreeSet<String>,
    /// Cells whose day text matches.
    pub cells: BTreeSet<CellKey>,
}

/// Matches `query` case-insensitively against employee names and cell texts.
/// An empty query matches every row and no cells.
pub fn search(employees: &[String], cells: &CellTexts, query: &str) -> SearchHits {
    let q = query.trim().to_lowercase();
    let mut hits = SearchHits::default();
    for employee in employees {
        if q.is_empty() || employee.to_lowercase().contains(&q) {
            hits.rows.insert(employee.clone());
        }
        if q.is_empty() {
            continue;
        }
        for month in 1..=12 {
            let key = CellKey::new(employee, month);
            let matched = cells
                .get(&key.id())
                .is_some_and(|text| text.to_lowercase().contains(&q));
            if matched {
                hits.rows.insert(employee.clone());
                hits.cells.insert(key);
            }
        }
    }
    hits
}
