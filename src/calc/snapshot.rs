//! Point-in-time copies of the leave table, for undo and comparison.

use crate::calc::date_range;
use crate::data::{CellKey, LeavesDataset};
use std::collections::BTreeMap;

/// An owned copy of the whole dataset. It shares nothing with the live data,
/// so later edits never show through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    data: LeavesDataset,
}

impl Snapshot {
    pub fn capture(data: &LeavesDataset) -> Self {
        Snapshot { data: data.clone() }
    }

    /// A fresh live dataset equal to the captured one.
    pub fn restore(&self) -> LeavesDataset {
        self.data.clone()
    }

    /// True if the snapshot equals `data`.
    pub fn matches(&self, data: &LeavesDataset) -> bool {
        &self.data == data
    }
}

/// The text-per-cell view of a table: `employee-monthIndex` to the cell's
/// day tokens, one entry per roster cell.
pub type CellTexts = BTreeMap<String, String>;

pub fn capture_cells(data: &LeavesDataset, employees: &[String], year: i32) -> CellTexts {
    let mut cells = CellTexts::new();
    for employee in employees {
        for month in 1..=12 {
            let key = CellKey::new(employee, month);
            let text = date_range::format_days(data.cell_days(&key, year));
            cells.insert(key.id(), text);
        }
    }
    cells
}
