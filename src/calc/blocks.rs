//! Projects leave periods onto month cells as proportional horizontal bars.

use crate::calc::date_range::days_in_month;
use crate::data::{CellKey, LeavePeriod, LeavesDataset};
use chrono::Datelike;
use std::collections::BTreeMap;

/// One bar inside one month cell. `left_pct` and `width_pct` are percentages
/// of the cell width; the label always names the whole period.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaveBlock {
    pub year: i32,
    pub month: u32,
    pub day_start: u32,
    pub day_end: u32,
    pub left_pct: f64,
    pub width_pct: f64,
    pub label: String,
}

impl LeaveBlock {
    /// Converts the bar to character columns of a cell `width` wide.
    /// Every bar occupies at least one column.
    pub fn columns(&self, width: u16) -> (u16, u16) {
        if width == 0 {
            return (0, 0);
        }
        let w = f64::from(width);
        let start = ((self.left_pct / 100.0) * w).floor() as u16;
        let end = (((self.left_pct + self.width_pct) / 100.0) * w).ceil() as u16;
        let start = start.min(width - 1);
        let end = end.clamp(start + 1, width);
        (start, end - start)
    }
}

/// Splits one period into a bar per month it touches.
pub fn period_blocks(period: &LeavePeriod) -> Vec<LeaveBlock> {
    let label = period.label();
    let first = (period.start_date.year(), period.start_date.month());
    let last = (period.end_date.year(), period.end_date.month());
    let mut blocks = Vec::new();
    let (mut year, mut month) = first;
    while (year, month) <= last {
        let dim = days_in_month(year, month);
        let day_start = if (year, month) == first { period.start_date.day() } else { 1 };
        let day_end = if (year, month) == last { period.end_date.day() } else { dim };
        let dim_f = f64::from(dim);
        blocks.push(LeaveBlock {
            year,
            month,
            day_start,
            day_end,
            left_pct: f64::from(day_start - 1) / dim_f * 100.0,
            width_pct: f64::from(day_end - day_start + 1) / dim_f * 100.0,
            label: label.clone(),
        });
        (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    }
    blocks
}

/// Rebuilds every bar of the table for `year`, keyed by cell. Bars keep the
/// order of the periods they come from.
pub fn render_blocks(data: &LeavesDataset, year: i32) -> BTreeMap<CellKey, Vec<LeaveBlock>> {
    let mut cells: BTreeMap<CellKey, Vec<LeaveBlock>> = BTreeMap::new();
    for (employee, periods) in data.iter() {
        for period in periods {
            for block in period_blocks(period) {
                if block.year != year {
                    continue;
                }
                cells
                    .entry(CellKey::new(employee, block.month))
                    .or_default()
                    .push(block);
            }
        }
    }
    cells
}
