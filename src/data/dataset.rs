use crate::calc::date_range::month_bounds;
use crate::data::leave_period::LeavePeriod;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `month` is 1-12.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub employee: String,
    pub month: u32,
}

impl CellKey {
    pub fn new(employee: &str, month: u32) -> Self {
        CellKey {
            employee: employee.to_string(),
            month,
        }
    }

    /// `employee-monthIndex`, zero-based month.
    pub fn id(&self) -> String {
        format!("{}-{}", self.employee, self.month.saturating_sub(1))
    }
}

// Periods keep insertion order and may overlap.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct LeavesDataset {
    employees: BTreeMap<String, Vec<LeavePeriod>>,
}

impl LeavesDataset {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.employees.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<LeavePeriod>)> {
        self.employees.iter()
    }

    pub fn periods(&self, employee: &str) -> &[LeavePeriod] {
        self.employees
            .get(employee)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_periods(&mut self, employee: &str, periods: Vec<LeavePeriod>) {
        self.employees.insert(employee.to_string(), periods);
    }

    pub fn add_period(&mut self, employee: &str, period: LeavePeriod) {
        self.employees
            .entry(employee.to_string())
            .or_default()
            .push(period);
    }

    pub fn dates_in_month(&self, employee: &str, year: i32, month: u32) -> BTreeSet<NaiveDate> {
        let Some((first, last)) = month_bounds(year, month) else {
            return BTreeSet::new();
        };
        self.periods(employee)
            .iter()
            .filter(|p| p.overlaps_month(year, month))
            .flat_map(|p| {
                let start = p.start_date.max(first);
                let end = p.end_date.min(last);
                LeavePeriod::new(start, end).days().collect::<Vec<_>>()
            })
            .collect()
    }

    /// Periods crossing the month boundary keep their days outside the month.
    pub fn clear_month(&mut self, employee: &str, year: i32, month: u32) -> bool {
        let Some((first, last)) = month_bounds(year, month) else {
            return false;
        };
        let Some(periods) = self.employees.get_mut(employee) else {
            return false;
        };
        let before = periods.len();
        let mut changed = false;
        let mut kept = Vec::with_capacity(before);
        for p in periods.drain(..) {
            if !p.overlaps_month(year, month) {
                kept.push(p);
                continue;
            }
            changed = true;
            if p.start_date < first {
                if let Some(prev) = first.pred_opt() {
                    kept.push(LeavePeriod::new(p.start_date, prev));
                }
            }
            if p.end_date > last {
                if let Some(next) = last.succ_opt() {
                    kept.push(LeavePeriod::new(next, p.end_date));
                }
            }
        }
        *periods = kept;
        changed
    }

    pub fn replace_month(&mut self, employee: &str, year: i32, month: u32, periods: Vec<LeavePeriod>) {
        self.clear_month(employee, year, month);
        for p in periods {
            self.add_period(employee, p);
        }
    }

    pub fn day_count(&self, employee: &str, year: i32, month: u32) -> usize {
        self.dates_in_month(employee, year, month).len()
    }

    pub fn cell_days(&self, key: &CellKey, year: i32) -> BTreeSet<u32> {
        self.dates_in_month(&key.employee, year, key.month)
            .into_iter()
            .map(|d| d.day())
            .collect()
    }
}
