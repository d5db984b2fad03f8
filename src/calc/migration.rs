//! Turns a stored leave document into the live dataset, rewriting employees
//! still stored in the per-month day-string format.

use crate::calc::date_range;
use crate::data::{EmployeeRecord, LeavePeriod, LeavesDataset, LeavesDocument};
use tracing::{info, warn};

/// A legacy month string that could not be converted and was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMonth {
    pub employee: String,
    pub month_key: String,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Employees whose entry was rewritten from the legacy shape.
    pub migrated: Vec<String>,
    pub rejected: Vec<RejectedMonth>,
}

impl MigrationReport {
    /// True when the stored document is stale and should be written back.
    pub fn needs_save(&self) -> bool {
        !self.migrated.is_empty()
    }
}

/// Builds the dataset from `doc`. Legacy month strings are anchored to
/// `anchor_year` and collapsed into periods. Period lists pass through, except
/// that a period stored end-before-start is put back in order; reconciling an
/// already-migrated document changes nothing.
pub fn reconcile(doc: LeavesDocument, anchor_year: i32) -> (LeavesDataset, MigrationReport) {
    let mut data = LeavesDataset::default();
    let mut report = MigrationReport::default();
    for (employee, record) in doc.leaves_data {
        match record {
            EmployeeRecord::Periods(periods) => {
                let reversed = periods.iter().filter(|p| p.end_date < p.start_date).count();
                if reversed == 0 {
                    data.set_periods(&employee, periods);
                    continue;
                }
                warn!(%employee, reversed, "reordering leave periods stored end before start");
                let periods = periods
                    .into_iter()
                    .map(|p| LeavePeriod::new(p.start_date, p.end_date))
                    .collect();
                data.set_periods(&employee, periods);
                report.migrated.push(employee);
            }
            EmployeeRecord::Missing => {
                data.set_periods(&employee, Vec::new());
                report.migrated.push(employee);
            }
            EmployeeRecord::LegacyMonths(months) => {
                let mut keyed: Vec<(u32, String, String)> = Vec::new();
                for (key, text) in months {
                    match key.trim().parse::<u32>() {
                        Ok(index) if index < 12 => keyed.push((index, key, text)),
                        _ => {
                            warn!(%employee, month = %key, "dropping legacy leave text: bad month key");
                            report.rejected.push(RejectedMonth {
                                employee: employee.clone(),
                                month_key: key,
                                reason: "not a month index".to_string(),
                            });
                        }
                    }
                }
                keyed.sort_by_key(|(index, _, _)| *index);

                let mut periods = Vec::new();
                for (index, key, text) in keyed {
                    match date_range::parse(&text, anchor_year, index + 1) {
                        Ok(dates) => periods.extend(date_range::to_periods(&dates)),
                        Err(e) => {
                            warn!(%employee, month = %key, "dropping legacy leave text: {e}");
                            report.rejected.push(RejectedMonth {
                                employee: employee.clone(),
                                month_key: key,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                data.set_periods(&employee, periods);
                report.migrated.push(employee);
            }
        }
    }
    if report.needs_save() {
        info!(count = report.migrated.len(), "migrated legacy leave entries");
    }
    (data, report)
}
