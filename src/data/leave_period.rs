use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One continuous leave, inclusive on both ends.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct LeavePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl LeavePeriod {
    /// Dates may come in either order.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if b < a {
            LeavePeriod { start_date: b, end_date: a }
        } else {
            LeavePeriod { start_date: a, end_date: b }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        LeavePeriod { start_date: date, end_date: date }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    pub fn overlaps_month(&self, year: i32, month: u32) -> bool {
        let first = (self.start_date.year(), self.start_date.month());
        let last = (self.end_date.year(), self.end_date.month());
        first <= (year, month) && (year, month) <= last
    }

    /// Text shown on a rendered leave block, e.g. `30.1 - 2.2`.
    pub fn label(&self) -> String {
        format!(
            "{}.{} - {}.{}",
            self.start_date.day(),
            self.start_date.month(),
            self.end_date.day(),
            self.end_date.month()
        )
    }
}
