//! Date picker state: what the user has selected in the calendar modal, and
//! how a day click changes it.

use crate::calc::date_range::{add_months, to_periods};
use crate::data::{CellKey, LeavePeriod, LeavesDataset};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How day clicks build a selection.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PickStrategy {
    /// First click picks the start, second the end, third starts over.
    #[default]
    Pair,
    /// Each click adds or removes one day; an extending click fills a span.
    Toggle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Toggle {
        dates: BTreeSet<NaiveDate>,
        last_clicked: Option<NaiveDate>,
    },
    Pair {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl Selection {
    pub fn empty(strategy: PickStrategy) -> Self {
        match strategy {
            PickStrategy::Toggle => Selection::Toggle {
                dates: BTreeSet::new(),
                last_clicked: None,
            },
            PickStrategy::Pair => Selection::Pair { start: None, end: None },
        }
    }

    /// Applies a click on `date`. `extend` is the shift-click variant; it only
    /// matters to the toggle strategy, where it adds every day between the
    /// previous click and `date` without removing any.
    pub fn click(&mut self, date: NaiveDate, extend: bool) {
        match self {
            Selection::Toggle { dates, last_clicked } => {
                match (*last_clicked, extend) {
                    (Some(anchor), true) => {
                        dates.extend(LeavePeriod::new(anchor, date).days());
                    }
                    _ => {
                        if !dates.remove(&date) {
                            dates.insert(date);
                        }
                    }
                }
                *last_clicked = Some(date);
            }
            Selection::Pair { start, end } => match (*start, *end) {
                (Some(s), None) => {
                    if date < s {
                        *start = Some(date);
                        *end = Some(s);
                    } else {
                        *end = Some(date);
                    }
                }
                _ => {
                    *start = Some(date);
                    *end = None;
                }
            },
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Selection::Toggle { dates, .. } => dates.contains(&date),
            Selection::Pair { start: Some(s), end: Some(e) } => date >= *s && date <= *e,
            Selection::Pair { start: Some(s), end: None } => date == *s,
            Selection::Pair { start: None, .. } => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Toggle { dates, .. } => dates.is_empty(),
            Selection::Pair { start, .. } => start.is_none(),
        }
    }

    /// How a selected day joins its neighbours, or `None` if not selected.
    pub fn day_mark(&self, date: NaiveDate) -> Option<DayMark> {
        if !self.contains(date) {
            return None;
        }
        let prev = date.pred_opt().is_some_and(|d| self.contains(d));
        let next = date.succ_opt().is_some_and(|d| self.contains(d));
        Some(match (prev, next) {
            (false, false) => DayMark::Single,
            (false, true) => DayMark::Start,
            (true, true) => DayMark::Middle,
            (true, false) => DayMark::End,
        })
    }
}

/// Position of a selected day inside its run of selected days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayMark {
    Single,
    Start,
    Middle,
    End,
}

impl DayMark {
    pub fn is_start(self) -> bool {
        matches!(self, DayMark::Single | DayMark::Start)
    }

    pub fn is_end(self) -> bool {
        matches!(self, DayMark::Single | DayMark::End)
    }
}

/// What a confirmed selection does to the dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Commit {
    Append {
        employee: String,
        period: LeavePeriod,
    },
    ReplaceMonth {
        cell: CellKey,
        year: i32,
        periods: Vec<LeavePeriod>,
    },
}

impl Commit {
    pub fn apply(self, data: &mut LeavesDataset) {
        match self {
            Commit::Append { employee, period } => data.add_period(&employee, period),
            Commit::ReplaceMonth { cell, year, periods } => {
                data.replace_month(&cell.employee, year, cell.month, periods)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenPicker {
    pub cell: CellKey,
    /// Year of the table the picker was opened from.
    pub year: i32,
    /// First day of the visible month.
    pub view: NaiveDate,
    /// Keyboard focus inside the visible month.
    pub cursor: NaiveDate,
    pub selection: Selection,
}

impl OpenPicker {
    fn set_view(&mut self, view: NaiveDate) {
        self.view = view.with_day(1).unwrap_or(view);
    }

    /// Moves the keyboard cursor by `days`, following it into other months.
    pub fn move_cursor(&mut self, days: i64) {
        if let Some(d) = self.cursor.checked_add_signed(chrono::Duration::days(days)) {
            self.cursor = d;
            self.set_view(d);
        }
    }

    pub fn prev_month(&mut self) {
        self.cursor = add_months(self.cursor, -1);
        self.set_view(self.cursor);
    }

    pub fn next_month(&mut self) {
        self.cursor = add_months(self.cursor, 1);
        self.set_view(self.cursor);
    }

    pub fn today(&mut self, today: NaiveDate) {
        self.cursor = today;
        self.set_view(today);
    }

    pub fn click(&mut self, extend: bool) {
        self.selection.click(self.cursor, extend);
    }

    /// The visible month as weeks of Monday-first day slots.
    pub fn weeks(&self) -> Vec<[Option<NaiveDate>; 7]> {
        month_weeks(self.view.year(), self.view.month())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Picker {
    #[default]
    Closed,
    Open(OpenPicker),
}

impl Picker {
    /// Opens the picker on `cell`. The toggle strategy starts from the cell's
    /// current leave days; the pair strategy starts empty.
    pub fn open(
        &mut self,
        cell: CellKey,
        year: i32,
        strategy: PickStrategy,
        data: &LeavesDataset,
    ) {
        let selection = match strategy {
            PickStrategy::Toggle => Selection::Toggle {
                dates: data.dates_in_month(&cell.employee, year, cell.month),
                last_clicked: None,
            },
            PickStrategy::Pair => Selection::empty(strategy),
        };
        let view = NaiveDate::from_ymd_opt(year, cell.month, 1)
            .unwrap_or(NaiveDate::MIN);
        *self = Picker::Open(OpenPicker {
            cell,
            year,
            view,
            cursor: view,
            selection,
        });
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Picker::Open(_))
    }

    pub fn as_open(&self) -> Option<&OpenPicker> {
        match self {
            Picker::Open(p) => Some(p),
            Picker::Closed => None,
        }
    }

    pub fn as_open_mut(&mut self) -> Option<&mut OpenPicker> {
        match self {
            Picker::Open(p) => Some(p),
            Picker::Closed => None,
        }
    }

    /// Discards the pending selection.
    pub fn cancel(&mut self) {
        *self = Picker::Closed;
    }

    /// Closes the picker and turns the pending selection into a dataset
    /// change. An empty pair selection produces nothing.
    pub fn confirm(&mut self) -> Option<Commit> {
        let Picker::Open(open) = std::mem::take(self) else {
            return None;
        };
        match open.selection {
            Selection::Pair { start: Some(s), end } => Some(Commit::Append {
                employee: open.cell.employee,
                period: LeavePeriod::new(s, end.unwrap_or(s)),
            }),
            Selection::Pair { start: None, .. } => None,
            Selection::Toggle { dates, .. } => Some(Commit::ReplaceMonth {
                periods: to_periods(&dates),
                cell: open.cell,
                year: open.year,
            }),
        }
    }
}

/// Splits a month into Monday-first weeks; slots outside the month are `None`.
pub fn month_weeks(year: i32, month: u32) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut col = first.weekday().num_days_from_monday() as usize;
    for day in first.iter_days().take_while(|d| d.month() == month) {
        week[col] = Some(day);
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    weeks
}
