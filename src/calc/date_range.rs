//! Day-range text encoding of leave days and conversion to leave periods.
//!
//! A cell's text is a comma-separated list of day tokens scoped to one month:
//! `3, 5-7, 10`. A token is either a single day number or an inclusive
//! `start-end` range.

use crate::data::LeavePeriod;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use thiserror::Error;

/// Highest day number any month can have. Larger numbers are malformed.
const MAX_DAY: u32 = 31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("day range {start}-{end} ends before it starts")]
    ReversedRange { start: u32, end: u32 },
}

enum Token {
    Day(u32),
    Range(u32, u32),
}

fn parse_day(s: &str) -> Option<u32> {
    let n: u32 = s.trim().parse().ok()?;
    (1..=MAX_DAY).contains(&n).then_some(n)
}

fn parse_token(token: &str) -> Option<Token> {
    if token.is_empty() {
        return None;
    }
    match token.split_once('-') {
        Some((a, b)) => Some(Token::Range(parse_day(a)?, parse_day(b)?)),
        None => parse_day(token).map(Token::Day),
    }
}

/// Parses day tokens into a set of day numbers. Malformed tokens are skipped;
/// a range whose end precedes its start is rejected.
pub fn parse_days(text: &str) -> Result<BTreeSet<u32>, DateRangeError> {
    let mut days = BTreeSet::new();
    for token in text.split(',').map(str::trim) {
        match parse_token(token) {
            Some(Token::Day(d)) => {
                days.insert(d);
            }
            Some(Token::Range(start, end)) => {
                if end < start {
                    return Err(DateRangeError::ReversedRange { start, end });
                }
                days.extend(start..=end);
            }
            None => {}
        }
    }
    Ok(days)
}

/// Parses day tokens into calendar dates of `month` (1-12) in `year`.
/// Day numbers that do not exist in that month are dropped.
pub fn parse(text: &str, year: i32, month: u32) -> Result<BTreeSet<NaiveDate>, DateRangeError> {
    Ok(parse_days(text)?
        .into_iter()
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .collect())
}

/// Renders day numbers as sorted tokens, merging consecutive days into
/// `start-end` ranges: `{3, 5, 6, 7, 10}` becomes `3, 5-7, 10`.
pub fn format_days<I: IntoIterator<Item = u32>>(days: I) -> String {
    let sorted: BTreeSet<u32> = days.into_iter().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut run: Option<(u32, u32)> = None;
    for day in sorted {
        run = match run {
            Some((start, end)) if day == end + 1 => Some((start, day)),
            Some(done) => {
                tokens.push(format_run(done));
                Some((day, day))
            }
            None => Some((day, day)),
        };
    }
    if let Some(done) = run {
        tokens.push(format_run(done));
    }
    tokens.join(", ")
}

fn format_run((start, end): (u32, u32)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Formats the day numbers of `dates`. All dates are expected to share one
/// month; only the day component is rendered.
pub fn format(dates: &BTreeSet<NaiveDate>) -> String {
    format_days(dates.iter().map(|d| d.day()))
}

/// Collapses runs of consecutive calendar days into leave periods, in date
/// order. Runs may cross month and year boundaries.
pub fn to_periods(dates: &BTreeSet<NaiveDate>) -> Vec<LeavePeriod> {
    let mut periods: Vec<LeavePeriod> = Vec::new();
    for &date in dates {
        match periods.last_mut() {
            Some(last) if last.end_date.succ_opt() == Some(date) => last.end_date = date,
            _ => periods.push(LeavePeriod::single(date)),
        }
    }
    periods
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Short column label for the leave table header.
pub fn month_abbrev(month: u32) -> &'static str {
    month_name(month).get(..3).unwrap_or("???")
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month_bounds(year, month) {
        Some((_, last)) => last.day(),
        None => 0,
    }
}

/// First and last date of `month` in `year`, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

/// Moves `date` by whole months, clamping the day to the target month's end.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.month() as i32 - 1 + months;
    let new_month = (total.rem_euclid(12) + 1) as u32;
    let new_year = date.year() + total.div_euclid(12);
    let new_day = date.day().min(days_in_month(new_year, new_month));
    NaiveDate::from_ymd_opt(new_year, new_month, new_day).unwrap_or(date)
}
