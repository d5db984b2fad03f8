use crate::calc::date_range::month_name;
use crate::calc::reconcile;
use crate::calc::snapshot::{capture_cells, CellTexts};
use crate::data::{CellKey, FileStore, LeaveStore, LeavesDataset, Roster};
use anyhow::Result;
use chrono::{Datelike, Local};

pub fn run(year: i32, employee: Option<&str>) -> Result<()> {
    let store = FileStore::new(crate::data::persistence::get_data_dir()?);
    let roster = store.load_roster().unwrap_or_else(|_| Roster::fallback());
    let data = match store.load_leaves()? {
        Some(doc) => reconcile(doc, Local::now().year()).0,
        None => LeavesDataset::default(),
    };
    let employees: Vec<String> = match employee {
        Some(name) => vec![name.to_string()],
        None => roster.names,
    };
    write_leaves(&data, &employees, year, &mut std::io::stdout())
}

pub(crate) fn write_leaves<W: std::io::Write>(
    data: &LeavesDataset,
    employees: &[String],
    year: i32,
    out: &mut W,
) -> Result<()> {
    let cells: CellTexts = capture_cells(data, employees, year);
    writeln!(out, "Leaves {year}")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<24} {:<10} {}", "Employee", "Month", "Days")?;
    let mut total_days = 0;
    let mut on_leave = 0;
    for employee in employees {
        let mut any = false;
        for month in 1..=12 {
            let key = CellKey::new(employee, month);
            let text = cells.get(&key.id()).map(String::as_str).unwrap_or("");
            if text.is_empty() {
                continue;
            }
            writeln!(out, "  {:<24} {:<10} {}", employee, month_name(month), text)?;
            total_days += data.day_count(employee, year, month);
            any = true;
        }
        if any {
            on_leave += 1;
        }
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {total_days} day(s) across {on_leave} employee(s)")?;
    Ok(())
}
