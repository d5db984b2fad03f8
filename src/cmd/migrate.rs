use crate::calc::{reconcile, MigrationReport};
use crate::data::{FileStore, LeaveStore, LeavesDocument};
use anyhow::Result;
use std::io::Write;
use tracing::info;

/// Rewrites a leave document still holding per-month day strings into the
/// period-list format, placing legacy months in `anchor_year`.
pub fn run(anchor_year: i32) -> Result<()> {
    let store = FileStore::new(crate::data::persistence::get_data_dir()?);
    let mut out = std::io::stdout();
    match migrate_store(&store, anchor_year)? {
        Some(report) => write_report(&report, &mut out),
        None => {
            writeln!(out, "No leave document found.")?;
            Ok(())
        }
    }
}

/// Reconciles the stored document and writes it back if anything changed.
/// Returns `None` when there is no document.
pub(crate) fn migrate_store(
    store: &dyn LeaveStore,
    anchor_year: i32,
) -> Result<Option<MigrationReport>> {
    let Some(doc) = store.load_leaves()? else {
        return Ok(None);
    };
    let (data, report) = reconcile(doc, anchor_year);
    if report.needs_save() {
        store.save_leaves(&LeavesDocument::from(&data))?;
        info!(count = report.migrated.len(), "saved migrated leave document");
    }
    Ok(Some(report))
}

pub(crate) fn write_report<W: Write>(report: &MigrationReport, out: &mut W) -> Result<()> {
    if !report.needs_save() {
        writeln!(out, "Leave document is already up to date.")?;
    } else {
        writeln!(out, "Migrated {} employee(s):", report.migrated.len())?;
        for name in &report.migrated {
            writeln!(out, "  {name}")?;
        }
    }
    if !report.rejected.is_empty() {
        writeln!(out, "Dropped {} unreadable entries:", report.rejected.len())?;
        for r in &report.rejected {
            writeln!(out, "  {:<24} month {:<4} {}", r.employee, r.month_key, r.reason)?;
        }
    }
    Ok(())
}
