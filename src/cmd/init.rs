use crate::data::{AppSettings, LeavesDocument, Persistable, Roster, RosterDocument};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;

const CONFIG_FILE: &str = "config.yaml";

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)?;
    run_in_dir(&dir)?;
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes the default data files into `dir`, keeping any that already exist.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    if !dir.join(CONFIG_FILE).exists() {
        AppSettings::default().save_to(dir)?;
        info!("wrote default {CONFIG_FILE}");
    }
    if !dir.join(RosterDocument::filename()).exists() {
        write_roster(dir)?;
    }
    if !dir.join(LeavesDocument::filename()).exists() {
        LeavesDocument::default().save_to(dir)?;
        info!("wrote empty {}", LeavesDocument::filename());
    }
    Ok(())
}

/// Seeds the roster with the placeholder names so there is something to rename.
fn write_roster(dir: &Path) -> Result<()> {
    let doc = RosterDocument::from_names(&Roster::fallback().names);
    doc.save_to(dir)?;
    info!("wrote placeholder roster.yaml");
    Ok(())
}
