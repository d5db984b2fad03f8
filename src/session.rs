//! The editing session: live dataset, roster, undo history, active cell and
//! date picker, plus the load/save round-trips to the document store.

use crate::calc::date_range::{self, DateRangeError};
use crate::calc::search::{self, SearchHits};
use crate::calc::snapshot::{self, CellTexts};
use crate::calc::{reconcile, render_blocks, LeaveBlock, Picker, Snapshot, UndoManager};
use crate::data::{
    AppSettings, CellKey, LeaveStore, LeavesDataset, LeavesDocument, Notifier, Roster, Toast,
    ToastKind,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

pub struct Session {
    store: Box<dyn LeaveStore>,
    notifier: Box<dyn Notifier>,
    settings: AppSettings,
    year: i32,
    roster: Roster,
    data: LeavesDataset,
    undo: UndoManager<Snapshot>,
    picker: Picker,
    active: Option<CellKey>,
}

impl Session {
    /// Fetches the roster and the leave document, migrating legacy entries
    /// into `anchor_year`. `year` is the year the table shows.
    /// Never fails: a missing roster becomes the placeholder roster and an
    /// unreadable leave document becomes an empty table.
    pub fn load(
        store: Box<dyn LeaveStore>,
        notifier: Box<dyn Notifier>,
        settings: AppSettings,
        year: i32,
        anchor_year: i32,
    ) -> Self {
        let (roster, roster_error) = match store.load_roster() {
            Ok(roster) => (roster, None),
            Err(e) => {
                warn!("using placeholder roster: {e}");
                (Roster::fallback(), Some(e))
            }
        };
        let mut undo = UndoManager::new(settings.max_undo_states);
        undo.subscribe(|can_undo| debug!(can_undo, "undo availability changed"));
        debug!(max_states = undo.max_states(), "undo history ready");

        let mut session = Session {
            store,
            notifier,
            settings,
            year,
            roster,
            data: LeavesDataset::default(),
            undo,
            picker: Picker::Closed,
            active: None,
        };
        if let Some(e) = roster_error {
            session.toast(&format!("Using placeholder roster: {e}"), ToastKind::Failure);
        }
        session.load_leaves(anchor_year);
        session.undo.initialize(Snapshot::capture(&session.data));
        session
    }

    fn load_leaves(&mut self, anchor_year: i32) {
        let doc = match self.store.load_leaves() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                info!("no leave document yet, starting empty");
                return;
            }
            Err(e) => {
                error!("failed to load leaves: {e:#}");
                self.toast("Failed to load leaves.", ToastKind::Failure);
                return;
            }
        };
        let (data, report) = reconcile(doc, anchor_year);
        self.data = data;
        if !report.rejected.is_empty() {
            self.toast(
                &format!("{} legacy leave entries could not be read.", report.rejected.len()),
                ToastKind::Failure,
            );
        }
        if report.needs_save() {
            info!("legacy leave format detected, saving migrated document");
            self.save();
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    #[cfg(test)]
    pub fn data(&self) -> &LeavesDataset {
        &self.data
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn employees(&self) -> &[String] {
        &self.roster.names
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn history_len(&self) -> usize {
        self.undo.len()
    }

    /// The canonical day text of a cell, e.g. `3, 5-7, 10`.
    pub fn cell_text(&self, key: &CellKey) -> String {
        date_range::format(&self.data.dates_in_month(&key.employee, self.year, key.month))
    }

    pub fn cell_texts(&self) -> CellTexts {
        snapshot::capture_cells(&self.data, self.employees(), self.year)
    }

    pub fn blocks(&self) -> BTreeMap<CellKey, Vec<LeaveBlock>> {
        render_blocks(&self.data, self.year)
    }

    pub fn search(&self, query: &str) -> SearchHits {
        search::search(self.employees(), &self.cell_texts(), query)
    }

    // ── Active cell ───────────────────────────────────────────────────────────

    pub fn active_cell(&self) -> Option<&CellKey> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, cell: Option<CellKey>) {
        self.active = cell;
    }

    /// Moves the active cell by rows of `employees` and by month columns,
    /// staying inside the table. With no active cell, or one on a row not in
    /// `employees`, the move starts from the first row.
    pub fn move_active(&mut self, employees: &[String], rows: i32, months: i32) {
        if employees.is_empty() {
            return;
        }
        let Some(current) = &self.active else {
            self.active = Some(CellKey::new(&employees[0], 1));
            return;
        };
        let row = employees
            .iter()
            .position(|e| *e == current.employee)
            .unwrap_or(0) as i32;
        let last_row = employees.len() as i32 - 1;
        let row = (row + rows).clamp(0, last_row) as usize;
        let month = (current.month as i32 + months).clamp(1, 12) as u32;
        self.active = Some(CellKey::new(&employees[row], month));
    }

    // ── Edits ─────────────────────────────────────────────────────────────────

    /// Runs `change` against the live data. If it changed anything, the
    /// before state (unless already on top) and the after state are pushed to
    /// the history and the document is saved. Returns whether anything
    /// changed.
    fn edit(&mut self, change: impl FnOnce(&mut LeavesDataset, i32)) -> bool {
        let before = Snapshot::capture(&self.data);
        change(&mut self.data, self.year);
        if before.matches(&self.data) {
            return false;
        }
        if self.undo.latest() != Some(&before) {
            self.undo.push_state(before);
        }
        self.undo.push_state(Snapshot::capture(&self.data));
        self.save();
        true
    }

    /// Removes the leave days of one cell.
    pub fn clear_cell(&mut self, key: &CellKey) -> bool {
        self.edit(|data, year| {
            data.clear_month(&key.employee, year, key.month);
        })
    }

    /// Replaces a cell's leave days with the days written in `text`.
    /// Malformed tokens are ignored; a reversed range rejects the whole edit.
    pub fn edit_cell_text(&mut self, key: &CellKey, text: &str) -> Result<bool, DateRangeError> {
        let dates = match date_range::parse(text, self.year, key.month) {
            Ok(dates) => dates,
            Err(e) => {
                warn!(cell = %key.id(), "rejected cell text: {e}");
                self.toast(&format!("Invalid leave text: {e}"), ToastKind::Failure);
                return Err(e);
            }
        };
        let periods = date_range::to_periods(&dates);
        Ok(self.edit(|data, year| data.replace_month(&key.employee, year, key.month, periods)))
    }

    // ── Picker ────────────────────────────────────────────────────────────────

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.picker
    }

    pub fn open_picker(&mut self, cell: CellKey) {
        self.picker
            .open(cell, self.year, self.settings.pick_strategy, &self.data);
    }

    pub fn cancel_picker(&mut self) {
        self.picker.cancel();
    }

    /// Commits the picker selection into the dataset and closes the picker.
    pub fn confirm_picker(&mut self) -> bool {
        match self.picker.confirm() {
            Some(commit) => self.edit(|data, _| commit.apply(data)),
            None => false,
        }
    }

    // ── History ───────────────────────────────────────────────────────────────

    /// Restores the most recent history state that differs from the live
    /// data, then saves. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        while let Some(state) = self.undo.undo() {
            if state.matches(&self.data) {
                continue;
            }
            self.data = state.restore();
            info!(remaining = self.undo.len(), "undo applied");
            self.save();
            return true;
        }
        debug!("nothing to undo");
        false
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Writes the whole dataset. Failures are reported but the in-memory
    /// state and history are kept.
    pub fn save(&self) {
        let doc = LeavesDocument::from(&self.data);
        match self.store.save_leaves(&doc) {
            Ok(()) => {
                info!("leaves saved");
                self.toast("Leaves saved.", ToastKind::Success);
            }
            Err(e) => {
                error!("failed to save leaves: {e:#}");
                self.toast("Failed to save leaves!", ToastKind::Failure);
            }
        }
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        let duration = match kind {
            ToastKind::Success => self.settings.success_toast(),
            ToastKind::Failure => self.settings.failure_toast(),
        };
        self.notifier.notify(Toast {
            message: message.to_string(),
            kind,
            duration,
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::calc::PickStrategy;
    use crate::data::store::MemoryStore;
    use crate::data::{LeavePeriod, ToastQueue};
    use chrono::NaiveDate;
    use std::rc::Rc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn session_with(
        store: MemoryStore,
        settings: AppSettings,
    ) -> (Session, Rc<MemoryStore>, ToastQueue) {
        session_anchored(store, settings, 2025)
    }

    fn session_anchored(
        store: MemoryStore,
        settings: AppSettings,
        anchor_year: i32,
    ) -> (Session, Rc<MemoryStore>, ToastQueue) {
        let store = Rc::new(store);
        let toasts = ToastQueue::default();
        let session = Session::load(
            Box::new(Rc::clone(&store)),
            Box::new(toasts.clone()),
            settings,
            2025,
            anchor_year,
        );
        (session, store, toasts)
    }

    fn legacy_store() -> MemoryStore {
        let store = MemoryStore::with_roster(&["Anna", "Bob"]);
        let doc: LeavesDocument =
            serde_json::from_str(r#"{"leavesData":{"Anna":{"2":"3, 5-7, 10"}}}"#).unwrap();
        *store.leaves.borrow_mut() = Some(doc);
        store
    }

    #[test]
    fn test_load_falls_back_to_placeholder_roster() {
        let (session, _, toasts) = session_with(MemoryStore::default(), AppSettings::default());
        assert!(session.roster().fallback);
        assert_eq!(session.employees().len(), 13);
        assert_eq!(toasts.drain()[0].kind, ToastKind::Failure);
    }

    #[test]
    fn test_load_without_document_is_empty_and_unsaved() {
        let (session, store, toasts) =
            session_with(MemoryStore::with_roster(&["Anna"]), AppSettings::default());
        assert!(session.data().is_empty());
        assert_eq!(store.saves.get(), 0);
        assert!(toasts.drain().is_empty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_load_failure_gives_empty_table_and_failure_toast() {
        let store = MemoryStore {
            fail_load: true,
            ..MemoryStore::with_roster(&["Anna"])
        };
        let (session, _, toasts) = session_with(store, AppSettings::default());
        assert!(session.data().is_empty());
        let toasts = toasts.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Failure);
    }

    #[test]
    fn test_load_migrates_and_saves_once() {
        let (session, store, _) = session_with(legacy_store(), AppSettings::default());
        assert_eq!(store.saves.get(), 1);
        assert_eq!(session.cell_text(&CellKey::new("Anna", 3)), "3, 5-7, 10");
        let saved = store.leaves.borrow().clone().unwrap();
        assert_eq!(saved, LeavesDocument::from(session.data()));
    }

    #[test]
    fn test_legacy_months_migrate_into_anchor_year_not_shown_year() {
        let (session, store, _) = session_anchored(legacy_store(), AppSettings::default(), 2026);
        assert_eq!(session.year(), 2025);
        assert_eq!(session.cell_text(&CellKey::new("Anna", 3)), "");
        let saved = store.leaves.borrow().clone().unwrap();
        let json = serde_json::to_string(&saved).unwrap();
        assert!(json.contains("2026-03-05"));
        assert!(!json.contains("2025-"));
    }

    #[test]
    fn test_load_reorders_reversed_period_and_saves() {
        let store = MemoryStore::with_roster(&["Anna"]);
        *store.leaves.borrow_mut() = Some(
            serde_json::from_str(
                r#"{"leavesData":{"Anna":[{"startDate":"2025-03-10","endDate":"2025-03-05"}]}}"#,
            )
            .unwrap(),
        );
        let (session, store, _) = session_with(store, AppSettings::default());
        assert_eq!(store.saves.get(), 1);
        assert_eq!(session.cell_text(&CellKey::new("Anna", 3)), "5-10");
        assert_eq!(session.blocks()[&CellKey::new("Anna", 3)].len(), 1);
    }

    #[test]
    fn test_second_load_does_not_migrate_again() {
        let (_, store, _) = session_with(legacy_store(), AppSettings::default());
        let migrated = store.leaves.borrow().clone();
        let again = MemoryStore::with_roster(&["Anna", "Bob"]);
        *again.leaves.borrow_mut() = migrated;
        let (_, again, _) = session_with(again, AppSettings::default());
        assert_eq!(again.saves.get(), 0);
    }

    #[test]
    fn test_clear_cell_saves_and_can_be_undone() {
        let (mut session, store, _) = session_with(legacy_store(), AppSettings::default());
        let key = CellKey::new("Anna", 3);
        assert!(session.clear_cell(&key));
        assert_eq!(session.cell_text(&key), "");
        assert_eq!(store.saves.get(), 2);
        assert!(session.can_undo());

        assert!(session.undo());
        assert_eq!(session.cell_text(&key), "3, 5-7, 10");
        assert_eq!(store.saves.get(), 3);
        assert!(!session.can_undo());
        assert!(!session.undo());
    }

    #[test]
    fn test_clear_empty_cell_is_noop() {
        let (mut session, store, _) =
            session_with(MemoryStore::with_roster(&["Anna"]), AppSettings::default());
        assert!(!session.clear_cell(&CellKey::new("Anna", 5)));
        assert_eq!(store.saves.get(), 0);
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn test_edit_cell_text_replaces_days() {
        let (mut session, _, _) = session_with(legacy_store(), AppSettings::default());
        let key = CellKey::new("Anna", 3);
        assert_eq!(session.edit_cell_text(&key, "1-2, junk, 9"), Ok(true));
        assert_eq!(session.cell_text(&key), "1-2, 9");
        assert_eq!(session.edit_cell_text(&key, "9, 1-2"), Ok(false));
    }

    #[test]
    fn test_edit_cell_text_rejects_reversed_range() {
        let (mut session, store, toasts) = session_with(legacy_store(), AppSettings::default());
        toasts.drain();
        let key = CellKey::new("Anna", 3);
        let result = session.edit_cell_text(&key, "9-2");
        assert_eq!(result, Err(DateRangeError::ReversedRange { start: 9, end: 2 }));
        assert_eq!(session.cell_text(&key), "3, 5-7, 10");
        assert_eq!(store.saves.get(), 1);
        assert_eq!(toasts.drain()[0].kind, ToastKind::Failure);
    }

    #[test]
    fn test_save_failure_keeps_local_edit() {
        let (mut session, store, toasts) =
            session_with(MemoryStore::with_roster(&["Anna"]), AppSettings::default());
        store.fail_save.set(true);
        let key = CellKey::new("Anna", 1);
        assert_eq!(session.edit_cell_text(&key, "4"), Ok(true));
        assert_eq!(session.cell_text(&key), "4");
        assert!(session.can_undo());
        let toasts = toasts.drain();
        assert_eq!(toasts.last().unwrap().kind, ToastKind::Failure);
        assert_eq!(toasts.last().unwrap().duration, AppSettings::default().failure_toast());
    }

    #[test]
    fn test_confirm_pair_picker_appends_period() {
        let (mut session, _, _) =
            session_with(MemoryStore::with_roster(&["Anna"]), AppSettings::default());
        session.open_picker(CellKey::new("Anna", 1));
        let open = session.picker_mut().as_open_mut().unwrap();
        open.cursor = d(2025, 1, 30);
        open.click(false);
        open.cursor = d(2025, 2, 2);
        open.click(false);
        assert!(session.confirm_picker());
        assert!(!session.picker().is_open());
        assert_eq!(session.data().periods("Anna"), &[LeavePeriod::new(d(2025, 1, 30), d(2025, 2, 2))]);
        let blocks = session.blocks();
        assert_eq!(blocks[&CellKey::new("Anna", 1)].len(), 1);
        assert_eq!(blocks[&CellKey::new("Anna", 2)].len(), 1);
    }

    #[test]
    fn test_confirm_toggle_picker_rewrites_cell() {
        let settings = AppSettings {
            pick_strategy: PickStrategy::Toggle,
            ..AppSettings::default()
        };
        let (mut session, _, _) = session_with(legacy_store(), settings);
        session.open_picker(CellKey::new("Anna", 3));
        let open = session.picker_mut().as_open_mut().unwrap();
        open.cursor = d(2025, 3, 10);
        open.click(false); // deselect 10
        open.cursor = d(2025, 3, 12);
        open.click(true); // extend 10..=12
        assert!(session.confirm_picker());
        assert_eq!(session.cell_text(&CellKey::new("Anna", 3)), "3, 5-7, 10-12");
    }

    #[test]
    fn test_cancel_picker_changes_nothing() {
        let (mut session, store, _) = session_with(legacy_store(), AppSettings::default());
        session.open_picker(CellKey::new("Anna", 3));
        session.picker_mut().as_open_mut().unwrap().click(false);
        session.cancel_picker();
        assert!(!session.confirm_picker());
        assert_eq!(store.saves.get(), 1);
    }

    #[test]
    fn test_history_is_bounded_by_settings() {
        let settings = AppSettings {
            max_undo_states: 4,
            ..AppSettings::default()
        };
        let (mut session, _, _) = session_with(MemoryStore::with_roster(&["Anna"]), settings);
        for day in 1..=6 {
            session.edit_cell_text(&CellKey::new("Anna", 1), &day.to_string()).unwrap();
        }
        assert_eq!(session.history_len(), 4);
    }

    #[test]
    fn test_move_active_clamps_to_table() {
        let (mut session, _, _) =
            session_with(MemoryStore::with_roster(&["Anna", "Bob"]), AppSettings::default());
        let rows = session.employees().to_vec();
        session.move_active(&rows, 0, 0);
        assert_eq!(session.active_cell(), Some(&CellKey::new("Anna", 1)));
        session.move_active(&rows, 5, -3);
        assert_eq!(session.active_cell(), Some(&CellKey::new("Bob", 1)));
        session.move_active(&rows, 0, 20);
        assert_eq!(session.active_cell(), Some(&CellKey::new("Bob", 12)));
    }

    #[test]
    fn test_move_active_stays_within_given_rows() {
        let (mut session, _, _) = session_with(
            MemoryStore::with_roster(&["Anna", "Bob", "Cleo"]),
            AppSettings::default(),
        );
        session.set_active(Some(CellKey::new("Bob", 4)));
        let rows = vec!["Anna".to_string(), "Cleo".to_string()];
        session.move_active(&rows, 1, 0);
        assert_eq!(session.active_cell(), Some(&CellKey::new("Cleo", 4)));
        session.move_active(&rows, -1, 0);
        assert_eq!(session.active_cell(), Some(&CellKey::new("Anna", 4)));
    }

    #[test]
    fn test_search_uses_cell_text() {
        let (session, _, _) = session_with(legacy_store(), AppSettings::default());
        let hits = session.search("5-7");
        assert!(hits.cells.contains(&CellKey::new("Anna", 3)));
    }
}
