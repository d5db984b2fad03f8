//! Boundaries to the outside world: where leave and roster documents are
//! kept, and where user-facing notifications go.

use crate::data::document::LeavesDocument;
use crate::data::persistence::Persistable;
use crate::data::roster::{FetchError, Roster, RosterDocument};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

pub trait LeaveStore {
    /// Reads the leave document; `None` when it does not exist yet.
    fn load_leaves(&self) -> Result<Option<LeavesDocument>>;
    fn save_leaves(&self, doc: &LeavesDocument) -> Result<()>;
    fn load_roster(&self) -> Result<Roster, FetchError>;
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }
}

impl LeaveStore for FileStore {
    fn load_leaves(&self) -> Result<Option<LeavesDocument>> {
        LeavesDocument::try_load_from(&self.dir)
    }

    fn save_leaves(&self, doc: &LeavesDocument) -> Result<()> {
        doc.save_to(&self.dir)
    }

    fn load_roster(&self) -> Result<Roster, FetchError> {
        let doc = RosterDocument::try_load_from(&self.dir)
            .map_err(|e| FetchError::Load(format!("{e:#}")))?
            .ok_or(FetchError::Missing)?;
        Roster::from_document(doc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Notifier that queues toasts for the UI to pick up. Clones share the queue.
#[derive(Clone, Default)]
pub struct ToastQueue(Rc<RefCell<VecDeque<Toast>>>);

impl ToastQueue {
    pub fn pop(&self) -> Option<Toast> {
        self.0.borrow_mut().pop_front()
    }

    #[cfg(test)]
    pub fn drain(&self) -> Vec<Toast> {
        self.0.borrow_mut().drain(..).collect()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.0.borrow_mut().push_back(toast);
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub leaves: RefCell<Option<LeavesDocument>>,
    pub roster: Option<RosterDocument>,
    pub fail_load: bool,
    pub fail_save: std::cell::Cell<bool>,
    pub saves: std::cell::Cell<usize>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_roster(names: &[&str]) -> Self {
        MemoryStore {
            roster: Some(RosterDocument::from_names(names)),
            ..MemoryStore::default()
        }
    }
}

#[cfg(test)]
impl LeaveStore for Rc<MemoryStore> {
    fn load_leaves(&self) -> Result<Option<LeavesDocument>> {
        if self.fail_load {
            anyhow::bail!("store unavailable");
        }
        Ok(self.leaves.borrow().clone())
    }

    fn save_leaves(&self, doc: &LeavesDocument) -> Result<()> {
        if self.fail_save.get() {
            anyhow::bail!("write rejected");
        }
        self.saves.set(self.saves.get() + 1);
        *self.leaves.borrow_mut() = Some(doc.clone());
        Ok(())
    }

    fn load_roster(&self) -> Result<Roster, FetchError> {
        match &self.roster {
            Some(doc) => Roster::from_document(doc.clone()),
            None => Err(FetchError::Missing),
        }
    }
}
