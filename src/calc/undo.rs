//! Bounded, linear undo history of table snapshots.
//!
//! The stack holds the baseline state plus one entry per push. Undo drops the
//! newest entry and hands back the one beneath it, so the baseline is the
//! floor: with a single entry there is nothing to undo. There is no redo.

use std::collections::VecDeque;

pub const DEFAULT_MAX_UNDO_STATES: usize = 30;

type Listener = Box<dyn FnMut(bool)>;

pub struct UndoManager<T> {
    states: VecDeque<T>,
    max_states: usize,
    listeners: Vec<Listener>,
}

impl<T: Clone> UndoManager<T> {
    /// `max_states` is clamped to at least 1.
    pub fn new(max_states: usize) -> Self {
        UndoManager {
            states: VecDeque::new(),
            max_states: max_states.max(1),
            listeners: Vec::new(),
        }
    }

    /// Registers a callback that receives `can_undo()` after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drops all history and starts over from `baseline`.
    pub fn initialize(&mut self, baseline: T) {
        self.states.clear();
        self.states.push_back(baseline);
        self.notify();
    }

    /// Appends a state, evicting the oldest entries past the bound.
    pub fn push_state(&mut self, state: T) {
        self.states.push_back(state);
        while self.states.len() > self.max_states {
            self.states.pop_front();
        }
        self.notify();
    }

    /// Discards the newest state and returns the one now on top, which the
    /// caller should make live. Returns `None` at the floor.
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.states.pop_back();
        let state = self.states.back().cloned();
        self.notify();
        state
    }

    pub fn can_undo(&self) -> bool {
        self.states.len() > 1
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    pub fn latest(&self) -> Option<&T> {
        self.states.back()
    }

    fn notify(&mut self) {
        let can_undo = self.can_undo();
        for listener in &mut self.listeners {
            listener(can_undo);
        }
    }
}
