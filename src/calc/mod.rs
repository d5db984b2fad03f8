pub mod blocks;
pub mod date_range;
pub mod migration;
pub mod picker;
pub mod search;
pub mod snapshot;
pub mod undo;

pub use blocks::{render_blocks, LeaveBlock};
pub use migration::{reconcile, MigrationReport};
pub use picker::{Commit, DayMark, OpenPicker, PickStrategy, Picker, Selection};
pub use snapshot::Snapshot;
pub use undo::UndoManager;
