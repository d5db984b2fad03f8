pub mod app_settings;
pub mod dataset;
pub mod document;
pub mod leave_period;
pub mod persistence;
pub mod roster;
pub mod store;

pub use app_settings::AppSettings;
pub use dataset::{CellKey, LeavesDataset};
pub use document::{EmployeeRecord, LeavesDocument};
pub use leave_period::LeavePeriod;
pub use persistence::Persistable;
pub use roster::{FetchError, Roster, RosterDocument};
pub use store::{FileStore, LeaveStore, Notifier, Toast, ToastKind, ToastQueue};
