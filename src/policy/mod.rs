//! End-user choice policies shared by every artifact and the agent.

pub mod backup;
pub mod departments;
pub mod filters;

pub use backup::{BackupRoot, BackupSelection, is_valid, toggle};
pub use departments::{DEPARTMENT_OVERRIDES, DepartmentResolver};
pub use filters::{BlackList, MAX_FILE_SIZE};
