//! Filesystem mutations behind the sidetree commands.
//!
//! Every operation runs its blocking work on the tokio blocking pool and
//! reports an [`OperationComplete`] naming the paths it touched, from which
//! callers derive the directories to re-scan.

mod create;
mod delete;
mod exec;
mod link;
mod operation;
mod progress;
mod rename;
mod stat;

pub use create::{CreateKind, create, parse_new_entry};
pub use delete::{delete, trash};
pub use exec::toggle_exec;
pub use link::{link, relative_to};
pub use operation::OpError;
pub use progress::{OperationComplete, OperationType};
pub use rename::{rename, validate_filename};
pub use stat::{FileStat, existing, resolve, stat};
