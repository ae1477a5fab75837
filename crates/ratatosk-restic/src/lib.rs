//! # ratatosk-restic
//!
//! Everything restic: the command builder, the line-delimited JSON event
//! protocol, per-source backup drivers and the per-host runner. restic
//! itself stays an external binary; this crate only builds its argv, feeds
//! it a tunnel and folds its event stream into result records.

pub mod command;
pub mod drivers;
pub mod events;
pub mod record;
pub mod runner;

pub use command::{run_local, ResticCmd};
pub use events::{parse_line, EventFold, NullProgress, ProgressSink, ResticEvent, StatusEvent};
pub use record::{BackupRecord, BackupStats, HostResults, RunResults};
