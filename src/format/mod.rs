//! On-disk persistence.
//!
//! - **Tag file**: the per-folder JSON sidecar holding every confirmed tag
//!   and the pair that was last open
//! - **Timers**: the recurring save and cursor poll schedule, with
//!   cancellation on folder switch
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pairtag::format::{read_tag_file, sidecar_path};
//!
//! let file = read_tag_file(&sidecar_path(folder))?;
//! ```

mod auto_save;
mod tag_file;

#[cfg(test)]
mod tests;

pub use auto_save::{AutoSaveManager, TimerKind, TimerToken, Timers};
pub use tag_file::{TagFile, read_tag_file, sidecar_path, write_tag_file};
