//! Session state: folder pairing and tag storage.

mod project;
mod tag_store;

pub use project::{PairEntry, PairSet, derive_pairs, has_image_extension, list_image_files};
pub use tag_store::{CancelOutcome, PointOutcome, TagStore};
