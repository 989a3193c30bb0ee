//! Message types for driving a session.
//!
//! Every input gesture of a host UI maps to exactly one message, which
//! [`Session::apply`](crate::session::Session::apply) dispatches to the
//! matching core operation.

use std::path::PathBuf;

use crate::model::{Point, Side, TagPair};
use crate::session::{CursorStatus, InteractionMode};
use crate::state::{CancelOutcome, PointOutcome};
use crate::zoom_math::ZoomDirection;

/// Messages that can be sent to update session state.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Folder and navigation
    /// Load a folder of image pairs
    LoadFolder(PathBuf),
    /// Open a pair by id
    SelectPair(String),
    /// Open the previous pair
    PrevPair,
    /// Open the next pair
    NextPair,

    // Tagging
    /// Pointer press at a viewport position
    BeginPoint { side: Side, position: Point },
    /// Commit the two pending points
    ConfirmPending,
    /// Undo gesture on one side
    CancelPending(Side),
    /// Delete a tag of the open pair
    DeleteTag(usize),
    /// Delete every tag of the open pair (already confirmed by the user)
    ClearAllTags,
    /// Select a tag of the open pair
    SelectTag(usize),
    /// Clear the selection
    ClearSelection,

    // View
    /// Scroll on one side around an anchor
    Zoom {
        side: Side,
        direction: ZoomDirection,
        anchor: Point,
    },
    /// Drag on one side
    Pan { side: Side, dx: f64, dy: f64 },

    // Host events
    /// Write the tag file now
    SaveTick,
    /// Switch between tagging and panning
    SetMode(InteractionMode),
    /// Window lost focus; held modifiers count as released
    FocusLost,
    /// Report what is under the pointer
    PollCursor {
        side: Option<Side>,
        position: Point,
    },
}

/// What a message changed, for the host to refresh its widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing changed
    Unchanged,
    /// A folder was loaded
    Loaded { pairs: usize, open_pair: String },
    /// A different pair is open
    PairOpened { id: String },
    /// Result of a pointer press
    Point(PointOutcome),
    /// A new tag was committed at this index
    Committed(usize),
    /// Result of an undo gesture
    Cancelled(CancelOutcome),
    /// A tag was removed
    Deleted(TagPair),
    /// This many tags were removed
    Cleared(usize),
    /// A tag is now selected
    Selected(usize),
    /// The selection was cleared
    SelectionCleared,
    /// One side's viewport moved
    ViewChanged(Side),
    /// Tag file written (false when no folder is loaded)
    Saved(bool),
    /// Pointer status
    Cursor(CursorStatus),
    /// Interaction mode changed
    ModeChanged(InteractionMode),
}
