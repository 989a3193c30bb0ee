//! pairtag - point correspondence tagging for image pairs
//!
//! A folder holds images named `<name>_1.<ext>` and `<name>_2.<ext>`. Each
//! pair is tagged with matched points, one per image, and the tags persist
//! to a `tags_<folder>_.json` file next to the images.
//!
//! [`Session`] is the operation surface for a host UI: it owns both
//! viewports, the tag store and the save/poll timers, and can be driven
//! directly or through [`Message`]s.

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod keybindings;
pub mod message;
pub mod model;
pub mod session;
pub mod state;
pub mod zoom_math;

pub use config::AppConfig;
pub use error::{Result, SessionError};
pub use message::{Message, Outcome};
pub use model::{Point, Side, TagPair};
pub use session::Session;
pub use zoom_math::{Viewport, ZoomDirection};
