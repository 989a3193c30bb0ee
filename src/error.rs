//! Error types for session operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a folder or operating on a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The folder contains no image files
    #[error("No images found! Select a folder with images")]
    NoImages,

    /// Images cannot be split into pairs
    #[error("Found {count} images; select a directory with an even number of images (pairs)")]
    OddCount {
        /// Number of images found
        count: usize,
    },

    /// An image name does not end in a pairing suffix
    #[error("Incorrectly formatted name '{name}': expected a '_1' or '_2' suffix")]
    NamingConvention {
        /// The offending file name
        name: String,
    },

    /// A stem does not have exactly one left and one right image
    #[error("Image '{stem}' has no pair ({count} files share this name)")]
    UnpairedName {
        /// Name with the suffix and extension removed
        stem: String,
        /// Number of files sharing the stem
        count: usize,
    },

    /// Tag file exists but has no `all_tags` key
    #[error("Tag file {path:?} opened but it has no tags")]
    MalformedTagFile {
        /// Path of the tag file
        path: PathBuf,
    },

    /// Tag index outside the current pair's tag list
    #[error("Tag index {index} out of range for {len} tags")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of tags in the list
        len: usize,
    },

    /// Pair id not present in the loaded folder
    #[error("Unknown pair: {id}")]
    UnknownPair {
        /// The requested pair id
        id: String,
    },

    /// Operation requires a loaded folder
    #[error("No folder loaded")]
    NotLoaded,

    /// Image header could not be read
    #[error("Failed to read image {path:?}: {source}")]
    ImageRead {
        /// Path of the image
        path: PathBuf,
        /// Underlying decoder error
        source: image::ImageError,
    },

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Create an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an unknown pair error.
    pub fn unknown_pair(id: impl Into<String>) -> Self {
        Self::UnknownPair { id: id.into() }
    }

    /// Create an image read error.
    pub fn image_read(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::ImageRead {
            path: path.into(),
            source,
        }
    }

    /// Whether this error rejects a folder selection (as opposed to a misuse or I/O fault).
    pub fn is_folder_rejection(&self) -> bool {
        matches!(
            self,
            Self::NoImages
                | Self::OddCount { .. }
                | Self::NamingConvention { .. }
                | Self::UnpairedName { .. }
                | Self::MalformedTagFile { .. }
        )
    }
}

/// Result alias for session operations.
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
