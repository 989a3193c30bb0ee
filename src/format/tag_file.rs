//! Sidecar tag file.
//!
//! Each image folder stores its tags next to the images in
//! `tags_<folder name>_.json`:
//!
//! ```json
//! {
//!   "open_pair_name": "scene",
//!   "timestamp": "",
//!   "all_tags": { "scene": [[[10.5, 20.0], [11.0, 19.5]]] }
//! }
//! ```
//!
//! `all_tags` is required when the file exists. A missing file is an empty
//! session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SessionError};
use crate::model::TagPair;

/// Top-level key that marks a file as a tag file.
const TAGS_KEY: &str = "all_tags";

/// Contents of a sidecar tag file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagFile {
    /// Pair that was open when the file was written (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub open_pair_name: String,

    /// Reserved, always written empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,

    /// Tag lists keyed by pair id
    pub all_tags: BTreeMap<String, Vec<TagPair>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl TagFile {
    /// Create a tag file for the given open pair and tags.
    pub fn new(open_pair_name: impl Into<String>, all_tags: BTreeMap<String, Vec<TagPair>>) -> Self {
        Self {
            open_pair_name: open_pair_name.into(),
            timestamp: String::new(),
            all_tags,
        }
    }

    /// The open pair name, or `None` when it is empty.
    pub fn open_pair(&self) -> Option<&str> {
        Some(self.open_pair_name.as_str()).filter(|name| !name.is_empty())
    }

    /// Parse tag file contents.
    ///
    /// `path` is only used for error reporting.
    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let has_tags = value
            .as_object()
            .is_some_and(|object| object.contains_key(TAGS_KEY));
        if !has_tags {
            return Err(SessionError::MalformedTagFile {
                path: path.to_path_buf(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Total number of tags over all pairs.
    pub fn total_tags(&self) -> usize {
        self.all_tags.values().map(Vec::len).sum()
    }
}

/// Path of the sidecar tag file for `folder`.
pub fn sidecar_path(folder: &Path) -> PathBuf {
    let name = folder
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    folder.join(format!("tags_{name}_.json"))
}

/// Read a tag file. A missing file yields an empty [`TagFile`].
pub fn read_tag_file(path: &Path) -> Result<TagFile> {
    if !path.is_file() {
        log::debug!("No tag file at {:?}, starting empty", path);
        return Ok(TagFile::default());
    }

    let json = std::fs::read_to_string(path)?;
    let file = TagFile::from_json(&json, path)?;
    log::info!(
        "Read {} tags for {} pairs from {:?}",
        file.total_tags(),
        file.all_tags.len(),
        path
    );
    Ok(file)
}

/// Write a tag file, replacing any existing one.
pub fn write_tag_file(path: &Path, file: &TagFile) -> Result<()> {
    let json = file.to_json()?;
    std::fs::write(path, json)?;
    log::trace!("Wrote {} tags to {:?}", file.total_tags(), path);
    Ok(())
}
