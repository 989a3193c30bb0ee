//! Folder discovery and left/right image pairing.
//!
//! A folder is valid when every image name ends in `_1` or `_2` (before the
//! extension) and every stem has exactly one of each. Pairs are formed
//! positionally: names are sorted lexicographically and consecutive entries
//! are grouped. This only lines up when each stem's two files sort next to
//! each other, which holds for ordinary names but is not guaranteed for
//! stems that are themselves prefixes ending in a suffix (e.g. `a` and `a_1`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{LEFT_SUFFIX, RIGHT_SUFFIX};
use crate::error::{Result, SessionError};

/// Check if a filename has one of the given extensions (case-insensitive, without dots).
pub fn has_image_extension<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// List image file names (not paths) directly inside `folder`, non-recursively.
pub fn list_image_files<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if has_image_extension(&name, extensions) => names.push(name),
            Ok(_) => {}
            Err(name) => log::warn!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    log::debug!("Found {} image files in {:?}", names.len(), folder);
    Ok(names)
}

/// File name with its final extension removed.
fn strip_extension(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}

/// Split a file name into its pair stem and side suffix.
fn split_suffix(name: &str) -> Option<(&str, &'static str)> {
    let base = strip_extension(name);
    [LEFT_SUFFIX, RIGHT_SUFFIX]
        .into_iter()
        .find_map(|suffix| base.strip_suffix(suffix).map(|stem| (stem, suffix)))
}

/// One left/right image pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    /// Shared stem of the two file names
    pub id: String,
    /// File name of the left image
    pub left: String,
    /// File name of the right image
    pub right: String,
}

impl PairEntry {
    /// Full paths of the two images inside `folder`.
    pub fn paths_in(&self, folder: &Path) -> (PathBuf, PathBuf) {
        (folder.join(&self.left), folder.join(&self.right))
    }
}

/// Ordered image pairs of a folder. Index order is navigation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairSet {
    pairs: Vec<PairEntry>,
}

impl PairSet {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs are loaded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair at navigation index `index`.
    pub fn get(&self, index: usize) -> Option<&PairEntry> {
        self.pairs.get(index)
    }

    /// Navigation index of the pair with id `id`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.pairs.iter().position(|pair| pair.id == id)
    }

    /// Check whether `id` names a pair in this set.
    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Pair ids in navigation order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|pair| pair.id.as_str())
    }

    /// Iterate over the pairs in navigation order.
    pub fn iter(&self) -> impl Iterator<Item = &PairEntry> {
        self.pairs.iter()
    }
}

/// Validate a folder's image names and group them into ordered pairs.
///
/// Checks run in this order: empty input, odd count, stems among correctly
/// suffixed names that lack exactly one `_1` and one `_2` image, and finally
/// names without a pairing suffix.
pub fn derive_pairs<S: AsRef<str>>(file_names: &[S]) -> Result<PairSet> {
    if file_names.is_empty() {
        return Err(SessionError::NoImages);
    }

    if file_names.len() % 2 != 0 {
        return Err(SessionError::OddCount {
            count: file_names.len(),
        });
    }

    // stem -> (left count, right count)
    let mut stems: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    let mut misnamed = None;
    for name in file_names {
        let name = name.as_ref();
        match split_suffix(name) {
            Some((stem, suffix)) => {
                let counts = stems.entry(stem).or_default();
                if suffix == LEFT_SUFFIX {
                    counts.0 += 1;
                } else {
                    counts.1 += 1;
                }
            }
            None => {
                misnamed.get_or_insert(name);
            }
        }
    }

    if let Some((stem, (left, right))) = stems.iter().find(|(_, counts)| **counts != (1, 1)) {
        return Err(SessionError::UnpairedName {
            stem: stem.to_string(),
            count: left + right,
        });
    }

    if let Some(name) = misnamed {
        return Err(SessionError::NamingConvention {
            name: name.to_string(),
        });
    }

    let mut sorted: Vec<&str> = file_names.iter().map(|name| name.as_ref()).collect();
    sorted.sort_unstable();

    let pairs = sorted
        .chunks_exact(2)
        .map(|chunk| {
            let (left, right) = (chunk[0], chunk[1]);
            let id = split_suffix(left).map_or(left, |(stem, _)| stem);
            if split_suffix(right).map(|(stem, _)| stem) != Some(id) {
                log::warn!("Positional pairing grouped '{}' with '{}'", left, right);
            }
            PairEntry {
                id: id.to_string(),
                left: left.to_string(),
                right: right.to_string(),
            }
        })
        .collect();

    Ok(PairSet { pairs })
}
