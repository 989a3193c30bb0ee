//! In-memory tag storage and the two-sided pending point state.
//!
//! Tags are kept per pair id in confirmation order; a tag's position in its
//! list is its identity (label number, palette color, selection). A new tag
//! is built from one pending point per side and only enters the list once
//! both sides have one.

use std::collections::BTreeMap;

use crate::error::{Result, SessionError};
use crate::model::{Point, Side, TagPair};
use crate::zoom_math::find_nearest;

/// Result of placing a point on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    /// The point is now pending on that side
    Pending,
    /// The click landed on an existing tag, which is now selected
    Selected(usize),
    /// That side already holds a pending point; nothing changed
    Ignored,
}

/// Result of a cancel gesture on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The side's pending point was removed
    PendingCleared,
    /// There was no pending point, so the selection was cleared instead
    SelectionCleared,
}

/// Tag lists keyed by pair id, plus pending points and the shared selection.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    tags: BTreeMap<String, Vec<TagPair>>,
    pending: [Option<Point>; 2],
    selection: Option<usize>,
}

impl TagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from previously saved tag lists.
    pub fn from_map(tags: BTreeMap<String, Vec<TagPair>>) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    /// All tag lists, keyed by pair id.
    pub fn all(&self) -> &BTreeMap<String, Vec<TagPair>> {
        &self.tags
    }

    /// Tags of one pair, in confirmation order.
    pub fn tags(&self, pair_id: &str) -> &[TagPair] {
        self.tags.get(pair_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of tags of one pair.
    pub fn len(&self, pair_id: &str) -> usize {
        self.tags(pair_id).len()
    }

    /// Total number of tags over all pairs.
    pub fn total(&self) -> usize {
        self.tags.values().map(Vec::len).sum()
    }

    /// Tag list labels of one pair.
    pub fn labels(&self, pair_id: &str) -> Vec<String> {
        self.tags(pair_id)
            .iter()
            .enumerate()
            .map(|(index, tag)| tag.label(index))
            .collect()
    }

    /// Pending point on `side`, if any.
    pub fn pending(&self, side: Side) -> Option<Point> {
        self.pending[side.index()]
    }

    /// Currently selected tag index.
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Handle a click at `image_point` on `side` of pair `pair_id`.
    ///
    /// A side holds at most one pending point. While the other side has no
    /// pending point, a click near an existing tag selects it instead of
    /// starting a new one, and a click elsewhere clears the selection.
    pub fn begin_point(
        &mut self,
        pair_id: &str,
        side: Side,
        image_point: Point,
        zoom_index: usize,
    ) -> PointOutcome {
        if self.pending[side.index()].is_some() {
            log::trace!("{} already has a pending point", side.name());
            return PointOutcome::Ignored;
        }

        if self.pending[side.opposite().index()].is_none() {
            let points = self.tags(pair_id).iter().map(|tag| tag.point(side));
            if let Some(index) = find_nearest(image_point, points, zoom_index) {
                log::debug!("Selected tag {} from {}", index + 1, side.name());
                self.selection = Some(index);
                return PointOutcome::Selected(index);
            }
            self.selection = None;
        }

        log::debug!(
            "Pending point on {} at ({:.1}, {:.1})",
            side.name(),
            image_point.x,
            image_point.y
        );
        self.pending[side.index()] = Some(image_point);
        PointOutcome::Pending
    }

    /// Commit both pending points as a new tag of `pair_id`.
    ///
    /// Returns the new tag's index, or `None` (changing nothing) unless both
    /// sides have a pending point.
    pub fn commit_if_ready(&mut self, pair_id: &str) -> Option<usize> {
        let [Some(left), Some(right)] = self.pending else {
            return None;
        };

        let list = self.tags.entry(pair_id.to_string()).or_default();
        list.push(TagPair::new(left, right));
        self.pending = [None, None];

        let index = list.len() - 1;
        log::debug!("Committed tag {} for pair {}", index + 1, pair_id);
        Some(index)
    }

    /// Drop the pending point on `side`, or clear the selection when there is none.
    pub fn cancel_pending(&mut self, side: Side) -> CancelOutcome {
        if self.pending[side.index()].take().is_some() {
            log::debug!("Cancelled pending point on {}", side.name());
            CancelOutcome::PendingCleared
        } else {
            self.selection = None;
            CancelOutcome::SelectionCleared
        }
    }

    /// Remove the tag at `index` of `pair_id`; later tags move down by one.
    ///
    /// The selection is cleared.
    pub fn delete_from(&mut self, pair_id: &str, index: usize) -> Result<TagPair> {
        let len = self.len(pair_id);
        let list = match self.tags.get_mut(pair_id) {
            Some(list) if index < list.len() => list,
            _ => return Err(SessionError::index_out_of_range(index, len)),
        };

        let removed = list.remove(index);
        self.selection = None;
        log::debug!("Deleted tag {} of pair {}", index + 1, pair_id);
        Ok(removed)
    }

    /// Remove every tag of `pair_id`, both pending points and the selection.
    ///
    /// Returns the number of tags removed. Callers gate this behind a user
    /// confirmation; there is no way back.
    pub fn clear_all(&mut self, pair_id: &str) -> usize {
        let removed = self
            .tags
            .get_mut(pair_id)
            .map(|list| std::mem::take(list).len())
            .unwrap_or(0);
        self.pending = [None, None];
        self.selection = None;
        log::info!("Cleared {} tags of pair {}", removed, pair_id);
        removed
    }

    /// Select the tag at `index` of `pair_id` on both sides.
    pub fn select(&mut self, pair_id: &str, index: usize) -> Result<()> {
        let len = self.len(pair_id);
        if index >= len {
            return Err(SessionError::index_out_of_range(index, len));
        }
        self.selection = Some(index);
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Forget pending points and the selection, keeping all tags.
    pub fn reset_transient(&mut self) {
        self.pending = [None, None];
        self.selection = None;
    }
}
