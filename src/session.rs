//! The session: one loaded folder, its open pair, both viewports and the
//! periodic timers.
//!
//! A host UI drives the session through the methods below or through
//! [`Message`]s passed to [`Session::apply`]. Nothing here blocks on anything
//! but local file reads and writes, and no method is reentrant.

use std::path::{Path, PathBuf};

use web_time::Instant;

use crate::color_utils::{Palette, Rgb};
use crate::config::AppConfig;
use crate::constants::marker;
use crate::error::{Result, SessionError};
use crate::format::{
    AutoSaveManager, TagFile, TimerKind, TimerToken, Timers, read_tag_file, sidecar_path,
    write_tag_file,
};
use crate::keybindings::{Key, KeyAction};
use crate::message::{Message, Outcome};
use crate::model::{Point, Side, TagPair};
use crate::state::{
    CancelOutcome, PairEntry, PairSet, PointOutcome, TagStore, derive_pairs, list_image_files,
};
use crate::zoom_math::{Viewport, ZoomDirection, marker_diameter};

/// What a pointer press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Presses place or select points
    #[default]
    Tag,
    /// Presses only drag the image
    Pan,
}

/// Pointer shape the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// Outside both images
    Arrow,
    /// Over an image in tag mode
    Crosshair,
    /// Over an image in pan mode
    Move,
}

/// Result of a cursor poll.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorStatus {
    /// Side the pointer is over
    pub side: Option<Side>,
    /// Image-space position text for that side
    pub readout: Option<String>,
    /// Pointer shape
    pub cursor: CursorStyle,
}

/// One point marker to draw on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Tag index, or `None` for the pending point
    pub index: Option<usize>,
    /// Center in viewport coordinates
    pub position: Point,
    pub fill: Rgb,
    pub outline: Rgb,
    pub selected: bool,
    pub pending: bool,
    /// Outer diameter in viewport pixels
    pub diameter: f64,
    /// Outline stroke width in viewport pixels
    pub outline_width: f64,
}

/// Something a timer did.
#[derive(Debug)]
pub enum TimerEvent {
    /// The tag file was written
    Saved,
    /// Writing the tag file failed; the timer keeps running
    SaveFailed(SessionError),
    /// The host should poll the cursor
    PollDue,
}

#[derive(Debug)]
struct OpenFolder {
    path: PathBuf,
    tag_path: PathBuf,
    pairs: PairSet,
    current: usize,
}

impl OpenFolder {
    fn current_pair(&self) -> Option<&PairEntry> {
        self.pairs.get(self.current)
    }
}

/// State of the tagging tool.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    palette: Palette,
    folder: Option<OpenFolder>,
    tags: TagStore,
    viewports: [Viewport; 2],
    timers: Timers,
    auto_save: AutoSaveManager,
    mode: InteractionMode,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an unloaded session with default preferences.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create an unloaded session with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let palette = Palette::rainbow(config.preferences.palette_size);
        Self {
            config,
            palette,
            folder: None,
            tags: TagStore::new(),
            viewports: [Viewport::default(); 2],
            timers: Timers::new(),
            auto_save: AutoSaveManager::new(),
            mode: InteractionMode::Tag,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// True once a folder is loaded.
    pub fn is_loaded(&self) -> bool {
        self.folder.is_some()
    }

    /// The loaded folder.
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_ref().map(|open| open.path.as_path())
    }

    /// Path of the loaded folder's tag file.
    pub fn tag_file_path(&self) -> Option<&Path> {
        self.folder.as_ref().map(|open| open.tag_path.as_path())
    }

    /// Pairs of the loaded folder.
    pub fn pairs(&self) -> Option<&PairSet> {
        self.folder.as_ref().map(|open| &open.pairs)
    }

    /// Pair ids in navigation order, for a pair picker.
    pub fn pair_ids(&self) -> Vec<&str> {
        self.pairs().map(|pairs| pairs.ids().collect()).unwrap_or_default()
    }

    /// The open pair.
    pub fn current_pair(&self) -> Option<&PairEntry> {
        self.folder.as_ref().and_then(OpenFolder::current_pair)
    }

    /// Id of the open pair.
    pub fn current_pair_id(&self) -> Option<&str> {
        self.current_pair().map(|pair| pair.id.as_str())
    }

    /// Navigation index of the open pair.
    pub fn current_index(&self) -> Option<usize> {
        self.folder.as_ref().map(|open| open.current)
    }

    /// Full paths of the open pair's two images.
    pub fn image_paths(&self) -> Option<(PathBuf, PathBuf)> {
        let open = self.folder.as_ref()?;
        Some(open.current_pair()?.paths_in(&open.path))
    }

    pub fn viewport(&self, side: Side) -> &Viewport {
        &self.viewports[side.index()]
    }

    pub fn tag_store(&self) -> &TagStore {
        &self.tags
    }

    /// Tags of the open pair.
    pub fn tags(&self) -> &[TagPair] {
        match self.current_pair_id() {
            Some(id) => self.tags.tags(id),
            None => &[],
        }
    }

    pub fn selection(&self) -> Option<usize> {
        self.tags.selection()
    }

    pub fn pending(&self, side: Side) -> Option<Point> {
        self.tags.pending(side)
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn auto_save(&self) -> &AutoSaveManager {
        &self.auto_save
    }

    // =========================================================================
    // Folder and navigation
    // =========================================================================

    /// Load a folder, replacing the current session.
    ///
    /// Everything is validated before any state changes, so a rejected folder
    /// leaves the open session untouched.
    pub fn load_folder(&mut self, path: &Path) -> Result<&PairSet> {
        self.load_folder_at(path, Instant::now())
    }

    /// [`load_folder`](Self::load_folder) with an explicit clock for the timers.
    ///
    /// The path is canonicalized first, so `.` names its tag file after the
    /// real folder.
    pub fn load_folder_at(&mut self, path: &Path, now: Instant) -> Result<&PairSet> {
        let path = &std::fs::canonicalize(path)?;
        log::info!("Loading folder {:?}", path);
        let names = list_image_files(path, &self.config.preferences.image_extensions)?;
        let pairs = derive_pairs(&names)?;
        let tag_path = sidecar_path(path);
        let file = read_tag_file(&tag_path)?;

        let current = match file.open_pair() {
            Some(id) => pairs.index_of(id).unwrap_or_else(|| {
                log::warn!("Last open pair '{}' is not in this folder", id);
                0
            }),
            None => 0,
        };
        let entry = pairs.get(current).ok_or(SessionError::NoImages)?;
        let sizes = read_pair_sizes(path, entry)?;

        // Validation done; replace the session
        self.timers.cancel_all();
        self.auto_save.reset();
        self.tags = TagStore::from_map(file.all_tags);
        self.folder = Some(OpenFolder {
            path: path.to_path_buf(),
            tag_path,
            pairs,
            current,
        });
        self.enter_pair(current, sizes);
        self.start_timers(now);

        match &self.folder {
            Some(open) => {
                log::info!(
                    "Loaded {} pairs with {} tags from {:?}",
                    open.pairs.len(),
                    self.tags.total(),
                    open.path
                );
                Ok(&open.pairs)
            }
            None => Err(SessionError::NotLoaded),
        }
    }

    /// Open the pair with id `id`.
    pub fn select_pair(&mut self, id: &str) -> Result<()> {
        let pairs = self.pairs().ok_or(SessionError::NotLoaded)?;
        let index = pairs
            .index_of(id)
            .ok_or_else(|| SessionError::unknown_pair(id))?;
        self.open_pair(index)
    }

    /// Open the previous pair. Returns false at the first pair.
    pub fn prev(&mut self) -> Result<bool> {
        match self.current_index() {
            Some(index) if index > 0 => self.open_pair(index - 1).map(|()| true),
            _ => Ok(false),
        }
    }

    /// Open the next pair. Returns false at the last pair.
    pub fn next(&mut self) -> Result<bool> {
        if !self.can_next() {
            return Ok(false);
        }
        match self.current_index() {
            Some(index) => self.open_pair(index + 1).map(|()| true),
            None => Ok(false),
        }
    }

    /// Whether a previous pair exists.
    pub fn can_prev(&self) -> bool {
        self.current_index().is_some_and(|index| index > 0)
    }

    /// Whether a next pair exists.
    pub fn can_next(&self) -> bool {
        self.folder
            .as_ref()
            .is_some_and(|open| open.current + 1 < open.pairs.len())
    }

    fn open_pair(&mut self, index: usize) -> Result<()> {
        let open = self.folder.as_ref().ok_or(SessionError::NotLoaded)?;
        let entry = open
            .pairs
            .get(index)
            .ok_or_else(|| SessionError::index_out_of_range(index, open.pairs.len()))?;
        let sizes = read_pair_sizes(&open.path, entry)?;

        self.enter_pair(index, sizes);
        self.start_timers(Instant::now());
        Ok(())
    }

    fn enter_pair(&mut self, index: usize, sizes: [(u32, u32); 2]) {
        if let Some(open) = self.folder.as_mut() {
            open.current = index;
        }
        self.viewports = sizes.map(|(width, height)| Viewport::new(width, height));
        self.tags.reset_transient();
        log::debug!(
            "Opened pair {} ({} tags)",
            self.current_pair_id().unwrap_or_default(),
            self.tags().len()
        );
    }

    // =========================================================================
    // Tagging
    // =========================================================================

    /// Handle a pointer press at `viewport_point` on `side`.
    ///
    /// Ignored when no folder is loaded, in pan mode, or outside the image.
    pub fn begin_point(&mut self, side: Side, viewport_point: Point) -> PointOutcome {
        if self.mode == InteractionMode::Pan {
            return PointOutcome::Ignored;
        }
        let Some(pair_id) = self.current_pair().map(|pair| pair.id.clone()) else {
            return PointOutcome::Ignored;
        };
        let viewport = self.viewports[side.index()];
        let Some(image_point) = viewport.to_image(viewport_point) else {
            log::trace!("Press outside {} ignored", side.name());
            return PointOutcome::Ignored;
        };
        self.tags
            .begin_point(&pair_id, side, image_point, viewport.zoom_index())
    }

    /// Commit the pending points as a new tag of the open pair.
    pub fn confirm_pending(&mut self) -> Option<usize> {
        let pair_id = self.current_pair_id()?.to_string();
        let index = self.tags.commit_if_ready(&pair_id)?;
        self.auto_save.mark_dirty();
        Some(index)
    }

    /// Undo gesture on `side`.
    pub fn cancel_pending(&mut self, side: Side) -> CancelOutcome {
        self.tags.cancel_pending(side)
    }

    /// Delete the tag at `index` of the open pair.
    pub fn delete_tag(&mut self, index: usize) -> Result<TagPair> {
        let pair_id = self.require_pair_id()?;
        let removed = self.tags.delete_from(&pair_id, index)?;
        self.auto_save.mark_dirty();
        Ok(removed)
    }

    /// Delete every tag of the open pair. The host confirms with the user first.
    pub fn clear_all_tags(&mut self) -> Result<usize> {
        let pair_id = self.require_pair_id()?;
        let removed = self.tags.clear_all(&pair_id);
        if removed > 0 {
            self.auto_save.mark_dirty();
        }
        Ok(removed)
    }

    /// Select the tag at `index` of the open pair on both sides.
    pub fn select_tag(&mut self, index: usize) -> Result<()> {
        let pair_id = self.require_pair_id()?;
        self.tags.select(&pair_id, index)
    }

    pub fn clear_selection(&mut self) {
        self.tags.clear_selection();
    }

    fn require_pair_id(&self) -> Result<String> {
        self.current_pair_id()
            .map(str::to_string)
            .ok_or(SessionError::NotLoaded)
    }

    // =========================================================================
    // View
    // =========================================================================

    /// Zoom one side by one step around `anchor`. Returns false at the ends of
    /// the zoom table or when nothing is loaded.
    pub fn zoom(&mut self, side: Side, direction: ZoomDirection, anchor: Point) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let viewport = &mut self.viewports[side.index()];
        let zoomed = viewport.zoom_at(direction, anchor);
        if zoomed == *viewport {
            return false;
        }
        *viewport = zoomed;
        log::debug!(
            "{} zoomed to {:.2}x at ({:.1}, {:.1})",
            side.name(),
            zoomed.scale(),
            anchor.x,
            anchor.y
        );
        true
    }

    /// Move one side's image by `(dx, dy)` viewport pixels.
    pub fn pan(&mut self, side: Side, dx: f64, dy: f64) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let viewport = &mut self.viewports[side.index()];
        *viewport = viewport.pan_by(dx, dy);
        log::trace!("{} panned by ({:.1}, {:.1})", side.name(), dx, dy);
        true
    }

    /// Markers to draw on `side`: every tag of the open pair, then the pending point.
    pub fn render_state(&self, side: Side) -> Vec<Marker> {
        if !self.is_loaded() {
            return Vec::new();
        }
        let viewport = &self.viewports[side.index()];
        let zoom_index = viewport.zoom_index();
        let selection = self.tags.selection();

        let mut markers: Vec<Marker> = self
            .tags()
            .iter()
            .enumerate()
            .map(|(index, tag)| {
                let selected = selection == Some(index);
                Marker {
                    index: Some(index),
                    position: viewport.to_viewport(tag.point(side)),
                    fill: self.palette.color_for(index),
                    outline: if selected { Rgb::WHITE } else { Rgb::BLACK },
                    selected,
                    pending: false,
                    diameter: marker_diameter(zoom_index, selected),
                    outline_width: marker::OUTLINE_WIDTH,
                }
            })
            .collect();

        if let Some(point) = self.tags.pending(side) {
            markers.push(Marker {
                index: None,
                position: viewport.to_viewport(point),
                fill: Rgb::BLACK,
                outline: Rgb::WHITE,
                selected: false,
                pending: true,
                diameter: marker_diameter(zoom_index, false),
                outline_width: marker::OUTLINE_WIDTH,
            });
        }
        markers
    }

    /// Tag list labels of the open pair.
    pub fn tag_labels(&self) -> Vec<String> {
        match self.current_pair_id() {
            Some(id) => self.tags.labels(id),
            None => Vec::new(),
        }
    }

    /// Readout of the pending point on `side`.
    pub fn pending_readout(&self, side: Side) -> Option<String> {
        self.tags
            .pending(side)
            .map(|point| format!("({:.1}, {:.1})", point.x, point.y))
    }

    /// Palette color of the most recently committed tag of the open pair.
    pub fn last_tag_color(&self) -> Option<Rgb> {
        let len = self.tags().len();
        (len > 0).then(|| self.palette.color_for(len - 1))
    }

    /// Status for a pointer at `position` over `side` (or over neither).
    pub fn cursor_status(&self, side: Option<Side>, position: Point) -> CursorStatus {
        match side.filter(|_| self.is_loaded()) {
            Some(side) => CursorStatus {
                side: Some(side),
                readout: Some(self.viewports[side.index()].cursor_readout(position)),
                cursor: match self.mode {
                    InteractionMode::Tag => CursorStyle::Crosshair,
                    InteractionMode::Pan => CursorStyle::Move,
                },
            },
            None => CursorStatus {
                side: None,
                readout: None,
                cursor: CursorStyle::Arrow,
            },
        }
    }

    pub fn set_mode(&mut self, mode: InteractionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        log::debug!("Interaction mode: {:?}", mode);
        true
    }

    /// Treat held modifiers as released.
    pub fn focus_lost(&mut self) -> bool {
        self.set_mode(InteractionMode::Tag)
    }

    // =========================================================================
    // Saving and timers
    // =========================================================================

    /// Write the tag file of the loaded folder.
    ///
    /// Returns `Ok(false)` when nothing is loaded. A failure is logged and
    /// returned; the session stays usable and the next tick retries.
    pub fn tick_save(&mut self) -> Result<bool> {
        let Some(open) = self.folder.as_ref() else {
            return Ok(false);
        };
        let open_pair = open.current_pair().map(|pair| pair.id.as_str());
        let file = TagFile::new(open_pair.unwrap_or_default(), self.tags.all().clone());
        match write_tag_file(&open.tag_path, &file) {
            Ok(()) => {
                self.auto_save.mark_saved();
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to save tags to {:?}: {}", open.tag_path, e);
                self.auto_save.mark_save_failed();
                Err(e)
            }
        }
    }

    fn start_timers(&mut self, now: Instant) {
        self.timers.cancel_all();
        let prefs = &self.config.preferences;
        self.timers
            .schedule(TimerKind::Save, prefs.save_interval(), now);
        self.timers
            .schedule(TimerKind::Poll, prefs.poll_interval(), now);
    }

    fn run_timer(&mut self, kind: TimerKind) -> TimerEvent {
        match kind {
            TimerKind::Save => match self.tick_save() {
                Ok(_) => TimerEvent::Saved,
                Err(e) => TimerEvent::SaveFailed(e),
            },
            TimerKind::Poll => TimerEvent::PollDue,
        }
    }

    /// Run every timer due at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerEvent> {
        self.timers
            .fire_due(now)
            .into_iter()
            .map(|kind| self.run_timer(kind))
            .collect()
    }

    /// Run the timer behind `token`, for hosts that schedule each timer
    /// themselves. Stale tokens from a replaced folder or pair do nothing.
    pub fn on_timer(&mut self, token: TimerToken, now: Instant) -> Option<TimerEvent> {
        self.timers
            .fire(token, now)
            .then(|| self.run_timer(token.kind()))
    }

    /// Token of the running timer of `kind`.
    pub fn timer_token(&self, kind: TimerKind) -> Option<TimerToken> {
        self.timers.token(kind)
    }

    /// When the next timer is due.
    pub fn next_timer_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    /// Stop the timers, write the tag file one last time and unload.
    ///
    /// When the final write fails the session stays loaded with its timers
    /// running again, so nothing is lost and the host can retry.
    pub fn close(&mut self) -> Result<()> {
        self.timers.cancel_all();
        if let Err(e) = self.tick_save() {
            self.start_timers(Instant::now());
            return Err(e);
        }
        self.folder = None;
        self.tags = TagStore::new();
        self.viewports = [Viewport::default(); 2];
        self.auto_save.reset();
        log::info!("Session closed");
        Ok(())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatch a message to the matching operation.
    pub fn apply(&mut self, message: Message) -> Result<Outcome> {
        let outcome = match message {
            Message::LoadFolder(path) => {
                let pairs = self.load_folder(&path)?.len();
                Outcome::Loaded {
                    pairs,
                    open_pair: self.current_pair_id().unwrap_or_default().to_string(),
                }
            }
            Message::SelectPair(id) => {
                self.select_pair(&id)?;
                Outcome::PairOpened { id }
            }
            Message::PrevPair => self.navigated(Self::prev)?,
            Message::NextPair => self.navigated(Self::next)?,
            Message::BeginPoint { side, position } => {
                Outcome::Point(self.begin_point(side, position))
            }
            Message::ConfirmPending => match self.confirm_pending() {
                Some(index) => Outcome::Committed(index),
                None => Outcome::Unchanged,
            },
            Message::CancelPending(side) => Outcome::Cancelled(self.cancel_pending(side)),
            Message::DeleteTag(index) => Outcome::Deleted(self.delete_tag(index)?),
            Message::ClearAllTags => Outcome::Cleared(self.clear_all_tags()?),
            Message::SelectTag(index) => {
                self.select_tag(index)?;
                Outcome::Selected(index)
            }
            Message::ClearSelection => {
                self.clear_selection();
                Outcome::SelectionCleared
            }
            Message::Zoom {
                side,
                direction,
                anchor,
            } => changed(self.zoom(side, direction, anchor), Outcome::ViewChanged(side)),
            Message::Pan { side, dx, dy } => {
                changed(self.pan(side, dx, dy), Outcome::ViewChanged(side))
            }
            Message::SaveTick => Outcome::Saved(self.tick_save()?),
            Message::SetMode(mode) => changed(self.set_mode(mode), Outcome::ModeChanged(mode)),
            Message::FocusLost => changed(
                self.focus_lost(),
                Outcome::ModeChanged(InteractionMode::Tag),
            ),
            Message::PollCursor { side, position } => {
                Outcome::Cursor(self.cursor_status(side, position))
            }
        };
        Ok(outcome)
    }

    fn navigated(&mut self, step: fn(&mut Self) -> Result<bool>) -> Result<Outcome> {
        if step(self)? {
            Ok(Outcome::PairOpened {
                id: self.current_pair_id().unwrap_or_default().to_string(),
            })
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    /// Translate a key press or release through the configured bindings.
    pub fn message_for_key(&self, key: Key, pressed: bool) -> Option<Message> {
        let action = self.config.keybindings.action_for_key(key)?;
        match (action, pressed) {
            (KeyAction::PanMode, true) => Some(Message::SetMode(InteractionMode::Pan)),
            (KeyAction::PanMode, false) => Some(Message::SetMode(InteractionMode::Tag)),
            (_, false) => None,
            (KeyAction::PrevPair, true) => Some(Message::PrevPair),
            (KeyAction::NextPair, true) => Some(Message::NextPair),
            (KeyAction::ConfirmPending, true) => Some(Message::ConfirmPending),
            (KeyAction::DeleteSelected, true) => self.selection().map(Message::DeleteTag),
        }
    }

    /// Handle a key press or release.
    pub fn handle_key(&mut self, key: Key, pressed: bool) -> Result<Outcome> {
        match self.message_for_key(key, pressed) {
            Some(message) => self.apply(message),
            None => Ok(Outcome::Unchanged),
        }
    }
}

fn changed(did_change: bool, outcome: Outcome) -> Outcome {
    if did_change { outcome } else { Outcome::Unchanged }
}

/// Pixel sizes of a pair's two images, read from the file headers.
fn read_pair_sizes(folder: &Path, entry: &PairEntry) -> Result<[(u32, u32); 2]> {
    let (left, right) = entry.paths_in(folder);
    let read = |path: PathBuf| {
        image::image_dimensions(&path).map_err(|source| SessionError::image_read(path, source))
    };
    Ok([read(left)?, read(right)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
        image::RgbImage::new(width, height)
            .save(dir.join(name))
            .unwrap();
    }

    /// Folder with pairs `a` and `b`; left images 200x100, right 120x80.
    fn folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for stem in ["a", "b"] {
            write_image(dir.path(), &format!("{stem}_1.png"), 200, 100);
            write_image(dir.path(), &format!("{stem}_2.png"), 120, 80);
        }
        dir
    }

    fn loaded(dir: &Path) -> Session {
        let mut session = Session::new();
        session.load_folder(dir).unwrap();
        session
    }

    fn tag_at(session: &mut Session, left: (f64, f64), right: (f64, f64)) -> usize {
        session.begin_point(Side::Left, Point::new(left.0, left.1));
        session.begin_point(Side::Right, Point::new(right.0, right.1));
        session.confirm_pending().unwrap()
    }

    #[test]
    fn test_load_folder_opens_first_pair() {
        let dir = folder();
        let mut session = Session::new();
        let pairs = session.load_folder(dir.path()).unwrap();
        assert_eq!(pairs.len(), 2);

        assert_eq!(session.current_pair_id(), Some("a"));
        assert_eq!(session.pair_ids(), vec!["a", "b"]);
        assert_eq!(session.viewport(Side::Left).image_size(), (200, 100));
        assert_eq!(session.viewport(Side::Right).image_size(), (120, 80));
        assert!(!session.can_prev());
        assert!(session.can_next());
        assert!(session.timer_token(TimerKind::Save).is_some());
        assert!(session.timer_token(TimerKind::Poll).is_some());
    }

    #[test]
    fn test_load_folder_restores_open_pair_and_tags() {
        let dir = folder();
        std::fs::write(
            sidecar_path(dir.path()),
            r#"{"open_pair_name": "b", "timestamp": "", "all_tags": {"b": [[[1, 2], [3, 4]]], "gone": [[[5, 6], [7, 8]]]}}"#,
        )
        .unwrap();

        let session = loaded(dir.path());
        assert_eq!(session.current_pair_id(), Some("b"));
        assert_eq!(session.tag_labels(), vec!["1. [1,2] - [3,4]"]);
        // Tags of pairs missing from the folder are kept
        assert_eq!(session.tag_store().len("gone"), 1);
    }

    #[test]
    fn test_unknown_open_pair_falls_back_to_first() {
        let dir = folder();
        std::fs::write(
            sidecar_path(dir.path()),
            r#"{"open_pair_name": "zzz", "all_tags": {}}"#,
        )
        .unwrap();
        assert_eq!(loaded(dir.path()).current_pair_id(), Some("a"));
    }

    #[test]
    fn test_rejected_folder_keeps_session() {
        let good = folder();
        let mut session = loaded(good.path());
        tag_at(&mut session, (10.0, 10.0), (20.0, 20.0));

        let bad = tempfile::tempdir().unwrap();
        write_image(bad.path(), "x_1.png", 4, 4);
        let err = session.load_folder(bad.path()).unwrap_err();
        assert!(matches!(err, SessionError::OddCount { count: 1 }));
        assert!(err.is_folder_rejection());

        let malformed = folder();
        std::fs::write(sidecar_path(malformed.path()), r#"{"open_pair_name": "a"}"#).unwrap();
        assert!(matches!(
            session.load_folder(malformed.path()),
            Err(SessionError::MalformedTagFile { .. })
        ));

        let good_path = std::fs::canonicalize(good.path()).unwrap();
        assert_eq!(session.folder(), Some(good_path.as_path()));
        assert_eq!(session.tags().len(), 1);
    }

    #[test]
    fn test_unreadable_image_rejects_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_1.png"), b"not an image").unwrap();
        std::fs::write(dir.path().join("a_2.png"), b"not an image").unwrap();

        let mut session = Session::new();
        assert!(matches!(
            session.load_folder(dir.path()),
            Err(SessionError::ImageRead { .. })
        ));
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_navigation_clamps_and_resets_view() {
        let dir = folder();
        let mut session = loaded(dir.path());

        assert!(!session.prev().unwrap());
        assert!(session.zoom(Side::Left, ZoomDirection::In, Point::new(10.0, 10.0)));
        session.begin_point(Side::Left, Point::new(5.0, 5.0));

        assert!(session.next().unwrap());
        assert_eq!(session.current_pair_id(), Some("b"));
        assert_eq!(*session.viewport(Side::Left), Viewport::new(200, 100));
        assert_eq!(session.pending(Side::Left), None);
        assert!(!session.next().unwrap());
        assert!(!session.can_next());

        session.select_pair("a").unwrap();
        assert_eq!(session.current_index(), Some(0));
        assert!(matches!(
            session.select_pair("nope"),
            Err(SessionError::UnknownPair { .. })
        ));
    }

    #[test]
    fn test_unloaded_session() {
        let mut session = Session::new();
        assert_eq!(
            session.begin_point(Side::Left, Point::new(1.0, 1.0)),
            PointOutcome::Ignored
        );
        assert_eq!(session.confirm_pending(), None);
        assert!(!session.prev().unwrap());
        assert!(!session.zoom(Side::Left, ZoomDirection::In, Point::default()));
        assert!(session.render_state(Side::Left).is_empty());
        assert!(matches!(session.delete_tag(0), Err(SessionError::NotLoaded)));
        assert!(matches!(session.select_pair("a"), Err(SessionError::NotLoaded)));
        assert!(!session.tick_save().unwrap());
    }

    #[test]
    fn test_tag_lifecycle() {
        let dir = folder();
        let mut session = loaded(dir.path());

        assert_eq!(
            session.begin_point(Side::Left, Point::new(10.4, 20.6)),
            PointOutcome::Pending
        );
        assert_eq!(session.pending_readout(Side::Left).as_deref(), Some("(10.4, 20.6)"));
        assert_eq!(session.confirm_pending(), None);
        assert_eq!(
            session.begin_point(Side::Right, Point::new(30.0, 40.0)),
            PointOutcome::Pending
        );
        assert_eq!(session.confirm_pending(), Some(0));
        assert!(session.auto_save().is_dirty());
        assert_eq!(session.tag_labels(), vec!["1. [10,21] - [30,40]"]);
        assert_eq!(session.last_tag_color(), Some(session.palette().color_for(0)));

        // Press on the committed left point selects it
        assert_eq!(
            session.begin_point(Side::Left, Point::new(11.0, 21.0)),
            PointOutcome::Selected(0)
        );
        assert_eq!(session.selection(), Some(0));

        let removed = session.delete_tag(0).unwrap();
        assert_eq!(removed.left, Point::new(10.4, 20.6));
        assert_eq!(session.selection(), None);
        assert!(matches!(
            session.delete_tag(0),
            Err(SessionError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_press_outside_image_ignored() {
        let dir = folder();
        let mut session = loaded(dir.path());
        assert_eq!(
            session.begin_point(Side::Left, Point::new(200.0, 50.0)),
            PointOutcome::Ignored
        );
        assert_eq!(
            session.begin_point(Side::Right, Point::new(-1.0, 5.0)),
            PointOutcome::Ignored
        );
    }

    #[test]
    fn test_pan_mode_blocks_points() {
        let dir = folder();
        let mut session = loaded(dir.path());
        assert!(session.set_mode(InteractionMode::Pan));
        assert_eq!(
            session.begin_point(Side::Left, Point::new(5.0, 5.0)),
            PointOutcome::Ignored
        );
        assert_eq!(
            session.cursor_status(Some(Side::Left), Point::new(5.0, 5.0)).cursor,
            CursorStyle::Move
        );
        assert!(session.focus_lost());
        assert_eq!(session.mode(), InteractionMode::Tag);
    }

    #[test]
    fn test_press_maps_through_viewport() {
        let dir = folder();
        let mut session = loaded(dir.path());
        session.pan(Side::Left, 10.0, 20.0);
        session.zoom(Side::Left, ZoomDirection::In, Point::new(10.0, 20.0));

        // Origin stays at the anchor; scale is 1.5
        session.begin_point(Side::Left, Point::new(25.0, 35.0));
        let pending = session.pending(Side::Left).unwrap();
        assert!(approx_eq(pending.x, 10.0));
        assert!(approx_eq(pending.y, 10.0));
    }

    #[test]
    fn test_render_state() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (10.0, 10.0), (20.0, 20.0));
        tag_at(&mut session, (50.0, 50.0), (60.0, 60.0));
        session.begin_point(Side::Right, Point::new(100.0, 70.0));
        session.select_tag(1).unwrap();
        session.pan(Side::Right, 5.0, -5.0);

        let left = session.render_state(Side::Left);
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].position, Point::new(10.0, 10.0));
        assert!(!left[0].selected);
        assert!(left[1].selected);
        assert_eq!(left[1].outline, Rgb::WHITE);
        assert_eq!(left[1].fill, session.palette().color_for(1));
        assert!(left[1].diameter > left[0].diameter);

        let right = session.render_state(Side::Right);
        assert_eq!(right.len(), 3);
        assert_eq!(right[0].position, Point::new(25.0, 15.0));
        let pending = right[2];
        assert!(pending.pending);
        assert_eq!(pending.index, None);
        assert_eq!(pending.position, Point::new(105.0, 65.0));
        assert_eq!(pending.fill, Rgb::BLACK);
        assert!(right.iter().all(|m| m.outline_width == marker::OUTLINE_WIDTH));
    }

    #[test]
    fn test_clear_all_tags() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (10.0, 10.0), (20.0, 20.0));
        tag_at(&mut session, (50.0, 50.0), (60.0, 60.0));
        session.begin_point(Side::Left, Point::new(90.0, 90.0));

        assert_eq!(session.clear_all_tags().unwrap(), 2);
        assert!(session.tags().is_empty());
        assert_eq!(session.pending(Side::Left), None);
        assert_eq!(session.last_tag_color(), None);
    }

    #[test]
    fn test_tick_save_writes_sidecar() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (1.5, 2.5), (3.0, 4.0));
        session.next().unwrap();

        assert!(session.tick_save().unwrap());
        assert!(!session.auto_save().is_dirty());

        let file = read_tag_file(&sidecar_path(dir.path())).unwrap();
        assert_eq!(file.open_pair(), Some("b"));
        assert_eq!(
            file.all_tags["a"],
            vec![TagPair::new(Point::new(1.5, 2.5), Point::new(3.0, 4.0))]
        );

        let reloaded = loaded(dir.path());
        assert_eq!(reloaded.tag_store().all(), session.tag_store().all());
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = folder();
        let mut session = loaded(dir.path());
        // A directory in place of the tag file makes the write fail
        std::fs::create_dir(sidecar_path(dir.path())).unwrap();

        let start = Instant::now();
        let events = session.tick(start + Duration::from_secs(3));
        assert!(matches!(events[0], TimerEvent::SaveFailed(_)));
        assert_eq!(session.auto_save().consecutive_failures(), 1);

        let events = session.tick(start + Duration::from_secs(6));
        assert!(matches!(events[0], TimerEvent::SaveFailed(_)));
        assert_eq!(session.auto_save().consecutive_failures(), 2);
    }

    #[test]
    fn test_tick_fires_both_timers() {
        let dir = folder();
        let start = Instant::now();
        let mut session = Session::new();
        session.load_folder_at(dir.path(), start).unwrap();

        let events = session.tick(start + Duration::from_millis(100));
        assert!(matches!(events.as_slice(), [TimerEvent::PollDue]));

        let events = session.tick(start + Duration::from_millis(2000));
        assert!(matches!(
            events.as_slice(),
            [TimerEvent::Saved, TimerEvent::PollDue]
        ));
        assert!(sidecar_path(dir.path()).is_file());
    }

    #[test]
    fn test_folder_switch_invalidates_timer_tokens() {
        let first = folder();
        let second = folder();
        let start = Instant::now();
        let mut session = Session::new();
        session.load_folder_at(first.path(), start).unwrap();
        let stale = session.timer_token(TimerKind::Save).unwrap();

        session.load_folder_at(second.path(), start).unwrap();
        assert!(session.on_timer(stale, start + Duration::from_secs(5)).is_none());
        assert!(!sidecar_path(first.path()).exists());

        let current = session.timer_token(TimerKind::Save).unwrap();
        assert!(matches!(
            session.on_timer(current, start + Duration::from_secs(5)),
            Some(TimerEvent::Saved)
        ));
        assert!(sidecar_path(second.path()).is_file());
    }

    #[test]
    fn test_close_saves_and_stops_timers() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (1.0, 1.0), (2.0, 2.0));

        session.close().unwrap();
        assert!(!session.is_loaded());
        assert_eq!(session.next_timer_due(), None);
        assert_eq!(read_tag_file(&sidecar_path(dir.path())).unwrap().total_tags(), 1);
    }

    #[test]
    fn test_close_keeps_session_when_final_save_fails() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (1.0, 1.0), (2.0, 2.0));
        std::fs::create_dir(sidecar_path(dir.path())).unwrap();

        assert!(session.close().is_err());
        assert!(session.is_loaded());
        assert_eq!(session.tags().len(), 1);
        assert!(session.timer_token(TimerKind::Save).is_some());
        assert!(session.next_timer_due().is_some());

        // Once the path is writable again, closing succeeds and keeps the tag
        std::fs::remove_dir(sidecar_path(dir.path())).unwrap();
        session.close().unwrap();
        assert!(!session.is_loaded());
        assert_eq!(read_tag_file(&sidecar_path(dir.path())).unwrap().total_tags(), 1);
    }

    #[test]
    fn test_load_folder_names_tag_file_after_real_folder() {
        let dir = folder();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        // No final component to name the tag file after
        let indirect = dir.path().join("nested").join("..");

        let mut session = loaded(&indirect);
        let expected = sidecar_path(&std::fs::canonicalize(dir.path()).unwrap());
        assert_eq!(session.tag_file_path(), Some(expected.as_path()));
        assert!(!expected.ends_with("tags__.json"));

        session.tick_save().unwrap();
        assert!(sidecar_path(dir.path()).is_file());
    }

    #[test]
    fn test_apply_messages() {
        let dir = folder();
        let mut session = Session::new();

        assert_eq!(
            session
                .apply(Message::LoadFolder(dir.path().to_path_buf()))
                .unwrap(),
            Outcome::Loaded {
                pairs: 2,
                open_pair: "a".to_string()
            }
        );
        assert_eq!(
            session.apply(Message::NextPair).unwrap(),
            Outcome::PairOpened { id: "b".to_string() }
        );
        assert_eq!(session.apply(Message::NextPair).unwrap(), Outcome::Unchanged);
        assert_eq!(
            session
                .apply(Message::BeginPoint {
                    side: Side::Left,
                    position: Point::new(3.0, 3.0)
                })
                .unwrap(),
            Outcome::Point(PointOutcome::Pending)
        );
        assert_eq!(
            session.apply(Message::CancelPending(Side::Left)).unwrap(),
            Outcome::Cancelled(CancelOutcome::PendingCleared)
        );
        assert_eq!(
            session
                .apply(Message::Zoom {
                    side: Side::Right,
                    direction: ZoomDirection::Out,
                    anchor: Point::default()
                })
                .unwrap(),
            Outcome::ViewChanged(Side::Right)
        );
        assert!(matches!(
            session.apply(Message::SelectTag(3)),
            Err(SessionError::IndexOutOfRange { .. })
        ));
        assert_eq!(
            session.apply(Message::SaveTick).unwrap(),
            Outcome::Saved(true)
        );
        assert_eq!(
            session
                .apply(Message::PollCursor {
                    side: Some(Side::Right),
                    position: Point::new(8.5, 0.0)
                })
                .unwrap(),
            Outcome::Cursor(CursorStatus {
                side: Some(Side::Right),
                readout: Some("10.0, 0.0".to_string()),
                cursor: CursorStyle::Crosshair,
            })
        );
    }

    #[test]
    fn test_handle_key() {
        let dir = folder();
        let mut session = loaded(dir.path());
        tag_at(&mut session, (10.0, 10.0), (20.0, 20.0));

        // Nothing selected: Delete does nothing
        assert_eq!(session.handle_key(Key::Delete, true).unwrap(), Outcome::Unchanged);
        session.select_tag(0).unwrap();
        assert!(matches!(
            session.handle_key(Key::Delete, true).unwrap(),
            Outcome::Deleted(_)
        ));

        assert_eq!(
            session.handle_key(Key::Control, true).unwrap(),
            Outcome::ModeChanged(InteractionMode::Pan)
        );
        assert_eq!(
            session.handle_key(Key::Control, false).unwrap(),
            Outcome::ModeChanged(InteractionMode::Tag)
        );

        assert_eq!(
            session.handle_key(Key::Char('x'), true).unwrap(),
            Outcome::PairOpened { id: "b".to_string() }
        );
        assert_eq!(session.handle_key(Key::Char('x'), false).unwrap(), Outcome::Unchanged);
        assert_eq!(
            session.handle_key(Key::Left, true).unwrap(),
            Outcome::PairOpened { id: "a".to_string() }
        );

        session.begin_point(Side::Left, Point::new(1.0, 1.0));
        session.begin_point(Side::Right, Point::new(1.0, 1.0));
        assert_eq!(
            session.handle_key(Key::Space, true).unwrap(),
            Outcome::Committed(0)
        );
    }
}
