//! Piano roll: note entries per clip, scope, selection and layout

mod background;
mod input;
mod listener;
mod types;

use std::collections::BTreeSet;

use helio_core::{Clip, Colour, Note, Project, Track, TrackId, BEATS_PER_BAR, NUM_KEYS};
use tracing::debug;

use crate::geometry::{Bounds, Point, RollGeometry};
use crate::highlighting::BackgroundCache;
use crate::index::{NoteEntry, PatternMap};
use crate::note_component::NoteComponent;
use crate::selection::Selection;
use crate::theme::RollTheme;
use crate::view_state::RollViewState;

pub use background::BackgroundSpan;
pub use types::{ActiveRange, EditMode, HelperBand, RollAction, RollCommand};
use types::{Gesture, NewNoteDrag};

pub const DEFAULT_NOTE_LENGTH: f32 = 0.25;
pub const DEFAULT_NOTE_VOLUME: f32 = 0.25;

/// Bars kept after the end of the project
const TRAILING_BARS: f32 = 8.0;

/// Seconds for a note to fade fully in or out
const FADE_SECONDS: f32 = 0.15;

/// Piano roll state.
///
/// Mirrors the project through [`helio_core::ProjectListener`]: every note of
/// every track has one [`NoteComponent`] per clip of its track. Notifications
/// only queue relayouts; [`PianoRoll::handle_async_update`] applies them.
pub struct PianoRoll {
    geometry: RollGeometry,
    pattern_map: PatternMap<NoteComponent>,
    backgrounds: BackgroundCache,
    selection: Selection,
    /// Track and clip being edited
    active_track: Option<TrackId>,
    active_clip: Option<Clip>,
    active_range: Option<ActiveRange>,
    edit_mode: EditMode,
    /// A click requested a note; the next active note added becomes `new_note_drag`
    add_new_note_mode: bool,
    new_note_drag: Option<NewNoteDrag>,
    new_note_volume: f32,
    gesture: Gesture,
    ghost_notes: Vec<NoteComponent>,
    helpers: Option<HelperBand>,
    batch_repaint: BTreeSet<(Clip, Note)>,
    needs_update: bool,
    fades_pending: bool,
    fading_out: Vec<NoteComponent>,
    project_beat_range: (f32, f32),
    view_beat_range: (f32, f32),
}

impl Default for PianoRoll {
    fn default() -> Self {
        Self::new(RollTheme::default())
    }
}

impl PianoRoll {
    pub fn new(theme: RollTheme) -> Self {
        Self {
            geometry: RollGeometry::new(),
            pattern_map: PatternMap::new(),
            backgrounds: BackgroundCache::new(theme),
            selection: Selection::new(),
            active_track: None,
            active_clip: None,
            active_range: None,
            edit_mode: EditMode::default(),
            add_new_note_mode: false,
            new_note_drag: None,
            new_note_volume: DEFAULT_NOTE_VOLUME,
            gesture: Gesture::Idle,
            ghost_notes: Vec::new(),
            helpers: None,
            batch_repaint: BTreeSet::new(),
            needs_update: false,
            fades_pending: false,
            fading_out: Vec::new(),
            project_beat_range: (0.0, BEATS_PER_BAR),
            view_beat_range: (0.0, BEATS_PER_BAR * 8.0),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn geometry(&self) -> &RollGeometry {
        &self.geometry
    }

    pub fn backgrounds(&self) -> &BackgroundCache {
        &self.backgrounds
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_track(&self) -> Option<TrackId> {
        self.active_track
    }

    pub fn active_clip(&self) -> Option<Clip> {
        self.active_clip
    }

    pub fn active_range(&self) -> Option<ActiveRange> {
        self.active_range
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit_mode = mode;
    }

    pub fn set_default_note_volume(&mut self, volume: f32) {
        self.new_note_volume = volume.clamp(0.0, 1.0);
    }

    pub fn components(&self) -> impl Iterator<Item = &NoteComponent> {
        self.pattern_map.entries()
    }

    pub fn component(&self, clip: &Clip, note: &Note) -> Option<&NoteComponent> {
        self.pattern_map.get(clip, note)
    }

    pub fn num_components(&self) -> usize {
        self.pattern_map.len()
    }

    pub fn ghost_notes(&self) -> &[NoteComponent] {
        &self.ghost_notes
    }

    pub fn helpers(&self) -> Option<HelperBand> {
        self.helpers
    }

    /// Components that left the document and are still fading out
    pub fn fading_out(&self) -> &[NoteComponent] {
        &self.fading_out
    }

    /// Rectangle of the lasso being dragged
    pub fn lasso_area(&self) -> Option<Bounds> {
        match self.gesture {
            Gesture::Lasso { origin, current } => Some(Bounds::from_corners(origin, current)),
            _ => None,
        }
    }

    pub fn is_drawing_note(&self) -> bool {
        self.new_note_drag.is_some()
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn project_beat_range(&self) -> (f32, f32) {
        self.project_beat_range
    }

    pub fn view_beat_range(&self) -> (f32, f32) {
        self.view_beat_range
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Drop everything and rebuild from the project. The editable scope is
    /// cleared too; callers pick a new one with `set_editable_scope`.
    pub fn reload_roll_content(&mut self, project: &Project) {
        self.deselect_all();
        self.cancel_gestures();
        self.active_track = None;
        self.active_clip = None;
        self.backgrounds.clear();
        self.pattern_map.clear();
        self.batch_repaint.clear();
        self.fading_out.clear();
        self.needs_update = false;

        for track in project.tracks() {
            self.load_track(track);
        }
        self.update_active_range_indicator(project);
        debug!(entries = self.pattern_map.len(), schemes = self.backgrounds.len(), "Reloaded roll content");
    }

    fn load_track(&mut self, track: &Track) {
        let (active_track, active_clip) = (self.active_track, self.active_clip);
        let geometry = &self.geometry;
        self.pattern_map.load_track(track, |note, clip| {
            let active = active_track == Some(note.track) && active_clip == Some(*clip);
            let mut component = NoteComponent::new(*note, *clip, track.colour, active);
            component.set_bounds(entry_bounds(geometry, note, clip));
            component
        });

        for key in track.key_signatures() {
            self.backgrounds.ensure_scheme(key.root_key, &key.scale);
        }
    }

    // ------------------------------------------------------------------
    // Editable scope
    // ------------------------------------------------------------------

    /// Make `clip` of `track` the edited scope. Entries outside it become
    /// inactive; optionally zooms to the notes inside it.
    pub fn set_editable_scope(&mut self, project: &Project, track: TrackId, clip: &Clip, zoom_to_area: bool) {
        self.deselect_all();
        self.cancel_gestures();
        self.active_track = Some(track);
        self.active_clip = Some(*clip);

        let mut area: Option<(i32, i32, f32, f32)> = None;
        for component in self.pattern_map.entries_mut() {
            let active = component.belongs_to(Some(track), Some(clip));
            component.set_active(active);
            if !active {
                continue;
            }
            let note = component.note();
            let (key, first, last) = (note.key, note.beat, note.end_beat());
            area = Some(match area {
                None => (key, key, first, last),
                Some((min_key, max_key, min_beat, max_beat)) => {
                    (min_key.min(key), max_key.max(key), min_beat.min(first), max_beat.max(last))
                }
            });
        }

        self.update_active_range_indicator(project);

        if zoom_to_area {
            if let Some((min_key, max_key, min_beat, max_beat)) = area {
                let min_key = min_key.min(NUM_KEYS - 2);
                let max_key = max_key.max(min_key + 1);
                self.geometry
                    .zoom_to_area(min_key, max_key, min_beat + clip.beat, max_beat + clip.beat);
                self.relayout_all();
            }
        }
    }

    pub(crate) fn update_active_range_indicator(&mut self, project: &Project) {
        self.active_range = match (self.active_track, self.active_clip) {
            (Some(track_id), Some(clip)) => project.get_track(track_id).map(|track| ActiveRange {
                colour: track.colour,
                first_beat: track.first_beat() + clip.beat,
                last_beat: track.last_beat() + clip.beat,
            }),
            _ => None,
        };
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    fn select(&mut self, clip: Clip, note: Note) -> bool {
        match self.pattern_map.get_mut(&clip, &note) {
            Some(component) if component.is_active() => {
                component.set_selected(true);
                self.selection.select(clip, note)
            }
            _ => false,
        }
    }

    pub fn deselect_all(&mut self) {
        for (clip, note) in self.selection.iter() {
            if let Some(component) = self.pattern_map.get_mut(clip, note) {
                component.set_selected(false);
            }
        }
        self.selection.clear();
    }

    pub fn select_all(&mut self) {
        let keys = self.active_keys(|_| true);
        for (clip, note) in keys {
            self.select(clip, note);
        }
    }

    /// Select active entries whose beat lies in `[start_beat, end_beat)`
    pub fn select_events_in_range(&mut self, start_beat: f32, end_beat: f32, clear_others: bool) {
        if clear_others {
            self.deselect_all();
        }
        let keys = self.active_keys(|c| c.beat() >= start_beat && c.beat() < end_beat);
        for (clip, note) in keys {
            self.select(clip, note);
        }
    }

    /// Active entries whose bounds intersect `area`
    pub fn find_lasso_items_in_area(&self, area: &Bounds) -> Vec<(Clip, Note)> {
        self.pattern_map
            .entries()
            .filter(|c| c.is_active() && c.bounds().intersects(area))
            .map(|c| (*c.clip(), *c.note()))
            .collect()
    }

    pub fn select_in_area(&mut self, area: &Bounds, clear_others: bool) {
        if clear_others {
            self.deselect_all();
        }
        for (clip, note) in self.find_lasso_items_in_area(area) {
            self.select(clip, note);
        }
    }

    pub fn selected_notes(&self) -> Vec<Note> {
        self.selection.notes()
    }

    fn active_keys(&self, filter: impl Fn(&NoteComponent) -> bool) -> Vec<(Clip, Note)> {
        self.pattern_map
            .entries()
            .filter(|c| c.is_active() && filter(c))
            .map(|c| (*c.clip(), *c.note()))
            .collect()
    }

    fn selection_bounds(&self) -> Option<Bounds> {
        self.selection
            .iter()
            .filter_map(|(clip, note)| self.pattern_map.get(clip, note))
            .map(NoteComponent::bounds)
            .reduce(|a, b| a.union(&b))
    }

    // ------------------------------------------------------------------
    // Ghost notes and helpers
    // ------------------------------------------------------------------

    pub fn show_ghost_note_for(&mut self, clip: &Clip, note: &Note) {
        if let Some(component) = self.pattern_map.get(clip, note) {
            self.ghost_notes.push(component.clone().into_ghost());
        }
    }

    pub fn hide_all_ghost_notes(&mut self) {
        self.ghost_notes.clear();
    }

    /// Horizontal band over the rows of the selection
    pub fn show_helpers(&mut self) {
        self.helpers = self.selection_bounds().map(|b| HelperBand {
            bounds: Bounds::new(0.0, b.y, self.geometry.width(), b.h),
        });
    }

    pub fn hide_helpers(&mut self) {
        self.helpers = None;
    }

    /// Follow the selection being dragged by `delta_key` rows
    pub fn move_helpers(&mut self, delta_key: i32) {
        let Some(origin) = self.selection_bounds() else {
            return;
        };
        let dy = -(delta_key * self.geometry.row_height()) as f32;
        self.helpers = Some(HelperBand {
            bounds: Bounds::new(0.0, origin.y + dy, self.geometry.width(), origin.h),
        });
    }

    fn cancel_gestures(&mut self) {
        self.add_new_note_mode = false;
        self.new_note_drag = None;
        self.gesture = Gesture::Idle;
        self.hide_all_ghost_notes();
        self.hide_helpers();
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    fn queue_relayout(&mut self, clip: Clip, note: Note) {
        self.batch_repaint.insert((clip, note));
        self.needs_update = true;
    }

    /// Apply queued relayouts; call once per UI tick. Returns how many
    /// entries were laid out.
    pub fn handle_async_update(&mut self) -> usize {
        if !self.needs_update {
            return 0;
        }
        let batch = std::mem::take(&mut self.batch_repaint);
        let mut updated = 0;
        for (clip, note) in &batch {
            if let Some(component) = self.pattern_map.get_mut(clip, note) {
                component.set_bounds(entry_bounds(&self.geometry, note, clip));
                if component.opacity() < 1.0 {
                    self.fades_pending = true;
                }
                updated += 1;
            }
        }
        self.needs_update = false;
        updated
    }

    /// Lay out every entry, e.g. after a zoom
    pub fn relayout_all(&mut self) {
        let geometry = &self.geometry;
        for component in self.pattern_map.entries_mut() {
            component.set_bounds(entry_bounds(geometry, component.note(), component.clip()));
        }
        for ghost in self.ghost_notes.iter_mut() {
            ghost.set_bounds(entry_bounds(geometry, ghost.note(), ghost.clip()));
        }
        self.batch_repaint.clear();
        self.needs_update = false;
        if self.helpers.is_some() {
            self.show_helpers();
        }
    }

    /// Advance fade animations by `dt` seconds. Returns true while any
    /// entry is still fading.
    pub fn advance_fades(&mut self, dt: f32) -> bool {
        if !self.fades_pending && self.fading_out.is_empty() {
            return false;
        }
        let step = dt / FADE_SECONDS;

        let mut pending = false;
        if self.fades_pending {
            for component in self.pattern_map.entries_mut() {
                if component.opacity() < 1.0 {
                    component.set_opacity(component.opacity() + step);
                    pending |= component.opacity() < 1.0;
                }
            }
        }
        self.fades_pending = pending;

        for component in self.fading_out.iter_mut() {
            component.set_opacity(component.opacity() - step);
        }
        self.fading_out.retain(|c| c.opacity() > 0.0);

        self.fades_pending || !self.fading_out.is_empty()
    }

    /// Viewport resized
    pub fn resized(&mut self, width: f32, height: f32) {
        self.geometry.set_viewport_size(width, height);
        self.relayout_all();
    }

    pub fn set_view_position(&mut self, x: f32, y: f32) {
        self.geometry.set_view_position(x, y);
    }

    pub fn set_row_height(&mut self, row_height: i32) -> bool {
        let changed = self.geometry.set_row_height(row_height);
        if changed {
            self.relayout_all();
        }
        changed
    }

    pub fn set_bar_width(&mut self, bar_width: f32) -> bool {
        let changed = self.geometry.set_bar_width(bar_width);
        if changed {
            self.relayout_all();
        }
        changed
    }

    pub fn zoom_relative(&mut self, origin: Point, factor: Point) {
        if self.geometry.zoom_relative(origin, factor) {
            self.relayout_all();
        }
    }

    pub fn zoom_absolute(&mut self, zoom: Point) {
        if self.geometry.zoom_absolute(zoom) {
            self.relayout_all();
        }
    }

    pub fn zoom_to_area(&mut self, min_key: i32, max_key: i32, min_beat: f32, max_beat: f32) {
        self.geometry.zoom_to_area(min_key, max_key, min_beat, max_beat);
        self.relayout_all();
    }

    pub fn zoom_factor_y(&self) -> f32 {
        self.geometry.zoom_factor_y()
    }

    /// Fit the horizontal extent to the project, keeping trailing space.
    /// Entries only move when the first bar does.
    pub(crate) fn update_bar_range(&mut self) {
        let (first_beat, last_beat) = self.project_beat_range;
        let first_bar = (first_beat / BEATS_PER_BAR).floor().min(0.0);
        let last_bar = (last_beat / BEATS_PER_BAR).ceil() + TRAILING_BARS;
        let previous_first_bar = self.geometry.first_bar();
        if self.geometry.set_bar_range(first_bar, last_bar) && previous_first_bar != first_bar {
            self.relayout_all();
        }
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub fn serialize(&self) -> RollViewState {
        let viewport = self.geometry.viewport();
        RollViewState {
            bar_width: self.geometry.bar_width(),
            row_height: self.geometry.row_height(),
            start_bar: self.geometry.bar_at_x(viewport.x),
            end_bar: self.geometry.bar_at_x(viewport.x + viewport.width),
            viewport_position_y: viewport.y,
        }
    }

    pub fn deserialize(&mut self, state: &RollViewState) {
        self.geometry.set_bar_width(state.bar_width);
        self.geometry.set_row_height(state.row_height);
        let x = self.geometry.x_position_by_bar(state.start_bar);
        self.geometry.set_view_position(x, state.viewport_position_y);
        self.relayout_all();
    }
}

/// Factory for entries created by notifications; they start transparent,
/// fade in and get laid out with the next batch
fn new_component_factory(
    active_track: Option<TrackId>,
    active_clip: Option<Clip>,
    colour: Colour,
) -> impl Fn(&Note, &Clip) -> NoteComponent {
    move |note, clip| {
        let active = active_track == Some(note.track) && active_clip == Some(*clip);
        let mut component = NoteComponent::new(*note, *clip, colour, active);
        component.set_opacity(0.0);
        component
    }
}

fn entry_bounds(geometry: &RollGeometry, note: &Note, clip: &Clip) -> Bounds {
    geometry.pixel_bounds(note.key, note.beat + clip.beat, note.length)
}

#[cfg(test)]
mod tests {
    use helio_core::{Broadcast, KeySignatureEvent, MidiEvent, ProjectListener, Scale, TrackKind};

    use super::*;

    fn note(track: TrackId, key: i32, beat: f32) -> Note {
        Note::new(track, key, beat, 1.0, 0.5)
    }

    /// Project with one piano track and a roll loaded from it
    fn setup(notes: &[(i32, f32)]) -> (Project, PianoRoll, TrackId) {
        let mut project = Project::new();
        let events = notes.iter().map(|&(k, b)| note(TrackId(0), k, b).into());
        let track = project
            .import_track(TrackKind::Piano, "Lead", &[0.0], events, &mut ())
            .unwrap();
        let mut roll = PianoRoll::default();
        roll.reload_roll_content(&project);
        (project, roll, track)
    }

    fn first_clip(project: &Project, track: TrackId) -> Clip {
        project.get_track(track).unwrap().pattern()[0]
    }

    /// Every (clip, note) pair of the document has exactly one entry
    fn assert_mirrors(project: &Project, roll: &PianoRoll) {
        let mut expected = 0;
        for track in project.tracks() {
            for clip in track.pattern() {
                for note in track.notes() {
                    assert!(roll.component(clip, note).is_some(), "missing entry for {note:?}");
                    expected += 1;
                }
            }
        }
        assert_eq!(roll.num_components(), expected);
    }

    #[test]
    fn test_two_note_scenario() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0), (64, 1.0)]);
        assert_eq!(roll.num_components(), 2);

        project.remove_event(&note(track, 64, 1.0).into(), &mut roll).unwrap();
        assert_eq!(roll.num_components(), 1);
        let remaining = roll.components().next().unwrap();
        assert_eq!(remaining.key(), 60);
        assert!(!remaining.is_selected());
        assert!(roll.selection().is_empty());
        assert_eq!(roll.fading_out().len(), 1);
    }

    #[test]
    fn test_removed_note_leaves_selection() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0), (64, 1.0)]);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);
        roll.select_all();
        assert_eq!(roll.selection().len(), 2);

        project.remove_event(&note(track, 64, 1.0).into(), &mut roll).unwrap();
        assert!(!roll.selection().contains(&clip, &note(track, 64, 1.0)));
        assert_eq!(roll.selection().len(), 1);
    }

    #[test]
    fn test_index_follows_edit_sequence() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        project.add_clip(track, 8.0, &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        let a = note(track, 62, 1.0);
        project.insert_event(a.into(), &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        let moved = a.with_key(63).with_beat(2.0);
        project.change_event(&a.into(), moved.into(), &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        project.remove_event(&note(track, 60, 0.0).into(), &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        let clip = project.get_track(track).unwrap().pattern()[1];
        project.change_clip(&clip, 16.0, &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        let clip = project.get_track(track).unwrap().pattern()[0];
        project.remove_clip(&clip, &mut roll).unwrap();
        assert_mirrors(&project, &roll);

        project.remove_track(track, &mut roll).unwrap();
        assert_eq!(roll.num_components(), 0);
    }

    #[test]
    fn test_relayout_is_batched() {
        let (mut project, mut roll, track) = setup(&[]);
        let clip = first_clip(&project, track);
        let a = note(track, 60, 4.0);
        project.insert_event(a.into(), &mut roll).unwrap();

        assert!(roll.needs_update());
        assert_eq!(roll.component(&clip, &a).unwrap().bounds(), Bounds::default());

        let b = a.with_beat(5.0);
        project.change_event(&a.into(), b.into(), &mut roll).unwrap();
        assert!(roll.needs_update());

        assert_eq!(roll.handle_async_update(), 1);
        assert!(!roll.needs_update());
        let expected = roll.geometry().pixel_bounds(60, 5.0, 1.0);
        assert_eq!(roll.component(&clip, &b).unwrap().bounds(), expected);
        assert_eq!(roll.handle_async_update(), 0);
    }

    #[test]
    fn test_scope_marks_active_entries() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let second = project.add_clip(track, 8.0, &mut roll).unwrap();
        let first = first_clip(&project, track);

        roll.set_editable_scope(&project, track, &second, false);
        let n = note(track, 60, 0.0);
        assert!(roll.component(&second, &n).unwrap().is_active());
        assert!(!roll.component(&first, &n).unwrap().is_active());

        let range = roll.active_range().unwrap();
        assert_eq!((range.first_beat, range.last_beat), (8.0, 9.0));

        // Only the active clip can be selected
        roll.select_events_in_range(0.0, 100.0, true);
        assert_eq!(roll.selection().len(), 1);
        assert!(roll.selection().contains(&second, &n));
    }

    #[test]
    fn test_scope_follows_moved_clip() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);

        let moved = project.change_clip(&clip, 4.0, &mut roll).unwrap();
        assert_eq!(roll.active_clip(), Some(moved));
        assert_eq!(roll.active_range().unwrap().first_beat, 4.0);
        assert!(roll.component(&moved, &note(track, 60, 0.0)).unwrap().is_active());
    }

    #[test]
    fn test_scope_cleared_with_its_track() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let pad = [MidiEvent::Note(note(TrackId(0), 48, 0.0))];
        let other = project
            .import_track(TrackKind::Piano, "Pad", &[0.0], pad, &mut roll)
            .unwrap();
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);

        project.remove_track(other, &mut roll).unwrap();
        assert_eq!(roll.active_track(), Some(track));

        project.remove_track(track, &mut roll).unwrap();
        assert_eq!(roll.active_track(), None);
        assert_eq!(roll.active_clip(), None);
        assert!(roll.active_range().is_none());
    }

    #[test]
    fn test_scope_cleared_with_its_clip() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let second = project.add_clip(track, 8.0, &mut roll).unwrap();
        roll.set_editable_scope(&project, track, &second, false);

        project.remove_clip(&second, &mut roll).unwrap();
        assert_eq!(roll.active_clip(), None);
        assert!(roll.active_range().is_none());
        assert!(roll.components().all(|c| !c.is_active()));
    }

    #[test]
    fn test_reload_clears_scope() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);

        // Same track and clip ids, unrelated content
        let mut other = Project::new();
        let events = [MidiEvent::Note(note(TrackId(0), 40, 0.0))];
        other.import_track(TrackKind::Piano, "Other", &[0.0], events, &mut ()).unwrap();
        project.replace_content(other, &mut roll);

        assert_eq!(roll.active_track(), None);
        assert_eq!(roll.active_clip(), None);
        assert!(roll.active_range().is_none());
        assert_eq!(roll.num_components(), 1);
        assert!(roll.components().all(|c| !c.is_active()));
    }

    #[test]
    fn test_scope_zooms_to_notes() {
        let (project, mut roll, track) = setup(&[(60, 0.0), (72, 4.0)]);
        roll.resized(800.0, 400.0);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, true);
        assert!(roll.geometry().row_height() as f32 <= 400.0 / 14.0);
        let bounds = roll.component(&clip, &note(track, 72, 4.0)).unwrap().bounds();
        assert!(bounds.y >= roll.geometry().viewport().y);
    }

    #[test]
    fn test_selection_follows_changed_note() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);
        roll.select_all();

        let old = note(track, 60, 0.0);
        let new = old.with_key(61);
        project.change_event(&old.into(), new.into(), &mut roll).unwrap();
        assert!(roll.selection().contains(&clip, &new));
        assert!(roll.component(&clip, &new).unwrap().is_selected());
    }

    #[test]
    fn test_lasso_selects_intersecting_active_notes() {
        let (project, mut roll, track) = setup(&[(60, 0.0), (60, 8.0)]);
        let clip = first_clip(&project, track);
        roll.set_editable_scope(&project, track, &clip, false);

        let first = roll.component(&clip, &note(track, 60, 0.0)).unwrap().bounds();
        let area = Bounds::new(first.x, first.y, 10.0, 2.0);
        assert_eq!(roll.find_lasso_items_in_area(&area).len(), 1);
        roll.select_in_area(&area, true);
        assert_eq!(roll.selected_notes(), vec![note(track, 60, 0.0)]);
    }

    #[test]
    fn test_key_signatures_drive_cache() {
        let mut project = Project::new();
        let keys = project.add_track(TrackKind::KeySignatures, "Keys", &mut ());
        let mut roll = PianoRoll::default();
        roll.reload_roll_content(&project);

        let c_major = KeySignatureEvent::new(keys, 0.0, 0, Scale::natural_major());
        let c_major_later = KeySignatureEvent::new(keys, 16.0, 0, Scale::natural_major());
        project.insert_event(c_major.clone().into(), &mut roll).unwrap();
        project.insert_event(c_major_later.clone().into(), &mut roll).unwrap();
        assert_eq!(roll.backgrounds().len(), 1);

        // Still used by the later key signature
        project.remove_event(&c_major.into(), &mut roll).unwrap();
        assert_eq!(roll.backgrounds().len(), 1);

        let d_dorian = KeySignatureEvent::new(keys, 16.0, 2, Scale::dorian());
        project
            .change_event(&c_major_later.into(), d_dorian.clone().into(), &mut roll)
            .unwrap();
        assert_eq!(roll.backgrounds().len(), 1);
        assert!(roll.backgrounds().lookup(2, &Scale::dorian()).is_some());

        project.remove_track(keys, &mut roll).unwrap();
        assert!(roll.backgrounds().is_empty());
    }

    #[test]
    fn test_track_colour_and_reload() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let colour = Colour::rgb(200, 10, 10);
        project.set_track_colour(track, colour, &mut roll).unwrap();
        assert_eq!(roll.components().next().unwrap().track_colour(), colour);

        let mut other = Project::new();
        let t = other.add_track(TrackKind::Piano, "Other", &mut ());
        other.insert_event(MidiEvent::Note(note(t, 40, 0.0)), &mut ()).unwrap();
        other.insert_event(MidiEvent::Note(note(t, 41, 0.0)), &mut ()).unwrap();
        project.replace_content(other, &mut roll);
        assert_mirrors(&project, &roll);
        assert_eq!(roll.num_components(), 2);
    }

    #[test]
    fn test_broadcast_keeps_views_in_sync() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let mut other = PianoRoll::default();
        other.reload_roll_content(&project);

        let mut listeners = Broadcast::new().with(&mut roll).with(&mut other);
        project.insert_event(note(track, 64, 0.0).into(), &mut listeners).unwrap();
        drop(listeners);

        assert_eq!(roll.num_components(), 2);
        assert_eq!(other.num_components(), 2);
    }

    #[test]
    fn test_fades_run_to_completion() {
        let (mut project, mut roll, track) = setup(&[(60, 0.0)]);
        let a = note(track, 62, 0.0);
        project.insert_event(a.into(), &mut roll).unwrap();
        roll.handle_async_update();

        assert!(roll.advance_fades(FADE_SECONDS / 2.0));
        project.remove_event(&note(track, 60, 0.0).into(), &mut roll).unwrap();
        assert_eq!(roll.fading_out().len(), 1);
        assert!(!roll.advance_fades(FADE_SECONDS));
        assert!(roll.fading_out().is_empty());
        let clip = first_clip(&project, track);
        assert_eq!(roll.component(&clip, &a).unwrap().opacity(), 1.0);
    }

    #[test]
    fn test_view_state_restores_zoom_and_scroll() {
        let project = Project::new();
        let mut roll = PianoRoll::default();
        roll.on_change_project_beat_range(&project, 0.0, 64.0);
        roll.resized(400.0, 300.0);
        roll.set_row_height(20);
        roll.set_bar_width(50.0);
        roll.set_view_position(100.0, 250.0);
        let state = roll.serialize();
        assert_eq!(state.start_bar, 2.0);
        assert_eq!(state.end_bar, 10.0);

        let mut restored = PianoRoll::default();
        restored.on_change_project_beat_range(&project, 0.0, 64.0);
        restored.resized(400.0, 300.0);
        restored.deserialize(&state);
        assert_eq!(restored.geometry().row_height(), 20);
        assert_eq!(restored.geometry().bar_width(), 50.0);
        assert_eq!(restored.geometry().viewport(), roll.geometry().viewport());
    }
}
