//! Pointer gestures and keyboard commands

use helio_core::{Clip, Note, BEATS_PER_BAR, NUM_KEYS};

use super::types::{EditMode, Gesture, RollAction, RollCommand};
use super::{PianoRoll, DEFAULT_NOTE_LENGTH};
use crate::geometry::{Bounds, Point};
use crate::index::NoteEntry;

const BEAT_SHIFT: f32 = 0.25;

impl PianoRoll {
    /// Press at `pos` in content coordinates. In draw mode, or with
    /// `add_note`, requests a new note in the cell under the pointer.
    pub fn mouse_down(&mut self, pos: Point, add_note: bool) -> Option<RollAction> {
        self.gesture = Gesture::Idle;
        if self.edit_mode == EditMode::Draw || add_note {
            return self.request_new_note(pos);
        }

        match self.active_component_at(pos) {
            Some((clip, note)) => {
                if !self.selection.contains(&clip, &note) {
                    self.deselect_all();
                    self.select(clip, note);
                }
                let selected: Vec<_> = self.selection.iter().copied().collect();
                for (clip, note) in &selected {
                    self.show_ghost_note_for(clip, note);
                }
                self.show_helpers();
                self.gesture = Gesture::Move {
                    anchor: pos,
                    delta_beat: 0.0,
                    delta_key: 0,
                };
            }
            None => {
                self.deselect_all();
                self.gesture = Gesture::Lasso { origin: pos, current: pos };
            }
        }
        None
    }

    pub fn mouse_drag(&mut self, pos: Point) -> Option<RollAction> {
        if let Some(drag) = self.new_note_drag {
            let snap = self.geometry.snap_beats();
            let end_beat = self.geometry.round_beat_at_x(pos.x) - drag.clip.beat;
            let length = (end_beat - drag.note.beat).max(snap);
            if length == drag.note.length {
                return None;
            }
            return Some(RollAction::ResizeNote {
                old: drag.note,
                new: drag.note.with_length(length),
            });
        }

        match self.gesture {
            Gesture::Lasso { origin, .. } => {
                self.gesture = Gesture::Lasso { origin, current: pos };
                let area = Bounds::from_corners(origin, pos);
                self.select_in_area(&area, true);
            }
            Gesture::Move { anchor, delta_beat, delta_key } => {
                let snap = self.geometry.snap_beats();
                let beats = self.geometry.beat_at_x(pos.x) - self.geometry.beat_at_x(anchor.x);
                let new_delta_beat = (beats / snap).round() * snap;
                let new_delta_key = self.geometry.key_at_y(pos.y) - self.geometry.key_at_y(anchor.y);
                if new_delta_beat != delta_beat || new_delta_key != delta_key {
                    self.move_helpers(new_delta_key);
                    self.gesture = Gesture::Move {
                        anchor,
                        delta_beat: new_delta_beat,
                        delta_key: new_delta_key,
                    };
                }
            }
            Gesture::Idle => {}
        }
        None
    }

    /// Release ends any gesture; a finished move is turned into an edit
    pub fn mouse_up(&mut self, _pos: Point) -> Option<RollAction> {
        self.add_new_note_mode = false;
        self.new_note_drag = None;

        let gesture = std::mem::take(&mut self.gesture);
        match gesture {
            Gesture::Move { delta_beat, delta_key, .. } => {
                self.hide_all_ghost_notes();
                self.hide_helpers();
                self.shifted_selection(delta_beat, delta_key)
            }
            Gesture::Lasso { .. } | Gesture::Idle => None,
        }
    }

    fn request_new_note(&mut self, pos: Point) -> Option<RollAction> {
        let (track, clip) = (self.active_track?, self.active_clip?);
        let key = self.geometry.key_at_y(pos.y);
        let beat = self.geometry.floor_beat_at_x(pos.x) - clip.beat;
        if beat < 0.0 {
            return None;
        }
        self.add_new_note_mode = true;
        Some(RollAction::AddNote(Note::new(
            track,
            key,
            beat,
            DEFAULT_NOTE_LENGTH,
            self.new_note_volume,
        )))
    }

    /// Topmost active entry under `pos`
    fn active_component_at(&self, pos: Point) -> Option<(Clip, Note)> {
        self.pattern_map
            .entries()
            .filter(|c| c.is_active() && c.bounds().contains(pos))
            .map(|c| (*c.clip(), *c.note()))
            .last()
    }

    pub fn handle_command(&mut self, command: RollCommand) -> Option<RollAction> {
        match command {
            RollCommand::SelectAll => {
                self.select_all();
                None
            }
            RollCommand::DeleteEvents => {
                let notes = self.selected_notes();
                (!notes.is_empty()).then_some(RollAction::DeleteNotes(notes))
            }
            RollCommand::BeatShiftLeft => self.shifted_selection(-BEAT_SHIFT, 0),
            RollCommand::BeatShiftRight => self.shifted_selection(BEAT_SHIFT, 0),
            RollCommand::BarShiftLeft => self.shifted_selection(-BEATS_PER_BAR, 0),
            RollCommand::BarShiftRight => self.shifted_selection(BEATS_PER_BAR, 0),
            RollCommand::KeyShiftUp => self.shifted_selection(0.0, 1),
            RollCommand::KeyShiftDown => self.shifted_selection(0.0, -1),
            RollCommand::OctaveShiftUp => self.shifted_selection(0.0, 12),
            RollCommand::OctaveShiftDown => self.shifted_selection(0.0, -12),
        }
    }

    /// Replacements moving the selection; `None` when empty, a no-op, or
    /// when any note would leave the clip start or the keyboard
    fn shifted_selection(&self, delta_beat: f32, delta_key: i32) -> Option<RollAction> {
        if delta_beat == 0.0 && delta_key == 0 {
            return None;
        }
        let notes = self.selected_notes();
        if notes.is_empty() {
            return None;
        }

        let mut changes = Vec::with_capacity(notes.len());
        for note in notes {
            let key = note.key + delta_key;
            let beat = note.beat + delta_beat;
            if !(0..NUM_KEYS).contains(&key) || beat < 0.0 {
                return None;
            }
            changes.push((note, note.with_key(key).with_beat(beat)));
        }
        Some(RollAction::ChangeNotes(changes))
    }
}
