use helio_core::{Clip, MidiEvent, Project, ProjectListener, Track};
use tracing::debug;

use super::types::NewNoteDrag;
use super::{new_component_factory, PianoRoll};
use crate::index::NoteEntry;

impl ProjectListener for PianoRoll {
    fn on_add_midi_event(&mut self, project: &Project, event: &MidiEvent) {
        match event {
            MidiEvent::Note(note) => {
                let colour = project.get_track(note.track).map(|t| t.colour).unwrap_or_default();
                let make = new_component_factory(self.active_track, self.active_clip, colour);
                let clips = self.pattern_map.add_note(note, make);
                self.fades_pending |= !clips.is_empty();

                for clip in clips {
                    self.queue_relayout(clip, *note);
                    let is_active = self.pattern_map.get(&clip, note).is_some_and(|c| c.is_active());
                    if self.add_new_note_mode && is_active {
                        self.add_new_note_mode = false;
                        self.new_note_drag = Some(NewNoteDrag { clip, note: *note });
                        self.deselect_all();
                        self.select(clip, *note);
                    }
                }
            }
            MidiEvent::KeySignature(key) => {
                self.backgrounds.ensure_scheme(key.root_key, &key.scale);
            }
            MidiEvent::TimeSignature(_) | MidiEvent::Annotation(_) => {}
        }
    }

    fn on_change_midi_event(&mut self, project: &Project, old: &MidiEvent, new: &MidiEvent) {
        match (old, new) {
            (MidiEvent::Note(old), MidiEvent::Note(new)) => {
                let clips = self.pattern_map.change_note(old, new);
                self.selection.rekey_note(old, new);
                if let Some(drag) = self.new_note_drag.as_mut().filter(|d| d.note == *old) {
                    drag.note = *new;
                }
                for clip in clips {
                    self.batch_repaint.remove(&(clip, *old));
                    self.queue_relayout(clip, *new);
                }
            }
            (MidiEvent::KeySignature(old), MidiEvent::KeySignature(new)) => {
                if !old.same_highlighting_as(new) {
                    self.backgrounds
                        .release_scheme(old.root_key, &old.scale, project.key_signatures());
                    self.backgrounds.ensure_scheme(new.root_key, &new.scale);
                }
            }
            _ => {}
        }
    }

    fn on_remove_midi_event(&mut self, project: &Project, event: &MidiEvent) {
        match event {
            MidiEvent::Note(note) => {
                self.hide_helpers();
                self.hide_all_ghost_notes();
                if self.new_note_drag.is_some_and(|d| d.note == *note) {
                    self.new_note_drag = None;
                }

                for mut component in self.pattern_map.remove_note(note) {
                    let clip = *component.clip();
                    self.selection.deselect(&clip, note);
                    self.batch_repaint.remove(&(clip, *note));
                    component.set_selected(false);
                    self.fading_out.push(component);
                }
            }
            MidiEvent::KeySignature(key) => {
                self.backgrounds
                    .release_scheme(key.root_key, &key.scale, project.key_signatures());
            }
            MidiEvent::TimeSignature(_) | MidiEvent::Annotation(_) => {}
        }
    }

    fn on_add_clip(&mut self, project: &Project, clip: &Clip) {
        let track = project.get_track(clip.track);
        let colour = track.map(|t| t.colour).unwrap_or_default();
        let make = new_component_factory(self.active_track, self.active_clip, colour);
        for note in self.pattern_map.add_clip(clip, track, make) {
            self.queue_relayout(*clip, note);
        }
        self.fades_pending = true;
    }

    fn on_change_clip(&mut self, project: &Project, old: &Clip, new: &Clip) {
        if !self.pattern_map.change_clip(old, new) {
            return;
        }
        self.selection.rekey_clip(old, new);
        self.batch_repaint.retain(|(clip, _)| clip != old);
        if let Some(drag) = self.new_note_drag.as_mut().filter(|d| d.clip == *old) {
            drag.clip = *new;
        }

        let notes: Vec<_> = self
            .pattern_map
            .sequence_map(new)
            .map(|map| map.keys().copied().collect())
            .unwrap_or_default();
        for note in notes {
            self.queue_relayout(*new, note);
        }

        if self.active_clip == Some(*old) {
            self.active_clip = Some(*new);
            self.update_active_range_indicator(project);
        }
    }

    fn on_remove_clip(&mut self, project: &Project, clip: &Clip) {
        if self.new_note_drag.is_some_and(|d| d.clip == *clip) {
            self.new_note_drag = None;
        }
        if self.active_clip == Some(*clip) {
            self.add_new_note_mode = false;
            self.active_clip = None;
            self.update_active_range_indicator(project);
        }
        self.selection.remove_where(|c, _| c == clip);
        self.batch_repaint.retain(|(c, _)| c != clip);
        if let Some(removed) = self.pattern_map.remove_clip(clip) {
            debug!(clip = %clip.id, entries = removed.len(), "Removed clip entries");
        }
    }

    fn on_add_track(&mut self, project: &Project, track: &Track) {
        self.load_track(track);
        self.update_active_range_indicator(project);
    }

    fn on_remove_track(&mut self, project: &Project, track: &Track) {
        self.deselect_all();
        self.cancel_gestures();
        self.batch_repaint.retain(|(clip, _)| clip.track != track.id);
        self.pattern_map.remove_track(track.id);

        let live = project.key_signatures();
        for key in track.key_signatures() {
            self.backgrounds
                .release_scheme(key.root_key, &key.scale, live.iter().copied());
        }

        if self.active_track == Some(track.id) {
            debug!(track = %track.id, "Edited track was removed");
            self.active_track = None;
            self.active_clip = None;
        }
        self.update_active_range_indicator(project);
    }

    fn on_change_track_properties(&mut self, project: &Project, track: &Track) {
        for component in self.pattern_map.entries_mut().filter(|c| c.note().track == track.id) {
            component.set_track_colour(track.colour);
        }
        for ghost in self.ghost_notes.iter_mut().filter(|c| c.note().track == track.id) {
            ghost.set_track_colour(track.colour);
        }
        self.update_active_range_indicator(project);
    }

    fn on_reload_project_content(&mut self, project: &Project) {
        self.reload_roll_content(project);
    }

    fn on_change_project_beat_range(&mut self, project: &Project, first_beat: f32, last_beat: f32) {
        self.project_beat_range = (first_beat, last_beat);
        self.update_bar_range();
        self.update_active_range_indicator(project);
    }

    fn on_change_view_beat_range(&mut self, _project: &Project, first_beat: f32, last_beat: f32) {
        self.view_beat_range = (first_beat, last_beat);
    }
}
