//! Minimap of the whole project: every note as a thin line

use helio_core::{
    Clip, Colour, MidiEvent, Note, Project, ProjectListener, Track, TrackId, BEATS_PER_BAR, NUM_KEYS,
};

use crate::geometry::Bounds;
use crate::index::{NoteEntry, PatternMap};

/// Share of white mixed into the track colour
const NOTE_BRIGHTNESS: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct TrackMapNote {
    note: Note,
    clip: Clip,
    colour: Colour,
    bounds: Bounds,
}

impl TrackMapNote {
    fn new(note: &Note, clip: &Clip, track_colour: Colour) -> Self {
        Self {
            note: *note,
            clip: *clip,
            colour: track_colour.interpolated_with(Colour::WHITE, NOTE_BRIGHTNESS),
            bounds: Bounds::default(),
        }
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Beat within the project, the clip offset included
    pub fn beat(&self) -> f32 {
        self.note.beat + self.clip.beat
    }
}

impl NoteEntry for TrackMapNote {
    fn note(&self) -> &Note {
        &self.note
    }

    fn clip(&self) -> &Clip {
        &self.clip
    }

    fn set_note(&mut self, note: Note) {
        self.note = note;
    }

    fn set_clip(&mut self, clip: Clip) {
        self.clip = clip;
    }
}

pub struct PianoTrackMap {
    pattern_map: PatternMap<TrackMapNote>,
    project_first_beat: f32,
    project_last_beat: f32,
    roll_first_beat: f32,
    roll_last_beat: f32,
    width: f32,
    height: f32,
}

impl Default for PianoTrackMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoTrackMap {
    pub fn new() -> Self {
        Self {
            pattern_map: PatternMap::new(),
            project_first_beat: 0.0,
            project_last_beat: BEATS_PER_BAR,
            roll_first_beat: 0.0,
            roll_last_beat: BEATS_PER_BAR * 8.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn notes(&self) -> impl Iterator<Item = &TrackMapNote> {
        self.pattern_map.entries()
    }

    pub fn num_notes(&self) -> usize {
        self.pattern_map.len()
    }

    pub fn get(&self, clip: &Clip, note: &Note) -> Option<&TrackMapNote> {
        self.pattern_map.get(clip, note)
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn resized(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.relayout_all();
    }

    /// Part of the map showing the roll's visible beats
    pub fn viewport_indicator(&self) -> Bounds {
        let x = self.x_by_beat(self.roll_first_beat);
        let right = self.x_by_beat(self.roll_last_beat);
        Bounds::new(x, 0.0, (right - x).max(1.0), self.height)
    }

    fn x_by_beat(&self, beat: f32) -> f32 {
        let length = (self.project_last_beat - self.project_first_beat).max(f32::EPSILON);
        self.width * (beat - self.project_first_beat) / length
    }

    fn note_bounds(&self, entry: &TrackMapNote) -> Bounds {
        let length = (self.project_last_beat - self.project_first_beat).max(f32::EPSILON);
        let row_height = self.height / NUM_KEYS as f32;
        let x = self.x_by_beat(entry.beat());
        let w = self.width * entry.note.length / length;
        let y = (NUM_KEYS - 1 - entry.note.key) as f32 * row_height;
        Bounds::new(x, y, w.max(1.0), row_height.max(1.0))
    }

    fn relayout_all(&mut self) {
        let bounds: Vec<Bounds> = self.pattern_map.entries().map(|e| self.note_bounds(e)).collect();
        for (entry, b) in self.pattern_map.entries_mut().zip(bounds) {
            entry.bounds = b;
        }
    }

    fn relayout(&mut self, clip: &Clip, note: &Note) {
        let Some(bounds) = self.pattern_map.get(clip, note).map(|e| self.note_bounds(e)) else {
            return;
        };
        if let Some(entry) = self.pattern_map.get_mut(clip, note) {
            entry.bounds = bounds;
        }
    }

    fn relayout_clip(&mut self, clip: &Clip) {
        let notes: Vec<Note> = self
            .pattern_map
            .sequence_map(clip)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        for note in &notes {
            self.relayout(clip, note);
        }
    }

    fn load_track(&mut self, track: &Track) {
        self.pattern_map
            .load_track(track, |note, clip| TrackMapNote::new(note, clip, track.colour));
        for clip in track.pattern() {
            self.relayout_clip(clip);
        }
    }

    fn reload(&mut self, project: &Project) {
        self.pattern_map.clear();
        (self.project_first_beat, self.project_last_beat) = project.beat_range();
        (self.roll_first_beat, self.roll_last_beat) = project.view_beat_range();
        for track in project.tracks() {
            self.load_track(track);
        }
    }
}

fn track_colour(project: &Project, track: TrackId) -> Colour {
    project
        .get_track(track)
        .map(|t| t.colour)
        .unwrap_or_default()
}

impl ProjectListener for PianoTrackMap {
    fn on_add_midi_event(&mut self, project: &Project, event: &MidiEvent) {
        let MidiEvent::Note(note) = event else {
            return;
        };
        let colour = track_colour(project, note.track);
        for clip in self.pattern_map.add_note(note, |n, c| TrackMapNote::new(n, c, colour)) {
            self.relayout(&clip, note);
        }
    }

    fn on_change_midi_event(&mut self, _project: &Project, old: &MidiEvent, new: &MidiEvent) {
        let (MidiEvent::Note(old), MidiEvent::Note(new)) = (old, new) else {
            return;
        };
        for clip in self.pattern_map.change_note(old, new) {
            self.relayout(&clip, new);
        }
    }

    fn on_remove_midi_event(&mut self, _project: &Project, event: &MidiEvent) {
        if let MidiEvent::Note(note) = event {
            self.pattern_map.remove_note(note);
        }
    }

    fn on_add_clip(&mut self, project: &Project, clip: &Clip) {
        let track = project.get_track(clip.track);
        let colour = track_colour(project, clip.track);
        self.pattern_map
            .add_clip(clip, track, |n, c| TrackMapNote::new(n, c, colour));
        self.relayout_clip(clip);
    }

    fn on_change_clip(&mut self, _project: &Project, old: &Clip, new: &Clip) {
        if self.pattern_map.change_clip(old, new) {
            self.relayout_clip(new);
        }
    }

    fn on_remove_clip(&mut self, _project: &Project, clip: &Clip) {
        self.pattern_map.remove_clip(clip);
    }

    fn on_add_track(&mut self, _project: &Project, track: &Track) {
        self.load_track(track);
    }

    fn on_remove_track(&mut self, _project: &Project, track: &Track) {
        self.pattern_map.remove_track(track.id);
    }

    fn on_change_track_properties(&mut self, _project: &Project, track: &Track) {
        for entry in self.pattern_map.entries_mut().filter(|e| e.note.track == track.id) {
            entry.colour = track.colour.interpolated_with(Colour::WHITE, NOTE_BRIGHTNESS);
        }
    }

    fn on_reload_project_content(&mut self, project: &Project) {
        self.reload(project);
    }

    fn on_change_project_beat_range(&mut self, _project: &Project, first_beat: f32, last_beat: f32) {
        self.project_first_beat = first_beat;
        self.project_last_beat = last_beat;
        self.relayout_all();
    }

    fn on_change_view_beat_range(&mut self, _project: &Project, first_beat: f32, last_beat: f32) {
        self.roll_first_beat = first_beat;
        self.roll_last_beat = last_beat;
    }
}

#[cfg(test)]
mod tests {
    use helio_core::TrackKind;

    use super::*;

    fn note(track: TrackId, key: i32, beat: f32) -> Note {
        Note::new(track, key, beat, 1.0, 0.5)
    }

    #[test]
    fn test_layout_spans_project() {
        let mut project = Project::new();
        let mut map = PianoTrackMap::new();
        map.resized(400.0, 256.0);
        let track = project.add_track(TrackKind::Piano, "Lead", &mut map);

        project.insert_event(note(track, 127, 0.0).into(), &mut map).unwrap();
        project.insert_event(note(track, 0, 7.0).into(), &mut map).unwrap();
        assert_eq!(project.beat_range(), (0.0, 8.0));

        let clip = project.get_track(track).unwrap().pattern()[0];
        let top = map.get(&clip, &note(track, 127, 0.0)).unwrap().bounds();
        assert_eq!(top, Bounds::new(0.0, 0.0, 50.0, 2.0));
        let bottom = map.get(&clip, &note(track, 0, 7.0)).unwrap().bounds();
        assert_eq!(bottom, Bounds::new(350.0, 254.0, 50.0, 2.0));
    }

    #[test]
    fn test_clips_offset_notes() {
        let mut project = Project::new();
        let mut map = PianoTrackMap::new();
        map.resized(160.0, 128.0);
        let track = project.add_track(TrackKind::Piano, "Lead", &mut map);
        project.insert_event(note(track, 60, 0.0).into(), &mut map).unwrap();

        let clip = project.add_clip(track, 12.0, &mut map).unwrap();
        assert_eq!(map.num_notes(), 2);
        assert_eq!(project.beat_range(), (0.0, 13.0));
        let placed = map.get(&clip, &note(track, 60, 0.0)).unwrap();
        assert_eq!(placed.beat(), 12.0);
        assert!((placed.bounds().x - 160.0 * 12.0 / 13.0).abs() < 1e-3);

        let moved = project.change_clip(&clip, 4.0, &mut map).unwrap();
        assert_eq!(map.get(&moved, &note(track, 60, 0.0)).unwrap().beat(), 4.0);
        project.remove_clip(&moved, &mut map).unwrap();
        assert_eq!(map.num_notes(), 1);
    }

    #[test]
    fn test_colour_follows_track() {
        let mut project = Project::new();
        let mut map = PianoTrackMap::new();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut map);
        project.insert_event(note(track, 60, 0.0).into(), &mut map).unwrap();

        project.set_track_colour(track, Colour::BLACK, &mut map).unwrap();
        let entry = map.notes().next().unwrap();
        assert_eq!(entry.colour(), Colour::BLACK.interpolated_with(Colour::WHITE, NOTE_BRIGHTNESS));

        project.remove_track(track, &mut map).unwrap();
        assert_eq!(map.num_notes(), 0);
    }

    #[test]
    fn test_viewport_indicator() {
        let mut project = Project::new();
        let mut map = PianoTrackMap::new();
        map.resized(100.0, 128.0);
        map.on_change_project_beat_range(&project, 0.0, 40.0);
        project.set_view_beat_range(10.0, 20.0, &mut map);
        assert_eq!(map.viewport_indicator(), Bounds::new(25.0, 0.0, 25.0, 128.0));
    }
}
