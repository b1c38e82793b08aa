//! Time signature markers shown along the roll header

use helio_core::{MidiEvent, Project, ProjectListener, TimeSignatureEvent, Track, BEATS_PER_BAR};

use crate::geometry::{Bounds, RollGeometry, HEADER_HEIGHT};

/// Markers sit in the lower half of the header, under the bar numbers
const MARKER_TOP: f32 = HEADER_HEIGHT / 2.0;
const MIN_MARKER_WIDTH: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct TimeSignatureMarker {
    event: TimeSignatureEvent,
    bounds: Bounds,
}

impl TimeSignatureMarker {
    pub fn event(&self) -> &TimeSignatureEvent {
        &self.event
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.event.numerator, self.event.denominator)
    }
}

/// Mirrors the time signatures of every timeline track. Each marker spans
/// from its own beat to the next marker, the last one to the project end.
pub struct TimeSignatureMap {
    /// Sorted by beat
    markers: Vec<TimeSignatureMarker>,
    project_last_beat: f32,
    roll_first_beat: f32,
    roll_last_beat: f32,
    first_bar: f32,
    bar_width: f32,
}

impl Default for TimeSignatureMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSignatureMap {
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
            project_last_beat: BEATS_PER_BAR,
            roll_first_beat: 0.0,
            roll_last_beat: BEATS_PER_BAR * 8.0,
            first_bar: 0.0,
            bar_width: 0.0,
        }
    }

    pub fn markers(&self) -> &[TimeSignatureMarker] {
        &self.markers
    }

    /// Markers overlapping the roll's visible beats
    pub fn visible_markers(&self) -> impl Iterator<Item = &TimeSignatureMarker> {
        let (first, last) = (self.roll_first_beat, self.roll_last_beat);
        self.markers.iter().enumerate().filter_map(move |(i, marker)| {
            let end = self.markers.get(i + 1).map_or(f32::MAX, |next| next.event.beat);
            (marker.event.beat < last && end > first).then_some(marker)
        })
    }

    /// Signature in effect at `beat`, if any marker precedes it
    pub fn signature_at(&self, beat: f32) -> Option<&TimeSignatureEvent> {
        self.markers
            .iter()
            .take_while(|m| m.event.beat <= beat)
            .last()
            .map(|m| &m.event)
    }

    /// Follow the roll's zoom and bar range
    pub fn sync_geometry(&mut self, geometry: &RollGeometry) {
        if self.first_bar == geometry.first_bar() && self.bar_width == geometry.bar_width() {
            return;
        }
        self.first_bar = geometry.first_bar();
        self.bar_width = geometry.bar_width();
        self.relayout();
    }

    fn x_by_beat(&self, beat: f32) -> f32 {
        (beat / BEATS_PER_BAR - self.first_bar) * self.bar_width
    }

    fn relayout(&mut self) {
        let ends: Vec<f32> = self
            .markers
            .iter()
            .skip(1)
            .map(|m| m.event.beat)
            .chain(std::iter::once(self.project_last_beat))
            .collect();
        for i in 0..self.markers.len() {
            let x = self.x_by_beat(self.markers[i].event.beat);
            let right = self.x_by_beat(ends[i]);
            let w = (right - x).max(MIN_MARKER_WIDTH);
            self.markers[i].bounds = Bounds::new(x, MARKER_TOP, w, HEADER_HEIGHT - MARKER_TOP);
        }
    }

    fn insert(&mut self, event: TimeSignatureEvent) {
        let idx = self
            .markers
            .iter()
            .position(|m| m.event.beat > event.beat)
            .unwrap_or(self.markers.len());
        self.markers.insert(idx, TimeSignatureMarker { event, bounds: Bounds::default() });
    }

    fn remove(&mut self, event: &TimeSignatureEvent) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| m.event != *event);
        self.markers.len() != before
    }

    fn load_track(&mut self, track: &Track) {
        for event in track.time_signatures() {
            self.insert(*event);
        }
    }
}

impl ProjectListener for TimeSignatureMap {
    fn on_add_midi_event(&mut self, _project: &Project, event: &MidiEvent) {
        if let MidiEvent::TimeSignature(event) = event {
            self.insert(*event);
            self.relayout();
        }
    }

    fn on_change_midi_event(&mut self, _project: &Project, old: &MidiEvent, new: &MidiEvent) {
        let (MidiEvent::TimeSignature(old), MidiEvent::TimeSignature(new)) = (old, new) else {
            return;
        };
        if self.remove(old) {
            self.insert(*new);
            self.relayout();
        }
    }

    fn on_remove_midi_event(&mut self, _project: &Project, event: &MidiEvent) {
        let MidiEvent::TimeSignature(event) = event else {
            return;
        };
        if self.remove(event) {
            self.relayout();
        }
    }

    fn on_add_track(&mut self, _project: &Project, track: &Track) {
        self.load_track(track);
        self.relayout();
    }

    fn on_remove_track(&mut self, _project: &Project, track: &Track) {
        self.markers.retain(|m| m.event.track != track.id);
        self.relayout();
    }

    fn on_reload_project_content(&mut self, project: &Project) {
        self.markers.clear();
        (_, self.project_last_beat) = project.beat_range();
        (self.roll_first_beat, self.roll_last_beat) = project.view_beat_range();
        for track in project.tracks() {
            self.load_track(track);
        }
        self.relayout();
    }

    fn on_change_project_beat_range(&mut self, _project: &Project, _first_beat: f32, last_beat: f32) {
        self.project_last_beat = last_beat;
        self.relayout();
    }

    fn on_change_view_beat_range(&mut self, _project: &Project, first_beat: f32, last_beat: f32) {
        self.roll_first_beat = first_beat;
        self.roll_last_beat = last_beat;
    }
}

#[cfg(test)]
mod tests {
    use helio_core::{TrackId, TrackKind};

    use super::*;

    fn signature(track: TrackId, beat: f32, numerator: u8) -> MidiEvent {
        TimeSignatureEvent::new(track, beat, numerator, 4).into()
    }

    fn setup() -> (Project, TimeSignatureMap, TrackId) {
        let mut project = Project::new();
        let mut map = TimeSignatureMap::new();
        let mut geometry = RollGeometry::new();
        geometry.set_bar_width(80.0);
        map.sync_geometry(&geometry);
        let track = project.add_track(TrackKind::TimeSignatures, "Meter", &mut map);
        (project, map, track)
    }

    #[test]
    fn test_markers_span_to_next_signature() {
        let (mut project, mut map, track) = setup();
        project.insert_event(signature(track, 16.0, 3), &mut map).unwrap();
        project.insert_event(signature(track, 0.0, 4), &mut map).unwrap();
        assert_eq!(project.beat_range(), (0.0, 16.0));

        let labels: Vec<String> = map.markers().iter().map(TimeSignatureMarker::label).collect();
        assert_eq!(labels, vec!["4/4", "3/4"]);

        // 4 beats per bar at 80px per bar
        let first = map.markers()[0].bounds();
        assert_eq!((first.x, first.w), (0.0, 320.0));
        assert_eq!(first.y, MARKER_TOP);
        let last = map.markers()[1].bounds();
        assert_eq!((last.x, last.w), (320.0, MIN_MARKER_WIDTH));

        assert_eq!(map.signature_at(8.0).map(|t| t.numerator), Some(4));
        assert_eq!(map.signature_at(20.0).map(|t| t.numerator), Some(3));
    }

    #[test]
    fn test_markers_follow_edits() {
        let (mut project, mut map, track) = setup();
        project.insert_event(signature(track, 0.0, 4), &mut map).unwrap();
        project.insert_event(signature(track, 8.0, 3), &mut map).unwrap();

        project
            .change_event(&signature(track, 8.0, 3), signature(track, 4.0, 7), &mut map)
            .unwrap();
        assert_eq!(map.signature_at(5.0).map(|t| t.numerator), Some(7));
        assert_eq!(map.markers()[0].bounds().w, 80.0);

        project.remove_event(&signature(track, 0.0, 4), &mut map).unwrap();
        assert_eq!(map.markers().len(), 1);
        assert!(map.signature_at(1.0).is_none());

        project.remove_track(track, &mut map).unwrap();
        assert!(map.markers().is_empty());
    }

    #[test]
    fn test_reload_and_visible_range() {
        let mut other = Project::new();
        let meter = other.add_track(TrackKind::TimeSignatures, "Meter", &mut ());
        for (beat, numerator) in [(0.0, 4), (32.0, 3), (64.0, 5)] {
            other.insert_event(signature(meter, beat, numerator), &mut ()).unwrap();
        }

        let (mut project, mut map, _) = setup();
        project.replace_content(other, &mut map);
        assert_eq!(map.markers().len(), 3);

        project.set_view_beat_range(40.0, 48.0, &mut map);
        let visible: Vec<u8> = map.visible_markers().map(|m| m.event().numerator).collect();
        assert_eq!(visible, vec![3]);
    }
}
