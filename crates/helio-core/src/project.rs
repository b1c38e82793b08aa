//! The project document: tracks, their clips and their events

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId};
use crate::colour::Colour;
use crate::error::{HelioError, Result};
use crate::event::{KeySignatureEvent, MidiEvent, TimeSignatureEvent, NUM_KEYS};
use crate::listener::ProjectListener;
use crate::track::{Track, TrackId, TrackKind};
use crate::BEATS_PER_BAR;

/// The document edited by the sequencer.
///
/// Every mutation validates its input, updates the document and then
/// notifies `listener`. When the project beat range moves as a result,
/// `on_change_project_beat_range` follows the primary notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    tracks: Vec<Track>,
    next_track_id: u64,
    next_clip_id: u64,
    beat_range: (f32, f32),
    view_beat_range: (f32, f32),
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_track_id: 1,
            next_clip_id: 1,
            beat_range: (0.0, BEATS_PER_BAR),
            view_beat_range: (0.0, BEATS_PER_BAR * 8.0),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get_track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_ref(&self, id: TrackId) -> Result<&Track> {
        self.get_track(id).ok_or(HelioError::TrackNotFound(id))
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(HelioError::TrackNotFound(id))
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.pattern.iter())
    }

    /// All live key signatures, sorted by beat
    pub fn key_signatures(&self) -> Vec<&KeySignatureEvent> {
        let mut keys: Vec<_> = self.tracks.iter().flat_map(Track::key_signatures).collect();
        keys.sort_by(|a, b| a.beat.total_cmp(&b.beat));
        keys
    }

    /// Time signatures of every track, sorted by beat
    pub fn time_signatures(&self) -> Vec<&TimeSignatureEvent> {
        let mut signatures: Vec<_> = self.tracks.iter().flat_map(Track::time_signatures).collect();
        signatures.sort_by(|a, b| a.beat.total_cmp(&b.beat));
        signatures
    }

    /// First and last beat occupied by any event, never shorter than a bar
    pub fn beat_range(&self) -> (f32, f32) {
        self.beat_range
    }

    pub fn view_beat_range(&self) -> (f32, f32) {
        self.view_beat_range
    }

    // ------------------------------------------------------------------
    // Tracks
    // ------------------------------------------------------------------

    /// Add an empty track; piano tracks get one clip at beat 0
    pub fn add_track(
        &mut self,
        kind: TrackKind,
        name: impl Into<String>,
        listener: &mut dyn ProjectListener,
    ) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;

        let mut track = Track::new(id, kind, name);
        if !kind.is_timeline() {
            track.add_clip(Clip::new(self.allocate_clip_id(), id, 0.0));
        }
        self.tracks.push(track);
        self.notify_track_added(id, listener);
        id
    }

    /// Add a track that already has content, e.g. from an imported file.
    /// Events are re-owned by the new track.
    pub fn import_track(
        &mut self,
        kind: TrackKind,
        name: impl Into<String>,
        clip_beats: &[f32],
        events: impl IntoIterator<Item = MidiEvent>,
        listener: &mut dyn ProjectListener,
    ) -> Result<TrackId> {
        let id = TrackId(self.next_track_id);
        if kind.is_timeline() && !clip_beats.is_empty() {
            return Err(HelioError::NotAPianoTrack(id));
        }

        let mut track = Track::new(id, kind, name);
        for event in events {
            let event = event.with_track(id);
            validate_event(&event)?;
            if track.contains_event(&event) {
                return Err(HelioError::DuplicateEvent(id));
            }
            track.insert_event(event);
        }

        for (i, &beat) in clip_beats.iter().enumerate() {
            if clip_beats[..i].iter().any(|&b| b.total_cmp(&beat).is_eq()) {
                return Err(HelioError::DuplicateClip(id, beat));
            }
        }
        for &beat in clip_beats {
            track.add_clip(Clip::new(self.allocate_clip_id(), id, beat));
        }

        self.next_track_id += 1;
        self.tracks.push(track);
        self.notify_track_added(id, listener);
        Ok(id)
    }

    pub fn remove_track(&mut self, id: TrackId, listener: &mut dyn ProjectListener) -> Result<Track> {
        let pos = self.tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(HelioError::TrackNotFound(id))?;
        let track = self.tracks.remove(pos);
        listener.on_remove_track(self, &track);
        self.refresh_beat_range(listener);
        Ok(track)
    }

    pub fn set_track_colour(
        &mut self,
        id: TrackId,
        colour: Colour,
        listener: &mut dyn ProjectListener,
    ) -> Result<()> {
        self.track_mut(id)?.colour = colour;
        let track = self.track_ref(id)?;
        listener.on_change_track_properties(self, track);
        Ok(())
    }

    pub fn rename_track(
        &mut self,
        id: TrackId,
        name: impl Into<String>,
        listener: &mut dyn ProjectListener,
    ) -> Result<()> {
        self.track_mut(id)?.name = name.into();
        let track = self.track_ref(id)?;
        listener.on_change_track_properties(self, track);
        Ok(())
    }

    fn notify_track_added(&mut self, id: TrackId, listener: &mut dyn ProjectListener) {
        if let Some(track) = self.get_track(id) {
            listener.on_add_track(self, track);
        }
        self.refresh_beat_range(listener);
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn insert_event(&mut self, event: MidiEvent, listener: &mut dyn ProjectListener) -> Result<()> {
        validate_event(&event)?;
        let track_id = event.track();
        let track = self.track_mut(track_id)?;
        if track.contains_event(&event) {
            return Err(HelioError::DuplicateEvent(track_id));
        }
        track.insert_event(event.clone());

        listener.on_add_midi_event(self, &event);
        self.refresh_beat_range(listener);
        Ok(())
    }

    /// Replace `old` with `new`; the new event stays on the old event's track
    pub fn change_event(
        &mut self,
        old: &MidiEvent,
        new: MidiEvent,
        listener: &mut dyn ProjectListener,
    ) -> Result<()> {
        let track_id = old.track();
        let new = new.with_track(track_id);
        if !old.is_same_kind(&new) {
            return Err(HelioError::EventKindMismatch(track_id));
        }
        validate_event(&new)?;

        let track = self.track_mut(track_id)?;
        if !track.contains_event(old) {
            return Err(HelioError::EventNotFound(track_id));
        }
        if new != *old && track.contains_event(&new) {
            return Err(HelioError::DuplicateEvent(track_id));
        }
        track.remove_event(old);
        track.insert_event(new.clone());

        listener.on_change_midi_event(self, old, &new);
        self.refresh_beat_range(listener);
        Ok(())
    }

    /// Apply several replacements, e.g. shifting a selection.
    ///
    /// Replacements are reordered so that no new event lands on an event
    /// that is still waiting to be moved away. Either every replacement is
    /// applied or, on error, none is.
    pub fn change_events(
        &mut self,
        changes: Vec<(MidiEvent, MidiEvent)>,
        listener: &mut dyn ProjectListener,
    ) -> Result<()> {
        let changes: Vec<_> = changes
            .into_iter()
            .map(|(old, new)| {
                let track = old.track();
                (old, new.with_track(track))
            })
            .collect();
        self.validate_changes(&changes)?;

        for (old, new) in order_changes(changes)? {
            self.change_event(&old, new, listener)?;
        }
        Ok(())
    }

    /// Check a batch of replacements against the document as a whole.
    /// A new event may land on an existing one only if that one moves away.
    fn validate_changes(&self, changes: &[(MidiEvent, MidiEvent)]) -> Result<()> {
        for (i, (old, new)) in changes.iter().enumerate() {
            let track_id = old.track();
            if !old.is_same_kind(new) {
                return Err(HelioError::EventKindMismatch(track_id));
            }
            validate_event(new)?;

            let track = self.track_ref(track_id)?;
            let earlier = &changes[..i];
            if !track.contains_event(old) || earlier.iter().any(|(o, _)| o == old) {
                return Err(HelioError::EventNotFound(track_id));
            }
            let vacated = changes.iter().any(|(o, _)| o == new);
            if earlier.iter().any(|(_, n)| n == new) || (track.contains_event(new) && !vacated) {
                return Err(HelioError::DuplicateEvent(track_id));
            }
        }
        Ok(())
    }

    pub fn remove_event(&mut self, event: &MidiEvent, listener: &mut dyn ProjectListener) -> Result<()> {
        let track_id = event.track();
        if self.track_mut(track_id)?.remove_event(event).is_none() {
            return Err(HelioError::EventNotFound(track_id));
        }

        listener.on_remove_midi_event(self, event);
        self.refresh_beat_range(listener);
        Ok(())
    }

    pub fn remove_events(&mut self, events: &[MidiEvent], listener: &mut dyn ProjectListener) -> Result<()> {
        for event in events {
            self.remove_event(event, listener)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clips
    // ------------------------------------------------------------------

    pub fn add_clip(&mut self, track_id: TrackId, beat: f32, listener: &mut dyn ProjectListener) -> Result<Clip> {
        let clip_id = ClipId(self.next_clip_id);
        let track = self.track_mut(track_id)?;
        if track.kind.is_timeline() {
            return Err(HelioError::NotAPianoTrack(track_id));
        }
        if track.pattern.iter().any(|c| c.beat.total_cmp(&beat).is_eq()) {
            return Err(HelioError::DuplicateClip(track_id, beat));
        }
        let clip = Clip::new(clip_id, track_id, beat);
        track.add_clip(clip);
        self.next_clip_id += 1;

        listener.on_add_clip(self, &clip);
        self.refresh_beat_range(listener);
        Ok(clip)
    }

    /// Move a clip to another beat offset
    pub fn change_clip(&mut self, old: &Clip, beat: f32, listener: &mut dyn ProjectListener) -> Result<Clip> {
        let track = self.track_mut(old.track)?;
        if track.get_clip(old.id) != Some(old) {
            return Err(HelioError::ClipNotFound(old.id));
        }
        if track.pattern.iter().any(|c| c.id != old.id && c.beat.total_cmp(&beat).is_eq()) {
            return Err(HelioError::DuplicateClip(old.track, beat));
        }
        let new = old.with_beat(beat);
        track.remove_clip(old);
        track.add_clip(new);

        listener.on_change_clip(self, old, &new);
        self.refresh_beat_range(listener);
        Ok(new)
    }

    pub fn remove_clip(&mut self, clip: &Clip, listener: &mut dyn ProjectListener) -> Result<()> {
        if self.track_mut(clip.track)?.remove_clip(clip).is_none() {
            return Err(HelioError::ClipNotFound(clip.id));
        }

        listener.on_remove_clip(self, clip);
        self.refresh_beat_range(listener);
        Ok(())
    }

    fn allocate_clip_id(&mut self) -> ClipId {
        let id = ClipId(self.next_clip_id);
        self.next_clip_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Whole-document changes
    // ------------------------------------------------------------------

    /// Swap in the content of another project, e.g. after loading a file
    /// or checking out a revision
    pub fn replace_content(&mut self, other: Project, listener: &mut dyn ProjectListener) {
        self.tracks = other.tracks;
        self.next_track_id = self.tracks.iter().map(|t| t.id.0 + 1).max().unwrap_or(1);
        self.next_clip_id = self.clips().map(|c| c.id.0 + 1).max().unwrap_or(1);

        listener.on_reload_project_content(self);
        self.refresh_beat_range(listener);
    }

    pub fn set_view_beat_range(&mut self, first_beat: f32, last_beat: f32, listener: &mut dyn ProjectListener) {
        self.view_beat_range = (first_beat, last_beat);
        listener.on_change_view_beat_range(self, first_beat, last_beat);
    }

    fn compute_beat_range(&self) -> (f32, f32) {
        let mut first = f32::MAX;
        let mut last = f32::MIN;

        for track in self.tracks.iter().filter(|t| !t.sequence.is_empty()) {
            let (track_first, track_last) = (track.first_beat(), track.last_beat());
            if track.kind.is_timeline() {
                first = first.min(track_first);
                last = last.max(track_last);
                continue;
            }
            for clip in &track.pattern {
                first = first.min(clip.beat + track_first);
                last = last.max(clip.beat + track_last);
            }
        }

        if first > last {
            return (0.0, BEATS_PER_BAR);
        }
        (first, last.max(first + BEATS_PER_BAR))
    }

    fn refresh_beat_range(&mut self, listener: &mut dyn ProjectListener) {
        let range = self.compute_beat_range();
        if range != self.beat_range {
            self.beat_range = range;
            listener.on_change_project_beat_range(self, range.0, range.1);
        }
    }
}

fn validate_event(event: &MidiEvent) -> Result<()> {
    let key = match event {
        MidiEvent::Note(n) => n.key,
        MidiEvent::KeySignature(k) => k.root_key,
        MidiEvent::TimeSignature(_) | MidiEvent::Annotation(_) => return Ok(()),
    };
    if !(0..NUM_KEYS).contains(&key) {
        return Err(HelioError::InvalidKey(key));
    }
    Ok(())
}

/// Order replacements so each new value is free once its turn comes;
/// fails when the replacements form a cycle
fn order_changes(mut pending: Vec<(MidiEvent, MidiEvent)>) -> Result<Vec<(MidiEvent, MidiEvent)>> {
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let next = (0..pending.len()).find(|&i| {
            let target = &pending[i].1;
            pending
                .iter()
                .enumerate()
                .all(|(j, (old, _))| j == i || old != target)
        });
        let Some(next) = next else {
            return Err(HelioError::CyclicChanges(pending[0].0.track()));
        };
        ordered.push(pending.remove(next));
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeySignatureEvent, Note};
    use crate::scale::Scale;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl ProjectListener for Recorder {
        fn on_add_midi_event(&mut self, project: &Project, event: &MidiEvent) {
            let track = project.get_track(event.track()).unwrap();
            assert!(track.contains_event(event), "document is updated before notifying");
            self.log.push(format!("add {}", event.beat()));
        }

        fn on_change_midi_event(&mut self, _project: &Project, old: &MidiEvent, new: &MidiEvent) {
            self.log.push(format!("change {} -> {}", old.beat(), new.beat()));
        }

        fn on_remove_midi_event(&mut self, _project: &Project, event: &MidiEvent) {
            self.log.push(format!("remove {}", event.beat()));
        }

        fn on_add_clip(&mut self, _project: &Project, clip: &Clip) {
            self.log.push(format!("add clip {}", clip.beat));
        }

        fn on_add_track(&mut self, _project: &Project, track: &Track) {
            self.log.push(format!("add track {}", track.name));
        }

        fn on_change_project_beat_range(&mut self, _project: &Project, first: f32, last: f32) {
            self.log.push(format!("range {first}..{last}"));
        }
    }

    fn note(track: TrackId, key: i32, beat: f32) -> MidiEvent {
        Note::new(track, key, beat, 1.0, 0.5).into()
    }

    #[test]
    fn test_notifications_follow_mutation_order() {
        let mut project = Project::new();
        let mut rec = Recorder::default();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut rec);

        project.insert_event(note(track, 60, 0.0), &mut rec).unwrap();
        project.insert_event(note(track, 64, 8.0), &mut rec).unwrap();
        project.change_event(&note(track, 64, 8.0), note(track, 64, 1.0), &mut rec).unwrap();
        project.remove_event(&note(track, 60, 0.0), &mut rec).unwrap();

        assert_eq!(
            rec.log,
            vec![
                "add track Lead",
                "add 0",
                "add 8",
                "range 0..9",
                "change 8 -> 1",
                "range 0..4",
                "remove 0",
                "range 1..5",
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_mutations() {
        let mut project = Project::new();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut ());
        project.insert_event(note(track, 60, 0.0), &mut ()).unwrap();

        assert!(matches!(
            project.insert_event(note(track, 60, 0.0), &mut ()),
            Err(HelioError::DuplicateEvent(_))
        ));
        assert!(matches!(
            project.insert_event(note(track, 128, 0.0), &mut ()),
            Err(HelioError::InvalidKey(128))
        ));
        assert!(matches!(
            project.remove_event(&note(track, 61, 0.0), &mut ()),
            Err(HelioError::EventNotFound(_))
        ));
        assert!(matches!(
            project.insert_event(note(TrackId(99), 60, 0.0), &mut ()),
            Err(HelioError::TrackNotFound(TrackId(99)))
        ));

        let key = KeySignatureEvent::new(track, 0.0, 0, Scale::natural_major());
        assert!(matches!(
            project.change_event(&note(track, 60, 0.0), key.into(), &mut ()),
            Err(HelioError::EventKindMismatch(_))
        ));
    }

    #[test]
    fn test_change_events_reorders_overlapping_shifts() {
        let mut project = Project::new();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut ());
        for beat in [0.0, 1.0, 2.0] {
            project.insert_event(note(track, 60, beat), &mut ()).unwrap();
        }

        // Shift every note one beat right: naive order would collide
        let changes = [0.0, 1.0, 2.0]
            .into_iter()
            .map(|b| (note(track, 60, b), note(track, 60, b + 1.0)))
            .collect();
        project.change_events(changes, &mut ()).unwrap();

        let beats: Vec<f32> = project.get_track(track).unwrap().notes().map(|n| n.beat).collect();
        assert_eq!(beats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejected_change_events_leave_document_untouched() {
        let mut project = Project::new();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut ());
        for key in [60, 64, 66] {
            project.insert_event(note(track, key, 0.0), &mut ()).unwrap();
        }

        // 64 -> 66 lands on a note that is not part of the shift
        let mut rec = Recorder::default();
        let changes = [60, 64]
            .into_iter()
            .map(|k| (note(track, k, 0.0), note(track, k + 2, 0.0)))
            .collect();
        assert!(matches!(
            project.change_events(changes, &mut rec),
            Err(HelioError::DuplicateEvent(t)) if t == track
        ));
        assert!(rec.log.is_empty());

        let keys: Vec<i32> = project.get_track(track).unwrap().notes().map(|n| n.key).collect();
        assert_eq!(keys, vec![60, 64, 66]);

        // A missing note anywhere in the batch rejects the whole batch
        let changes = vec![
            (note(track, 60, 0.0), note(track, 60, 4.0)),
            (note(track, 61, 0.0), note(track, 61, 4.0)),
        ];
        assert!(matches!(
            project.change_events(changes, &mut rec),
            Err(HelioError::EventNotFound(_))
        ));
        assert!(rec.log.is_empty());

        // Two notes merging into one
        let changes = vec![
            (note(track, 60, 0.0), note(track, 62, 0.0)),
            (note(track, 64, 0.0), note(track, 62, 0.0)),
        ];
        assert!(matches!(
            project.change_events(changes, &mut rec),
            Err(HelioError::DuplicateEvent(_))
        ));
        let keys: Vec<i32> = project.get_track(track).unwrap().notes().map(|n| n.key).collect();
        assert_eq!(keys, vec![60, 64, 66]);
    }

    #[test]
    fn test_cyclic_change_events_report_their_track() {
        let mut project = Project::new();
        project.add_track(TrackKind::Piano, "Bass", &mut ());
        let track = project.add_track(TrackKind::Piano, "Lead", &mut ());
        project.insert_event(note(track, 60, 0.0), &mut ()).unwrap();
        project.insert_event(note(track, 62, 0.0), &mut ()).unwrap();

        let changes = vec![
            (note(track, 60, 0.0), note(track, 62, 0.0)),
            (note(track, 62, 0.0), note(track, 60, 0.0)),
        ];
        match project.change_events(changes, &mut ()) {
            Err(HelioError::CyclicChanges(t)) => assert_eq!(t, track),
            other => panic!("unexpected result: {other:?}"),
        }
        let keys: Vec<i32> = project.get_track(track).unwrap().notes().map(|n| n.key).collect();
        assert_eq!(keys, vec![60, 62]);
    }

    #[test]
    fn test_clips_and_beat_range() {
        let mut project = Project::new();
        let mut rec = Recorder::default();
        let track = project.add_track(TrackKind::Piano, "Lead", &mut rec);
        project.insert_event(note(track, 60, 0.0), &mut rec).unwrap();

        let clip = project.add_clip(track, 16.0, &mut rec).unwrap();
        assert_eq!(project.beat_range(), (0.0, 17.0));
        assert!(matches!(
            project.add_clip(track, 16.0, &mut rec),
            Err(HelioError::DuplicateClip(_, _))
        ));

        let moved = project.change_clip(&clip, 4.0, &mut rec).unwrap();
        assert_eq!(moved.id, clip.id);
        assert_eq!(project.beat_range(), (0.0, 5.0));

        project.remove_clip(&moved, &mut rec).unwrap();
        assert!(matches!(project.remove_clip(&moved, &mut rec), Err(HelioError::ClipNotFound(_))));
        assert_eq!(project.get_track(track).unwrap().pattern().len(), 1);
    }

    #[test]
    fn test_key_signatures_sorted_across_tracks() {
        let mut project = Project::new();
        let keys = project.add_track(TrackKind::KeySignatures, "Keys", &mut ());
        let other = project.add_track(TrackKind::Piano, "Lead", &mut ());
        project
            .insert_event(KeySignatureEvent::new(keys, 8.0, 2, Scale::dorian()).into(), &mut ())
            .unwrap();
        project
            .insert_event(KeySignatureEvent::new(other, 0.0, 0, Scale::natural_major()).into(), &mut ())
            .unwrap();

        let beats: Vec<f32> = project.key_signatures().iter().map(|k| k.beat).collect();
        assert_eq!(beats, vec![0.0, 8.0]);
        assert!(project.get_track(keys).unwrap().pattern().is_empty());
    }

    #[test]
    fn test_time_signatures_sorted_across_tracks() {
        let mut project = Project::new();
        let meter = project.add_track(TrackKind::TimeSignatures, "Meter", &mut ());
        let other = project.add_track(TrackKind::TimeSignatures, "Meter 2", &mut ());
        project
            .insert_event(TimeSignatureEvent::new(meter, 12.0, 3, 4).into(), &mut ())
            .unwrap();
        project
            .insert_event(TimeSignatureEvent::new(other, 0.0, 4, 4).into(), &mut ())
            .unwrap();

        let signatures: Vec<(f32, u8)> = project.time_signatures().iter().map(|t| (t.beat, t.numerator)).collect();
        assert_eq!(signatures, vec![(0.0, 4), (12.0, 3)]);
        assert!(matches!(
            project.add_clip(meter, 0.0, &mut ()),
            Err(HelioError::NotAPianoTrack(_))
        ));
    }
}
