//! Two-level index mirroring the document: clip -> (note -> visual entry)
//!
//! A note of a track is shown once per clip of that track, so every clip of
//! a track holds an entry for every note of the track. Entries are keyed by
//! value; a change takes the entry out of its old slot and puts it back under
//! the new key.

use std::collections::BTreeMap;

use helio_core::{Clip, Note, Track, TrackId};
use tracing::error;

/// Visual entry stored in a [`PatternMap`]
pub trait NoteEntry {
    fn note(&self) -> &Note;
    fn clip(&self) -> &Clip;
    /// Follow a document change of the note
    fn set_note(&mut self, note: Note);
    /// Follow a document change of the clip
    fn set_clip(&mut self, clip: Clip);
}

pub type SequenceMap<E> = BTreeMap<Note, E>;

#[derive(Debug)]
pub struct PatternMap<E> {
    clips: BTreeMap<Clip, SequenceMap<E>>,
}

impl<E> Default for PatternMap<E> {
    fn default() -> Self {
        Self { clips: BTreeMap::new() }
    }
}

impl<E: NoteEntry> PatternMap<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Total number of entries over all clips
    pub fn len(&self) -> usize {
        self.clips.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.values().all(BTreeMap::is_empty)
    }

    pub fn num_clips(&self) -> usize {
        self.clips.len()
    }

    pub fn contains_clip(&self, clip: &Clip) -> bool {
        self.clips.contains_key(clip)
    }

    pub fn sequence_map(&self, clip: &Clip) -> Option<&SequenceMap<E>> {
        self.clips.get(clip)
    }

    pub fn get(&self, clip: &Clip, note: &Note) -> Option<&E> {
        self.clips.get(clip)?.get(note)
    }

    pub fn get_mut(&mut self, clip: &Clip, note: &Note) -> Option<&mut E> {
        self.clips.get_mut(clip)?.get_mut(note)
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.clips.values().flat_map(BTreeMap::values)
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.clips.values_mut().flat_map(BTreeMap::values_mut)
    }

    fn track_maps_mut(&mut self, track: TrackId) -> impl Iterator<Item = (&Clip, &mut SequenceMap<E>)> {
        self.clips.iter_mut().filter(move |(clip, _)| clip.track == track)
    }

    /// Build a submap for every clip of `track`. Returns the number of
    /// entries created.
    pub fn load_track(&mut self, track: &Track, mut make: impl FnMut(&Note, &Clip) -> E) -> usize {
        let mut created = 0;
        for clip in track.pattern() {
            let map = self.clips.entry(*clip).or_default();
            for note in track.notes() {
                map.insert(*note, make(note, clip));
                created += 1;
            }
        }
        created
    }

    /// Add an entry for `note` in every clip of its track. Returns the clips
    /// that received one.
    pub fn add_note(&mut self, note: &Note, mut make: impl FnMut(&Note, &Clip) -> E) -> Vec<Clip> {
        let mut added = Vec::new();
        for (clip, map) in self.track_maps_mut(note.track) {
            if map.contains_key(note) {
                error!(track = %note.track, key = note.key, beat = note.beat, "Note already indexed");
                debug_assert!(false, "duplicate note entry");
                continue;
            }
            map.insert(*note, make(note, clip));
            added.push(*clip);
        }
        added
    }

    /// Move the entries of `old` under the key `new`. Returns the clips whose
    /// entry was moved.
    pub fn change_note(&mut self, old: &Note, new: &Note) -> Vec<Clip> {
        let mut moved = Vec::new();
        for (clip, map) in self.track_maps_mut(old.track) {
            let Some(mut entry) = map.remove(old) else {
                error!(track = %old.track, key = old.key, beat = old.beat, "Changed note is not indexed");
                debug_assert!(false, "missing note entry on change");
                continue;
            };
            if map.contains_key(new) {
                error!(track = %new.track, key = new.key, beat = new.beat, "Changed note collides with an indexed note");
                debug_assert!(false, "note entry slot already taken");
                continue;
            }
            entry.set_note(*new);
            map.insert(*new, entry);
            moved.push(*clip);
        }
        moved
    }

    /// Take the entries of `note` out of every clip of its track
    pub fn remove_note(&mut self, note: &Note) -> Vec<E> {
        let mut removed = Vec::new();
        for (_, map) in self.track_maps_mut(note.track) {
            match map.remove(note) {
                Some(entry) => removed.push(entry),
                None => {
                    error!(track = %note.track, key = note.key, beat = note.beat, "Removed note is not indexed");
                    debug_assert!(false, "missing note entry on remove");
                }
            }
        }
        removed
    }

    /// Create the submap of a new clip, copying the notes of another clip of
    /// the same track. When the track had no clip yet, the notes come from
    /// `track`. Returns the notes that received an entry.
    pub fn add_clip(
        &mut self,
        clip: &Clip,
        track: Option<&Track>,
        mut make: impl FnMut(&Note, &Clip) -> E,
    ) -> Vec<Note> {
        if self.clips.contains_key(clip) {
            error!(clip = %clip.id, "Clip already indexed");
            debug_assert!(false, "duplicate clip submap");
            return Vec::new();
        }

        let template: Option<Vec<Note>> = self
            .clips
            .iter()
            .find(|(c, _)| c.track == clip.track)
            .map(|(_, map)| map.keys().copied().collect());

        let notes = match (template, track) {
            (Some(notes), _) => notes,
            (None, Some(track)) => track.notes().copied().collect(),
            (None, None) => {
                error!(clip = %clip.id, track = %clip.track, "No notes to instantiate clip from");
                debug_assert!(false, "clip added without template");
                return Vec::new();
            }
        };

        let map = notes.iter().map(|note| (*note, make(note, clip))).collect();
        self.clips.insert(*clip, map);
        notes
    }

    /// Re-key the submap of a moved clip. Returns false when it was missing.
    pub fn change_clip(&mut self, old: &Clip, new: &Clip) -> bool {
        let Some(mut map) = self.clips.remove(old) else {
            error!(clip = %old.id, "Changed clip is not indexed");
            debug_assert!(false, "missing clip submap on change");
            return false;
        };
        if self.clips.contains_key(new) {
            error!(clip = %new.id, "Changed clip collides with an indexed clip");
            debug_assert!(false, "clip submap slot already taken");
            return false;
        }
        for entry in map.values_mut() {
            entry.set_clip(*new);
        }
        self.clips.insert(*new, map);
        true
    }

    pub fn remove_clip(&mut self, clip: &Clip) -> Option<SequenceMap<E>> {
        let removed = self.clips.remove(clip);
        if removed.is_none() {
            error!(clip = %clip.id, "Removed clip is not indexed");
            debug_assert!(false, "missing clip submap on remove");
        }
        removed
    }

    /// Drop every submap of a track
    pub fn remove_track(&mut self, track: TrackId) -> Vec<E> {
        let clips: Vec<Clip> = self.clips.keys().filter(|c| c.track == track).copied().collect();
        clips
            .iter()
            .filter_map(|clip| self.clips.remove(clip))
            .flat_map(BTreeMap::into_values)
            .collect()
    }
}
