//! Sequence events: notes, key and time signatures, annotations

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::colour::Colour;
use crate::scale::Scale;
use crate::track::TrackId;

/// Number of keys a piano track can address (MIDI range)
pub const NUM_KEYS: i32 = 128;

/// A single note.
///
/// Notes are values: an edit replaces the old note with a new one and the
/// document reports the pair. Two notes are the same note when every field
/// matches, floats included (compared with `total_cmp`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Note {
    /// Owning track (each track has exactly one sequence)
    pub track: TrackId,
    /// MIDI key, 0..=127
    pub key: i32,
    /// Start, in beats, relative to the clip
    pub beat: f32,
    /// Length in beats
    pub length: f32,
    /// Volume, 0.0..=1.0
    pub velocity: f32,
}

impl Note {
    pub fn new(track: TrackId, key: i32, beat: f32, length: f32, velocity: f32) -> Self {
        Self {
            track,
            key,
            beat,
            length,
            velocity,
        }
    }

    pub fn end_beat(&self) -> f32 {
        self.beat + self.length
    }

    pub fn with_key(&self, key: i32) -> Self {
        Self { key, ..*self }
    }

    pub fn with_beat(&self, beat: f32) -> Self {
        Self { beat, ..*self }
    }

    pub fn with_length(&self, length: f32) -> Self {
        Self { length, ..*self }
    }

    pub fn with_velocity(&self, velocity: f32) -> Self {
        Self { velocity, ..*self }
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.track
            .cmp(&other.track)
            .then_with(|| self.beat.total_cmp(&other.beat))
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.length.total_cmp(&other.length))
            .then_with(|| self.velocity.total_cmp(&other.velocity))
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.track.hash(state);
        self.key.hash(state);
        self.beat.to_bits().hash(state);
        self.length.to_bits().hash(state);
        self.velocity.to_bits().hash(state);
    }
}

/// Key signature change on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySignatureEvent {
    pub track: TrackId,
    pub beat: f32,
    pub root_key: i32,
    pub scale: Arc<Scale>,
}

impl KeySignatureEvent {
    pub fn new(track: TrackId, beat: f32, root_key: i32, scale: Arc<Scale>) -> Self {
        Self {
            track,
            beat,
            root_key,
            scale,
        }
    }

    /// Whether both signatures would be highlighted the same way
    pub fn same_highlighting_as(&self, other: &KeySignatureEvent) -> bool {
        self.root_key == other.root_key && self.scale.is_equivalent_to(&other.scale)
    }
}

impl PartialEq for KeySignatureEvent {
    fn eq(&self, other: &Self) -> bool {
        self.track == other.track
            && self.beat.total_cmp(&other.beat) == Ordering::Equal
            && self.same_highlighting_as(other)
    }
}

/// Time signature change on the timeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSignatureEvent {
    pub track: TrackId,
    pub beat: f32,
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignatureEvent {
    pub fn new(track: TrackId, beat: f32, numerator: u8, denominator: u8) -> Self {
        Self {
            track,
            beat,
            numerator,
            denominator,
        }
    }
}

impl PartialEq for TimeSignatureEvent {
    fn eq(&self, other: &Self) -> bool {
        self.track == other.track
            && self.beat.total_cmp(&other.beat) == Ordering::Equal
            && self.numerator == other.numerator
            && self.denominator == other.denominator
    }
}

/// Text marker on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationEvent {
    pub track: TrackId,
    pub beat: f32,
    pub description: String,
    pub colour: Colour,
}

impl PartialEq for AnnotationEvent {
    fn eq(&self, other: &Self) -> bool {
        self.track == other.track
            && self.beat.total_cmp(&other.beat) == Ordering::Equal
            && self.description == other.description
            && self.colour == other.colour
    }
}

/// Any event a sequence can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MidiEvent {
    Note(Note),
    KeySignature(KeySignatureEvent),
    TimeSignature(TimeSignatureEvent),
    Annotation(AnnotationEvent),
}

impl MidiEvent {
    pub fn track(&self) -> TrackId {
        match self {
            MidiEvent::Note(n) => n.track,
            MidiEvent::KeySignature(k) => k.track,
            MidiEvent::TimeSignature(t) => t.track,
            MidiEvent::Annotation(a) => a.track,
        }
    }

    pub fn beat(&self) -> f32 {
        match self {
            MidiEvent::Note(n) => n.beat,
            MidiEvent::KeySignature(k) => k.beat,
            MidiEvent::TimeSignature(t) => t.beat,
            MidiEvent::Annotation(a) => a.beat,
        }
    }

    /// Beat where the event stops occupying the timeline
    pub fn end_beat(&self) -> f32 {
        match self {
            MidiEvent::Note(n) => n.end_beat(),
            other => other.beat(),
        }
    }

    /// Same event, owned by another track
    pub fn with_track(self, track: TrackId) -> Self {
        match self {
            MidiEvent::Note(n) => MidiEvent::Note(Note { track, ..n }),
            MidiEvent::KeySignature(k) => MidiEvent::KeySignature(KeySignatureEvent { track, ..k }),
            MidiEvent::TimeSignature(t) => MidiEvent::TimeSignature(TimeSignatureEvent { track, ..t }),
            MidiEvent::Annotation(a) => MidiEvent::Annotation(AnnotationEvent { track, ..a }),
        }
    }

    pub fn is_same_kind(&self, other: &MidiEvent) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            MidiEvent::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_key_signature(&self) -> Option<&KeySignatureEvent> {
        match self {
            MidiEvent::KeySignature(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_time_signature(&self) -> Option<&TimeSignatureEvent> {
        match self {
            MidiEvent::TimeSignature(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Note> for MidiEvent {
    fn from(note: Note) -> Self {
        MidiEvent::Note(note)
    }
}

impl From<KeySignatureEvent> for MidiEvent {
    fn from(key: KeySignatureEvent) -> Self {
        MidiEvent::KeySignature(key)
    }
}

impl From<TimeSignatureEvent> for MidiEvent {
    fn from(ts: TimeSignatureEvent) -> Self {
        MidiEvent::TimeSignature(ts)
    }
}

impl From<AnnotationEvent> for MidiEvent {
    fn from(a: AnnotationEvent) -> Self {
        MidiEvent::Annotation(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_note_identity_is_value_based() {
        let a = Note::new(TrackId(1), 60, 0.0, 1.0, 0.5);
        let b = Note::new(TrackId(1), 60, 0.0, 1.0, 0.5);
        assert_eq!(a, b);
        assert_ne!(a, a.with_velocity(0.6));
        assert_ne!(a, Note { track: TrackId(2), ..a });
    }

    #[test]
    fn test_notes_key_ordered_maps() {
        let mut map = BTreeMap::new();
        let a = Note::new(TrackId(1), 64, 1.0, 1.0, 0.5);
        let b = Note::new(TrackId(1), 60, 0.0, 1.0, 0.5);
        map.insert(a, "a");
        map.insert(b, "b");
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get(&a.with_key(64)), Some(&"a"));
    }

    #[test]
    fn test_key_signature_equality_uses_scale_equivalence() {
        let a = KeySignatureEvent::new(TrackId(0), 0.0, 2, Scale::natural_major());
        let b = KeySignatureEvent::new(TrackId(0), 0.0, 2, Arc::new(Scale::new("Ionian", [0, 2, 4, 5, 7, 9, 11], 12)));
        assert_eq!(a, b);
        assert!(a.same_highlighting_as(&KeySignatureEvent { beat: 8.0, ..b.clone() }));
    }
}
