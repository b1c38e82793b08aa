//! Track representation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId};
use crate::colour::Colour;
use crate::event::{KeySignatureEvent, MidiEvent, Note, TimeSignatureEvent};

/// Unique identifier for tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Track type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Piano,
    KeySignatures,
    TimeSignatures,
    Annotations,
}

impl TrackKind {
    /// Timeline tracks hold global events and are never instantiated by clips
    pub fn is_timeline(self) -> bool {
        !matches!(self, TrackKind::Piano)
    }
}

/// A track: one sequence of events plus the clips that place it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    pub name: String,
    pub colour: Colour,
    /// Clips sorted by beat
    pub(crate) pattern: Vec<Clip>,
    /// Events sorted by beat
    pub(crate) sequence: Vec<MidiEvent>,
}

impl Track {
    pub fn new(id: TrackId, kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            colour: Colour::default(),
            pattern: Vec::new(),
            sequence: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &[Clip] {
        &self.pattern
    }

    pub fn sequence(&self) -> &[MidiEvent] {
        &self.sequence
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.sequence.iter().filter_map(MidiEvent::as_note)
    }

    pub fn key_signatures(&self) -> impl Iterator<Item = &KeySignatureEvent> {
        self.sequence.iter().filter_map(MidiEvent::as_key_signature)
    }

    pub fn time_signatures(&self) -> impl Iterator<Item = &TimeSignatureEvent> {
        self.sequence.iter().filter_map(MidiEvent::as_time_signature)
    }

    pub fn get_clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.pattern.iter().find(|c| c.id == clip_id)
    }

    pub fn contains_event(&self, event: &MidiEvent) -> bool {
        self.sequence.contains(event)
    }

    /// First beat of the sequence, 0 when empty
    pub fn first_beat(&self) -> f32 {
        self.sequence.first().map_or(0.0, MidiEvent::beat)
    }

    /// Beat where the last event ends, 0 when empty
    pub fn last_beat(&self) -> f32 {
        self.sequence
            .iter()
            .map(MidiEvent::end_beat)
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    /// Insert keeping events sorted by beat
    pub(crate) fn insert_event(&mut self, event: MidiEvent) {
        let beat = event.beat();
        let idx = self.sequence
            .iter()
            .position(|e| e.beat() > beat)
            .unwrap_or(self.sequence.len());
        self.sequence.insert(idx, event);
    }

    pub(crate) fn remove_event(&mut self, event: &MidiEvent) -> Option<MidiEvent> {
        let pos = self.sequence.iter().position(|e| e == event)?;
        Some(self.sequence.remove(pos))
    }

    /// Insert keeping clips sorted by beat
    pub(crate) fn add_clip(&mut self, clip: Clip) {
        let idx = self.pattern
            .iter()
            .position(|c| c.beat > clip.beat)
            .unwrap_or(self.pattern.len());
        self.pattern.insert(idx, clip);
    }

    pub(crate) fn remove_clip(&mut self, clip: &Clip) -> Option<Clip> {
        let pos = self.pattern.iter().position(|c| c == clip)?;
        Some(self.pattern.remove(pos))
    }
}
