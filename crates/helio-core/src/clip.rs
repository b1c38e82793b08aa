//! Clips: placements of a track's sequence on the timeline

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::track::TrackId;

/// Unique identifier for clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One instance of a track's sequence, shifted by `beat`.
///
/// A clip is identified by its owning track, its id and its offset, so
/// moving a clip produces a new clip value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub track: TrackId,
    /// Offset in beats of the sequence start
    pub beat: f32,
}

impl Clip {
    pub fn new(id: ClipId, track: TrackId, beat: f32) -> Self {
        Self { id, track, beat }
    }

    pub fn with_beat(&self, beat: f32) -> Self {
        Self { beat, ..*self }
    }
}

impl Ord for Clip {
    fn cmp(&self, other: &Self) -> Ordering {
        self.track
            .cmp(&other.track)
            .then_with(|| self.beat.total_cmp(&other.beat))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Clip {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Clip {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Clip {}

impl Hash for Clip {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.track.hash(state);
        self.beat.to_bits().hash(state);
    }
}
