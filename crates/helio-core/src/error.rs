//! Error types for helio

use thiserror::Error;

use crate::clip::ClipId;
use crate::track::TrackId;

#[derive(Debug, Error)]
pub enum HelioError {
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("Event not found on track {0}")]
    EventNotFound(TrackId),
    #[error("Duplicate event on track {0}")]
    DuplicateEvent(TrackId),
    #[error("Duplicate clip on track {0} at beat {1}")]
    DuplicateClip(TrackId, f32),
    #[error("Event changes on track {0} swap places with each other")]
    CyclicChanges(TrackId),
    #[error("Cannot replace an event with an event of another kind on track {0}")]
    EventKindMismatch(TrackId),
    #[error("Track {0} is a timeline track and cannot hold clips")]
    NotAPianoTrack(TrackId),
    #[error("Key out of range: {0}")]
    InvalidKey(i32),
}

pub type Result<T> = std::result::Result<T, HelioError>;
