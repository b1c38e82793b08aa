//! helio-core: Document model for the Helio sequencer

mod clip;
mod colour;
mod error;
mod event;
mod listener;
mod project;
pub mod scale;
mod track;

pub use clip::{Clip, ClipId};
pub use colour::Colour;
pub use error::{HelioError, Result};
pub use event::{AnnotationEvent, KeySignatureEvent, MidiEvent, Note, TimeSignatureEvent, NUM_KEYS};
pub use listener::{Broadcast, ProjectListener};
pub use project::Project;
pub use scale::Scale;
pub use track::{Track, TrackId, TrackKind};

/// Beats in one bar; the roll grid assumes 4/4 bars
pub const BEATS_PER_BAR: f32 = 4.0;

/// MIDI key of middle C
pub const MIDDLE_C: i32 = 60;
