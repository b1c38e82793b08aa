//! UI panels

mod piano_roll;
mod track_map;
mod tracks;

pub use piano_roll::{PianoRollAction, PianoRollPanel};
pub use track_map::{TrackMapAction, TrackMapPanel};
pub use tracks::{TrackAction, TracksPanel};
