//! helio-roll: Piano roll engine
//!
//! Keeps a visual index of every note per clip in sync with a
//! [`helio_core::Project`], maps it to pixels and renders the key-signature
//! backgrounds. Drawing itself is left to the GUI.

mod error;
pub mod geometry;
mod highlighting;
mod index;
mod note_component;
mod piano_roll;
mod selection;
mod theme;
mod tile;
mod time_signature_map;
mod track_map;
mod view_state;

pub use error::{Result, RollError};
pub use geometry::{Bounds, Point, RollGeometry, Viewport};
pub use highlighting::{BackgroundCache, HighlightingScheme};
pub use index::{NoteEntry, PatternMap, SequenceMap};
pub use note_component::NoteComponent;
pub use piano_roll::{
    ActiveRange, BackgroundSpan, EditMode, HelperBand, PianoRoll, RollAction, RollCommand, DEFAULT_NOTE_LENGTH,
    DEFAULT_NOTE_VOLUME,
};
pub use selection::Selection;
pub use theme::RollTheme;
pub use tile::{render_rows_pattern, RowTile, ROWS_OF_TWO_OCTAVES, TILE_WIDTH};
pub use time_signature_map::{TimeSignatureMap, TimeSignatureMarker};
pub use track_map::{PianoTrackMap, TrackMapNote};
pub use view_state::RollViewState;
