use helio_core::{Clip, Colour, Note};

use crate::geometry::{Bounds, Point};

/// Document edits requested by the roll.
///
/// The roll never mutates the project itself; the owner applies these and
/// the resulting notifications flow back into the roll.
#[derive(Clone, Debug, PartialEq)]
pub enum RollAction {
    AddNote(Note),
    /// Length change of the note being drawn
    ResizeNote { old: Note, new: Note },
    ChangeNotes(Vec<(Note, Note)>),
    DeleteNotes(Vec<Note>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Click selects, drag draws a lasso
    #[default]
    Select,
    /// Click adds a note, drag sets its length
    Draw,
}

/// Keyboard commands over the current selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollCommand {
    SelectAll,
    DeleteEvents,
    BeatShiftLeft,
    BeatShiftRight,
    BarShiftLeft,
    BarShiftRight,
    KeyShiftUp,
    KeyShiftDown,
    OctaveShiftUp,
    OctaveShiftDown,
}

/// Beat span of the edited track, drawn over the ruler
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveRange {
    pub colour: Colour,
    pub first_beat: f32,
    pub last_beat: f32,
}

/// The note created by the current draw gesture
#[derive(Clone, Copy, Debug)]
pub(crate) struct NewNoteDrag {
    pub clip: Clip,
    pub note: Note,
}

/// Translucent band marking the rows and beats covered by a dragged selection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HelperBand {
    pub bounds: Bounds,
}

/// Pointer gesture in progress
#[derive(Clone, Copy, Debug, Default)]
pub(crate) enum Gesture {
    #[default]
    Idle,
    Lasso { origin: Point, current: Point },
    /// Dragging the selection; deltas are snapped
    Move { anchor: Point, delta_beat: f32, delta_key: i32 },
}
