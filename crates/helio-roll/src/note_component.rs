//! Visual entry of one note inside one clip of the piano roll

use helio_core::{Clip, Colour, Note, TrackId};

use crate::geometry::Bounds;
use crate::index::NoteEntry;

/// Blend towards the background for notes outside the editable scope
const INACTIVE_FADE: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct NoteComponent {
    note: Note,
    clip: Clip,
    track_colour: Colour,
    bounds: Bounds,
    active: bool,
    selected: bool,
    ghost: bool,
    /// 0 = invisible, 1 = fully shown; animated when added or removed
    opacity: f32,
}

impl NoteComponent {
    pub fn new(note: Note, clip: Clip, track_colour: Colour, active: bool) -> Self {
        Self {
            note,
            clip,
            track_colour,
            bounds: Bounds::default(),
            active,
            selected: false,
            ghost: false,
            opacity: 1.0,
        }
    }

    pub fn key(&self) -> i32 {
        self.note.key
    }

    /// Beat within the roll, the clip offset included
    pub fn beat(&self) -> f32 {
        self.note.beat + self.clip.beat
    }

    pub fn length(&self) -> f32 {
        self.note.length
    }

    pub fn velocity(&self) -> f32 {
        self.note.velocity
    }

    pub fn belongs_to(&self, track: Option<TrackId>, clip: Option<&Clip>) -> bool {
        track == Some(self.note.track) && clip == Some(&self.clip)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    /// Turn this copy into a ghost: a disabled outline left behind while
    /// the selected note is dragged
    pub fn into_ghost(mut self) -> Self {
        self.ghost = true;
        self.active = false;
        self.selected = false;
        self
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn track_colour(&self) -> Colour {
        self.track_colour
    }

    pub fn set_track_colour(&mut self, colour: Colour) {
        self.track_colour = colour;
    }

    /// Fill colour: track colour, dimmed outside the editable scope and
    /// lightened with velocity
    pub fn colour(&self, background: Colour) -> Colour {
        let base = self.track_colour.brighter(self.note.velocity * 0.2);
        if self.ghost {
            base.interpolated_with(background, 0.8)
        } else if self.active {
            base
        } else {
            base.interpolated_with(background, INACTIVE_FADE)
        }
    }
}

impl NoteEntry for NoteComponent {
    fn note(&self) -> &Note {
        &self.note
    }

    fn clip(&self) -> &Clip {
        &self.clip
    }

    fn set_note(&mut self, note: Note) {
        self.note = note;
    }

    fn set_clip(&mut self, clip: Clip) {
        self.clip = clip;
    }
}
