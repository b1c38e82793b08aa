//! Set of selected note entries, identified by (clip, note)

use std::collections::BTreeSet;

use helio_core::{Clip, Note};

#[derive(Debug, Default, Clone)]
pub struct Selection {
    items: BTreeSet<(Clip, Note)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, clip: &Clip, note: &Note) -> bool {
        self.items.contains(&(*clip, *note))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Clip, Note)> {
        self.items.iter()
    }

    /// Selected notes, without the clips they were picked in
    pub fn notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.items.iter().map(|(_, n)| *n).collect();
        notes.sort();
        notes.dedup();
        notes
    }

    pub fn select(&mut self, clip: Clip, note: Note) -> bool {
        self.items.insert((clip, note))
    }

    pub fn deselect(&mut self, clip: &Clip, note: &Note) -> bool {
        self.items.remove(&(*clip, *note))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Follow a note change in every clip it was selected in
    pub fn rekey_note(&mut self, old: &Note, new: &Note) {
        let moved: Vec<Clip> = self.items.iter().filter(|(_, n)| n == old).map(|(c, _)| *c).collect();
        for clip in moved {
            self.items.remove(&(clip, *old));
            self.items.insert((clip, *new));
        }
    }

    /// Follow a clip move
    pub fn rekey_clip(&mut self, old: &Clip, new: &Clip) {
        let moved: Vec<Note> = self.items.iter().filter(|(c, _)| c == old).map(|(_, n)| *n).collect();
        for note in moved {
            self.items.remove(&(*old, note));
            self.items.insert((*new, note));
        }
    }

    /// Drop everything matching `pred`; returns what was dropped
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Clip, &Note) -> bool) -> Vec<(Clip, Note)> {
        let removed: Vec<(Clip, Note)> = self.items.iter().filter(|(c, n)| pred(c, n)).copied().collect();
        for item in &removed {
            self.items.remove(item);
        }
        removed
    }
}
