//! Change notifications sent by the project after every mutation

use crate::clip::Clip;
use crate::event::MidiEvent;
use crate::project::Project;
use crate::track::Track;

/// Receives document changes synchronously, in mutation order.
///
/// The project is already updated when a callback runs, so `project`
/// reflects the state after the change. Every callback defaults to a no-op.
pub trait ProjectListener {
    fn on_add_midi_event(&mut self, _project: &Project, _event: &MidiEvent) {}
    fn on_change_midi_event(&mut self, _project: &Project, _old: &MidiEvent, _new: &MidiEvent) {}
    fn on_remove_midi_event(&mut self, _project: &Project, _event: &MidiEvent) {}

    fn on_add_clip(&mut self, _project: &Project, _clip: &Clip) {}
    fn on_change_clip(&mut self, _project: &Project, _old: &Clip, _new: &Clip) {}
    fn on_remove_clip(&mut self, _project: &Project, _clip: &Clip) {}

    fn on_add_track(&mut self, _project: &Project, _track: &Track) {}
    fn on_remove_track(&mut self, _project: &Project, _track: &Track) {}
    fn on_change_track_properties(&mut self, _project: &Project, _track: &Track) {}

    fn on_reload_project_content(&mut self, _project: &Project) {}
    fn on_change_project_beat_range(&mut self, _project: &Project, _first_beat: f32, _last_beat: f32) {}
    fn on_change_view_beat_range(&mut self, _project: &Project, _first_beat: f32, _last_beat: f32) {}
}

/// Mutations nobody observes
impl ProjectListener for () {}

/// Forwards each notification to several listeners, in order
#[derive(Default)]
pub struct Broadcast<'a> {
    listeners: Vec<&'a mut dyn ProjectListener>,
}

impl<'a> Broadcast<'a> {
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    pub fn with(mut self, listener: &'a mut dyn ProjectListener) -> Self {
        self.listeners.push(listener);
        self
    }
}

impl ProjectListener for Broadcast<'_> {
    fn on_add_midi_event(&mut self, project: &Project, event: &MidiEvent) {
        for l in self.listeners.iter_mut() {
            l.on_add_midi_event(project, event);
        }
    }

    fn on_change_midi_event(&mut self, project: &Project, old: &MidiEvent, new: &MidiEvent) {
        for l in self.listeners.iter_mut() {
            l.on_change_midi_event(project, old, new);
        }
    }

    fn on_remove_midi_event(&mut self, project: &Project, event: &MidiEvent) {
        for l in self.listeners.iter_mut() {
            l.on_remove_midi_event(project, event);
        }
    }

    fn on_add_clip(&mut self, project: &Project, clip: &Clip) {
        for l in self.listeners.iter_mut() {
            l.on_add_clip(project, clip);
        }
    }

    fn on_change_clip(&mut self, project: &Project, old: &Clip, new: &Clip) {
        for l in self.listeners.iter_mut() {
            l.on_change_clip(project, old, new);
        }
    }

    fn on_remove_clip(&mut self, project: &Project, clip: &Clip) {
        for l in self.listeners.iter_mut() {
            l.on_remove_clip(project, clip);
        }
    }

    fn on_add_track(&mut self, project: &Project, track: &Track) {
        for l in self.listeners.iter_mut() {
            l.on_add_track(project, track);
        }
    }

    fn on_remove_track(&mut self, project: &Project, track: &Track) {
        for l in self.listeners.iter_mut() {
            l.on_remove_track(project, track);
        }
    }

    fn on_change_track_properties(&mut self, project: &Project, track: &Track) {
        for l in self.listeners.iter_mut() {
            l.on_change_track_properties(project, track);
        }
    }

    fn on_reload_project_content(&mut self, project: &Project) {
        for l in self.listeners.iter_mut() {
            l.on_reload_project_content(project);
        }
    }

    fn on_change_project_beat_range(&mut self, project: &Project, first_beat: f32, last_beat: f32) {
        for l in self.listeners.iter_mut() {
            l.on_change_project_beat_range(project, first_beat, last_beat);
        }
    }

    fn on_change_view_beat_range(&mut self, project: &Project, first_beat: f32, last_beat: f32) {
        for l in self.listeners.iter_mut() {
            l.on_change_view_beat_range(project, first_beat, last_beat);
        }
    }
}
