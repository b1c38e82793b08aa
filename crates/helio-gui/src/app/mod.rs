//! Main application state

mod config;
mod demo;

use eframe::CreationContext;
use egui::Context;
use helio_core::{Broadcast, MidiEvent, Project, TrackId, TrackKind};
use helio_roll::{PianoRoll, PianoTrackMap, RollAction, RollTheme, TimeSignatureMap};

use config::{load_config, save_config, AppConfig};
use demo::{demo_project, PALETTE};

use crate::panels::{
    PianoRollAction, PianoRollPanel, TrackAction, TrackMapAction, TrackMapPanel, TracksPanel,
};

pub struct HelioApp {
    project: Project,
    roll: PianoRoll,
    track_map: PianoTrackMap,
    time_signatures: TimeSignatureMap,
    config: AppConfig,

    // Panels
    roll_panel: PianoRollPanel,
    track_map_panel: TrackMapPanel,
    tracks_panel: TracksPanel,
}

impl HelioApp {
    pub fn new(_cc: &CreationContext<'_>) -> Self {
        let config = load_config();

        let theme = RollTheme {
            noise: config.roll.noise,
            ..RollTheme::default()
        };
        let mut roll = PianoRoll::new(theme);
        roll.set_default_note_volume(config.roll.default_note_volume);
        roll.set_row_height(config.roll.row_height);
        roll.set_bar_width(config.roll.bar_width);

        let mut app = Self {
            project: Project::new(),
            roll,
            track_map: PianoTrackMap::new(),
            time_signatures: TimeSignatureMap::new(),
            config,
            roll_panel: PianoRollPanel::new(),
            track_map_panel: TrackMapPanel,
            tracks_panel: TracksPanel,
        };

        match demo_project() {
            Ok(demo) => {
                let mut listener = views(&mut app.roll, &mut app.track_map, &mut app.time_signatures);
                app.project.replace_content(demo, &mut listener);
            }
            Err(e) => tracing::error!("Failed to build starting project: {}", e),
        }

        let view_state = app.config.state.load_view_state();
        if let Some((track, clip)) = first_piano_clip(&app.project) {
            app.roll.set_editable_scope(&app.project, track, &clip, view_state.is_err());
        }
        match view_state {
            Ok(state) => {
                tracing::info!("Restored roll view state");
                app.roll.deserialize(&state);
            }
            Err(e) => tracing::debug!("No saved view state: {:#}", e),
        }
        app.sync_view_range();

        tracing::info!("Loaded {} tracks", app.project.tracks().len());
        app
    }

    fn apply_roll_action(&mut self, action: RollAction) {
        let mut listener = views(&mut self.roll, &mut self.track_map, &mut self.time_signatures);
        let result = match action {
            RollAction::AddNote(note) => self.project.insert_event(note.into(), &mut listener),
            RollAction::ResizeNote { old, new } => {
                self.project.change_event(&old.into(), new.into(), &mut listener)
            }
            RollAction::ChangeNotes(changes) => {
                let changes = changes.into_iter().map(|(a, b)| (a.into(), b.into())).collect();
                self.project.change_events(changes, &mut listener)
            }
            RollAction::DeleteNotes(notes) => {
                let events: Vec<MidiEvent> = notes.into_iter().map(Into::into).collect();
                self.project.remove_events(&events, &mut listener)
            }
        };
        if let Err(e) = result {
            tracing::warn!("Edit rejected: {}", e);
        }
    }

    fn apply_track_action(&mut self, action: TrackAction) {
        if let TrackAction::Select(track, clip) = action {
            self.roll.set_editable_scope(&self.project, track, &clip, true);
            self.sync_view_range();
            return;
        }

        let mut listener = views(&mut self.roll, &mut self.track_map, &mut self.time_signatures);
        let result = match action {
            TrackAction::Select(..) => Ok(()),
            TrackAction::Add => {
                let n = self.project.tracks().iter().filter(|t| t.kind == TrackKind::Piano).count();
                let id = self.project.add_track(TrackKind::Piano, format!("Track {}", n + 1), &mut listener);
                self.project.set_track_colour(id, PALETTE[n % PALETTE.len()], &mut listener)
            }
            TrackAction::CycleColour(id) => {
                let current = self.project.get_track(id).map(|t| t.colour);
                let next = PALETTE
                    .iter()
                    .position(|c| Some(*c) == current)
                    .map_or(0, |i| (i + 1) % PALETTE.len());
                self.project.set_track_colour(id, PALETTE[next], &mut listener)
            }
            TrackAction::Remove(id) => self.project.remove_track(id, &mut listener).map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!("Track action failed: {}", e);
        }
    }

    /// Publish the roll's visible beats so the track map indicator follows
    fn sync_view_range(&mut self) {
        self.time_signatures.sync_geometry(self.roll.geometry());
        let (first, last) = self.roll.geometry().visible_beat_range();
        if (first, last) != self.project.view_beat_range() {
            let mut listener = views(&mut self.roll, &mut self.track_map, &mut self.time_signatures);
            self.project.set_view_beat_range(first, last, &mut listener);
        }
    }

    fn scroll_to_beat(&mut self, beat: f32) {
        let geometry = self.roll.geometry();
        let viewport = geometry.viewport();
        let x = geometry.x_position_by_beat(beat) - viewport.width / 2.0;
        self.roll.set_view_position(x, viewport.y);
        self.sync_view_range();
    }
}

/// Every view mirroring the project
fn views<'a>(
    roll: &'a mut PianoRoll,
    track_map: &'a mut PianoTrackMap,
    time_signatures: &'a mut TimeSignatureMap,
) -> Broadcast<'a> {
    Broadcast::new().with(roll).with(track_map).with(time_signatures)
}

fn first_piano_clip(project: &Project) -> Option<(TrackId, helio_core::Clip)> {
    project
        .tracks()
        .iter()
        .filter(|t| t.kind == TrackKind::Piano)
        .find_map(|t| t.pattern().first().map(|c| (t.id, *c)))
}

impl eframe::App for HelioApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let track_action = egui::SidePanel::left("tracks")
            .default_width(220.0)
            .show(ctx, |ui| self.tracks_panel.ui(ui, &self.project, self.roll.active_track()))
            .inner;
        if let Some(action) = track_action {
            self.apply_track_action(action);
        }

        let map_action = egui::TopBottomPanel::bottom("track_map")
            .exact_height(96.0)
            .show(ctx, |ui| self.track_map_panel.ui(ui, &mut self.track_map, &self.project))
            .inner;
        if let Some(TrackMapAction::ScrollToBeat(beat)) = map_action {
            self.scroll_to_beat(beat);
        }

        self.time_signatures.sync_geometry(self.roll.geometry());
        let roll_actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                self.roll_panel
                    .ui(ui, &mut self.roll, &self.time_signatures, &self.project)
            })
            .inner;
        let mut view_changed = false;
        for action in roll_actions {
            match action {
                PianoRollAction::Edit(edit) => self.apply_roll_action(edit),
                PianoRollAction::ViewChanged => view_changed = true,
            }
        }
        if view_changed {
            self.sync_view_range();
        }

        // Relayout queued by this frame's notifications
        if self.roll.handle_async_update() > 0 {
            ctx.request_repaint();
        }
        let dt = ctx.input(|i| i.stable_dt);
        if self.roll.advance_fades(dt) || self.roll.needs_update() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.config.state.save_view_state(&self.roll.serialize()) {
            tracing::warn!("Failed to save view state: {:#}", e);
        }
        save_config(&self.config);
    }
}
