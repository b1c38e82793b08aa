//! Track list: pick the edited track, add, recolour and remove tracks

use egui::{Color32, Ui};
use helio_core::{Clip, Project, TrackId, TrackKind};

pub enum TrackAction {
    /// Edit `clip` of `track`
    Select(TrackId, Clip),
    Add,
    CycleColour(TrackId),
    Remove(TrackId),
}

#[derive(Default)]
pub struct TracksPanel;

impl TracksPanel {
    pub fn ui(&mut self, ui: &mut Ui, project: &Project, active: Option<TrackId>) -> Option<TrackAction> {
        let mut action = None;

        ui.heading("Tracks");
        ui.separator();

        for track in project.tracks() {
            let Some(clip) = track.pattern().first() else {
                // Timeline tracks
                ui.weak(track.name.as_str());
                continue;
            };

            ui.horizontal(|ui| {
                let c = track.colour;
                let swatch = egui::Button::new("  ").fill(Color32::from_rgb(c.r, c.g, c.b));
                if ui.add(swatch).on_hover_text("Change colour").clicked() {
                    action = Some(TrackAction::CycleColour(track.id));
                }
                if ui.selectable_label(active == Some(track.id), track.name.as_str()).clicked() {
                    action = Some(TrackAction::Select(track.id, *clip));
                }
                ui.label(format!("{} notes", track.notes().count()));
                if ui.small_button("x").on_hover_text("Remove track").clicked() {
                    action = Some(TrackAction::Remove(track.id));
                }
            });
        }

        ui.separator();
        if ui.button("Add Track").clicked() {
            action = Some(TrackAction::Add);
        }

        let clips = project
            .tracks()
            .iter()
            .filter(|t| t.kind == TrackKind::Piano)
            .map(|t| t.pattern().len())
            .sum::<usize>();
        ui.weak(format!("{} clips", clips));

        action
    }
}
