//! Overview strip of every piano track under the roll

use egui::{Color32, Rect, Sense, Stroke, StrokeKind, Ui, Vec2};
use helio_core::Project;
use helio_roll::{Bounds, PianoTrackMap};

pub enum TrackMapAction {
    /// Centre the roll on this project beat
    ScrollToBeat(f32),
}

#[derive(Default)]
pub struct TrackMapPanel;

impl TrackMapPanel {
    pub fn ui(&mut self, ui: &mut Ui, map: &mut PianoTrackMap, project: &Project) -> Option<TrackMapAction> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        let (width, height) = map.size();
        if (rect.width() - width).abs() > 0.5 || (rect.height() - height).abs() > 0.5 {
            map.resized(rect.width(), rect.height());
        }

        let to_screen = |b: Bounds| Rect::from_min_size(rect.min + Vec2::new(b.x, b.y), Vec2::new(b.w, b.h));

        painter.rect_filled(rect, 0.0, Color32::from_gray(22));
        for note in map.notes() {
            let c = note.colour();
            painter.rect_filled(to_screen(note.bounds()), 0.0, Color32::from_rgb(c.r, c.g, c.b));
        }
        let indicator = to_screen(map.viewport_indicator());
        painter.rect_filled(indicator, 0.0, Color32::from_white_alpha(10));
        painter.rect_stroke(indicator, 0.0, Stroke::new(1.0, Color32::from_gray(140)), StrokeKind::Inside);

        if !(response.clicked() || response.dragged()) {
            return None;
        }
        let pos = response.interact_pointer_pos()?;
        let (first_beat, last_beat) = project.beat_range();
        let fraction = ((pos.x - rect.left()) / rect.width().max(1.0)).clamp(0.0, 1.0);
        Some(TrackMapAction::ScrollToBeat(first_beat + fraction * (last_beat - first_beat)))
    }
}
