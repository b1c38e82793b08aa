//! Piano roll panel: paints a [`PianoRoll`] and feeds it pointer and key input

use std::collections::HashMap;

use egui::{
    Color32, ColorImage, Key, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, TextureHandle, TextureOptions, Ui,
    Vec2,
};
use helio_core::{Colour, Project, BEATS_PER_BAR};
use helio_roll::geometry::HEADER_HEIGHT;
use helio_roll::{
    Bounds, EditMode, HighlightingScheme, NoteComponent, PianoRoll, Point, RollAction, RollCommand, TimeSignatureMap,
};

/// Result of one frame of the panel, handled by the app
pub enum PianoRollAction {
    Edit(RollAction),
    /// Zoom or scroll moved the visible beats
    ViewChanged,
}

/// Maps roll content coordinates to the screen
struct ScreenMap {
    origin: Pos2,
}

impl ScreenMap {
    fn new(rect: Rect, roll: &PianoRoll) -> Self {
        let viewport = roll.geometry().viewport();
        Self {
            origin: rect.min - Vec2::new(viewport.x, viewport.y),
        }
    }

    fn rect(&self, b: Bounds) -> Rect {
        Rect::from_min_size(self.origin + Vec2::new(b.x, b.y), Vec2::new(b.w, b.h))
    }

    fn x(&self, x: f32) -> f32 {
        self.origin.x + x
    }

    fn y(&self, y: f32) -> f32 {
        self.origin.y + y
    }

    fn content(&self, pos: Pos2) -> Point {
        Point::new(pos.x - self.origin.x, pos.y - self.origin.y)
    }
}

fn color32(c: Colour, opacity: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (opacity.clamp(0.0, 1.0) * 255.0) as u8)
}

pub struct PianoRollPanel {
    /// Uploaded row tiles by (root key, scale name), for `tile_row_height`
    tiles: HashMap<(i32, String), TextureHandle>,
    tile_row_height: i32,
    pointer_down: bool,
}

impl Default for PianoRollPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoRollPanel {
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            tile_row_height: 0,
            pointer_down: false,
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut Ui,
        roll: &mut PianoRoll,
        time_signatures: &TimeSignatureMap,
        project: &Project,
    ) -> Vec<PianoRollAction> {
        let mut actions = Vec::new();

        self.toolbar(ui, roll, &mut actions);
        ui.separator();

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let viewport = roll.geometry().viewport();
        if (rect.width() - viewport.width).abs() > 0.5 || (rect.height() - viewport.height).abs() > 0.5 {
            roll.resized(rect.width(), rect.height());
            actions.push(PianoRollAction::ViewChanged);
        }

        self.handle_pointer(ui, &response, roll, &mut actions);
        if response.hovered() || response.has_focus() {
            handle_keys(ui, roll, &mut actions);
            handle_scroll(ui, &response, roll, &mut actions);
        }

        let map = ScreenMap::new(rect, roll);
        self.paint_background(ui.ctx(), &painter, &map, roll, project);
        paint_grid(&painter, &map, rect, roll);
        paint_header(&painter, &map, rect, roll);
        paint_time_signatures(&painter, &map, rect, time_signatures);
        paint_notes(&painter, &map, rect, roll);

        actions
    }

    fn toolbar(&mut self, ui: &mut Ui, roll: &mut PianoRoll, actions: &mut Vec<PianoRollAction>) {
        ui.horizontal(|ui| {
            ui.label("Piano Roll");
            ui.separator();

            let mut mode = roll.edit_mode();
            ui.selectable_value(&mut mode, EditMode::Select, "Select");
            ui.selectable_value(&mut mode, EditMode::Draw, "Draw");
            if mode != roll.edit_mode() {
                roll.set_edit_mode(mode);
            }
            ui.separator();

            let bar_width = roll.geometry().bar_width();
            if ui.button("-").clicked() && roll.set_bar_width(bar_width * 0.8) {
                actions.push(PianoRollAction::ViewChanged);
            }
            if ui.button("+").clicked() && roll.set_bar_width(bar_width * 1.25) {
                actions.push(PianoRollAction::ViewChanged);
            }
            ui.label(format!("{:.0} px/bar", roll.geometry().bar_width()));
            ui.separator();

            let row_height = roll.geometry().row_height();
            if ui.button("Rows -").clicked() {
                roll.set_row_height(row_height - 1);
            }
            if ui.button("Rows +").clicked() {
                roll.set_row_height(row_height + 1);
            }
            ui.label(format!("{} px/row", roll.geometry().row_height()));
            ui.separator();

            ui.label(format!("{} selected", roll.selection().len()));
            if ui.button("Delete Selected").clicked() {
                if let Some(action) = roll.handle_command(RollCommand::DeleteEvents) {
                    actions.push(PianoRollAction::Edit(action));
                }
            }
        });
    }

    fn handle_pointer(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        roll: &mut PianoRoll,
        actions: &mut Vec<PianoRollAction>,
    ) {
        let map = ScreenMap::new(response.rect, roll);
        let (pressed, released, modifiers, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.modifiers,
                i.pointer.interact_pos(),
            )
        });
        let mut push = |action: Option<RollAction>| {
            if let Some(action) = action {
                actions.push(PianoRollAction::Edit(action));
            }
        };

        if pressed && response.hovered() {
            if let Some(pos) = pointer {
                let pos = map.content(pos);
                // Clicks on the ruler do not edit
                if pos.y >= HEADER_HEIGHT {
                    response.request_focus();
                    self.pointer_down = true;
                    push(roll.mouse_down(pos, modifiers.command || modifiers.ctrl));
                }
            }
        }

        if self.pointer_down && response.dragged() {
            if let Some(pos) = pointer {
                push(roll.mouse_drag(map.content(pos)));
            }
        }

        if self.pointer_down && released {
            self.pointer_down = false;
            let pos = pointer.unwrap_or(response.rect.min);
            push(roll.mouse_up(map.content(pos)));
        }
    }

    fn tile_texture(&mut self, ctx: &egui::Context, scheme: &HighlightingScheme, row_height: i32) -> TextureHandle {
        if self.tile_row_height != row_height {
            self.tiles.clear();
            self.tile_row_height = row_height;
        }
        let key = (scheme.root_key(), scheme.scale().name.clone());
        self.tiles
            .entry(key)
            .or_insert_with(|| {
                let tile = scheme.tile(row_height);
                let image = ColorImage::from_rgb(tile.size(), tile.rgb());
                let name = format!("roll-tile-{}-{}-{}", scheme.root_key(), scheme.scale().name, row_height);
                ctx.load_texture(name, image, TextureOptions::NEAREST)
            })
            .clone()
    }

    /// Key signature backgrounds, tiled down from the header
    fn paint_background(
        &mut self,
        ctx: &egui::Context,
        painter: &Painter,
        map: &ScreenMap,
        roll: &PianoRoll,
        project: &Project,
    ) {
        let geometry = roll.geometry();
        let viewport = geometry.viewport();
        let row_height = geometry.row_height();
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        for span in roll.background_spans(project) {
            let texture = self.tile_texture(ctx, span.scheme, row_height);
            let [tile_w, tile_h] = texture.size().map(|s| s as f32);
            let clip = map.rect(Bounds::new(span.x, HEADER_HEIGHT, span.width, geometry.height() - HEADER_HEIGHT));
            let span_painter = painter.with_clip_rect(clip.intersect(painter.clip_rect()));

            let first_row = ((viewport.y - HEADER_HEIGHT) / tile_h).floor().max(0.0);
            let mut y = HEADER_HEIGHT + first_row * tile_h;
            while y < viewport.y + viewport.height && y < geometry.height() {
                let mut x = (span.x / tile_w).floor() * tile_w;
                while x < span.x + span.width {
                    let tile = map.rect(Bounds::new(x, y, tile_w, tile_h));
                    span_painter.image(texture.id(), tile, uv, Color32::WHITE);
                    x += tile_w;
                }
                y += tile_h;
            }
        }
    }
}

/// Bar and beat lines
fn paint_grid(painter: &Painter, map: &ScreenMap, rect: Rect, roll: &PianoRoll) {
    let geometry = roll.geometry();
    let bar_width = geometry.bar_width();
    let beat_width = bar_width / BEATS_PER_BAR;
    let (first_beat, last_beat) = geometry.visible_beat_range();

    let mut beat = first_beat.floor();
    while beat <= last_beat {
        let x = map.x(geometry.x_position_by_beat(beat));
        let on_bar = beat.rem_euclid(BEATS_PER_BAR) == 0.0;
        if on_bar || beat_width >= 12.0 {
            let stroke = if on_bar {
                Stroke::new(1.0, Color32::from_black_alpha(110))
            } else {
                Stroke::new(1.0, Color32::from_black_alpha(40))
            };
            painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        }
        beat += 1.0;
    }
}

/// Ruler with bar numbers and the edited track's beat span
fn paint_header(painter: &Painter, map: &ScreenMap, rect: Rect, roll: &PianoRoll) {
    let geometry = roll.geometry();
    let header = Rect::from_min_max(
        Pos2::new(rect.left(), map.y(0.0)),
        Pos2::new(rect.right(), map.y(HEADER_HEIGHT)),
    );
    if !header.intersects(rect) {
        return;
    }
    painter.rect_filled(header, 0.0, Color32::from_gray(32));

    let (first_beat, last_beat) = geometry.visible_beat_range();
    let first_bar = (first_beat / BEATS_PER_BAR).floor() as i32;
    let last_bar = (last_beat / BEATS_PER_BAR).ceil() as i32;
    for bar in first_bar..=last_bar {
        let x = map.x(geometry.x_position_by_bar(bar as f32));
        painter.text(
            Pos2::new(x + 3.0, header.top() + 4.0),
            egui::Align2::LEFT_TOP,
            (bar + 1).to_string(),
            egui::FontId::proportional(11.0),
            Color32::from_gray(170),
        );
    }

    if let Some(range) = roll.active_range() {
        let left = map.x(geometry.x_position_by_beat(range.first_beat));
        let right = map.x(geometry.x_position_by_beat(range.last_beat));
        let strip = Rect::from_min_max(
            Pos2::new(left, header.bottom() - 5.0),
            Pos2::new(right.max(left + 1.0), header.bottom() - 1.0),
        );
        painter.rect_filled(strip, 1.0, color32(range.colour, 0.9));
    }
}

fn paint_time_signatures(painter: &Painter, map: &ScreenMap, rect: Rect, time_signatures: &TimeSignatureMap) {
    for marker in time_signatures.visible_markers() {
        let area = map.rect(marker.bounds());
        if !area.intersects(rect) {
            continue;
        }
        let left = area.left().max(rect.left());
        painter.line_segment(
            [Pos2::new(area.left(), area.top()), Pos2::new(area.left(), area.bottom())],
            Stroke::new(1.0, Color32::from_gray(200)),
        );
        painter.text(
            Pos2::new(left + 3.0, area.center().y),
            egui::Align2::LEFT_CENTER,
            marker.label(),
            egui::FontId::proportional(11.0),
            Color32::from_gray(220),
        );
    }
}

fn paint_note(painter: &Painter, map: &ScreenMap, component: &NoteComponent, background: Colour) {
    let rect = map.rect(component.bounds());
    if !painter.clip_rect().intersects(rect) {
        return;
    }
    let fill = color32(component.colour(background), component.opacity());
    painter.rect_filled(rect, 1.0, fill);
    if component.is_selected() && !component.is_ghost() {
        let stroke = Stroke::new(1.0, color32(Colour::WHITE, component.opacity()));
        painter.rect_stroke(rect, 1.0, stroke, StrokeKind::Inside);
    }
}

fn paint_notes(painter: &Painter, map: &ScreenMap, rect: Rect, roll: &PianoRoll) {
    let background = roll.backgrounds().theme().white_key;

    if let Some(band) = roll.helpers() {
        let band = map.rect(band.bounds);
        let band = Rect::from_min_max(Pos2::new(band.left(), band.top().max(rect.top())), band.max);
        painter.rect_filled(band, 0.0, Color32::from_white_alpha(12));
    }

    for component in roll.fading_out() {
        paint_note(painter, map, component, background);
    }
    // Inactive notes underneath the edited ones
    for component in roll.components().filter(|c| !c.is_active()) {
        paint_note(painter, map, component, background);
    }
    for component in roll.components().filter(|c| c.is_active()) {
        paint_note(painter, map, component, background);
    }
    for ghost in roll.ghost_notes() {
        paint_note(painter, map, ghost, background);
    }

    if let Some(lasso) = roll.lasso_area() {
        let lasso = map.rect(lasso);
        painter.rect_filled(lasso, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 30));
        painter.rect_stroke(lasso, 0.0, Stroke::new(1.0, Color32::from_rgb(100, 150, 255)), StrokeKind::Inside);
    }
}

fn handle_keys(ui: &Ui, roll: &mut PianoRoll, actions: &mut Vec<PianoRollAction>) {
    let (commands, escape) = ui.input(|i| {
        let shift = i.modifiers.shift;
        let mut commands = Vec::new();
        if i.modifiers.command && i.key_pressed(Key::A) {
            commands.push(RollCommand::SelectAll);
        }
        if i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace) {
            commands.push(RollCommand::DeleteEvents);
        }
        if i.key_pressed(Key::ArrowLeft) {
            commands.push(if shift { RollCommand::BarShiftLeft } else { RollCommand::BeatShiftLeft });
        }
        if i.key_pressed(Key::ArrowRight) {
            commands.push(if shift { RollCommand::BarShiftRight } else { RollCommand::BeatShiftRight });
        }
        if i.key_pressed(Key::ArrowUp) {
            commands.push(if shift { RollCommand::OctaveShiftUp } else { RollCommand::KeyShiftUp });
        }
        if i.key_pressed(Key::ArrowDown) {
            commands.push(if shift { RollCommand::OctaveShiftDown } else { RollCommand::KeyShiftDown });
        }
        (commands, i.key_pressed(Key::Escape))
    });

    if escape {
        roll.deselect_all();
    }
    for command in commands {
        if let Some(action) = roll.handle_command(command) {
            actions.push(PianoRollAction::Edit(action));
        }
    }
}

/// Wheel scrolls; with ctrl/cmd it zooms horizontally, with alt vertically
fn handle_scroll(ui: &Ui, response: &egui::Response, roll: &mut PianoRoll, actions: &mut Vec<PianoRollAction>) {
    if !response.hovered() {
        return;
    }
    let (delta, modifiers, hover) = ui.input(|i| (i.smooth_scroll_delta, i.modifiers, i.pointer.hover_pos()));
    if delta == Vec2::ZERO {
        return;
    }

    let origin = hover.map(|p| p - response.rect.min).unwrap_or_default();
    let origin = Point::new(origin.x, origin.y);
    let amount = delta.x + delta.y;
    if modifiers.command || modifiers.ctrl {
        roll.zoom_relative(origin, Point::new(amount * 0.004, 0.0));
    } else if modifiers.alt {
        roll.zoom_relative(origin, Point::new(0.0, amount.signum() * 0.01));
    } else {
        let viewport = roll.geometry().viewport();
        roll.set_view_position(viewport.x - delta.x, viewport.y - delta.y);
    }
    actions.push(PianoRollAction::ViewChanged);
}
