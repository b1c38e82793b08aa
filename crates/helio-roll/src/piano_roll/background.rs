//! Key signature timeline resolved into background fills

use helio_core::Project;

use super::PianoRoll;
use crate::highlighting::HighlightingScheme;

/// Horizontal slice of the visible area filled with one scheme's tile
#[derive(Debug, Clone, Copy)]
pub struct BackgroundSpan<'a> {
    pub x: f32,
    pub width: f32,
    pub scheme: &'a HighlightingScheme,
}

impl PianoRoll {
    /// Spans covering the viewport, left to right.
    ///
    /// Each key signature's scheme applies from its beat to the next key
    /// signature; the first one also covers the area before it. Without
    /// key signatures the default scheme fills everything.
    pub fn background_spans(&self, project: &Project) -> Vec<BackgroundSpan<'_>> {
        let viewport = self.geometry.viewport();
        let paint_start = viewport.x;
        let paint_end = viewport.x + viewport.width;

        let mut spans = Vec::new();
        let mut prev_x = paint_start;
        let mut prev_scheme: Option<&HighlightingScheme> = None;
        for key in project.key_signatures() {
            let bar_x = self.geometry.x_position_by_beat(key.beat);
            let scheme = self.backgrounds.scheme_for(key);
            let current = prev_scheme.unwrap_or(scheme);

            if bar_x >= paint_end {
                push_span(&mut spans, prev_x, paint_end, current);
                return spans;
            }
            if bar_x > prev_x {
                push_span(&mut spans, prev_x, bar_x, current);
                prev_x = bar_x;
            }
            prev_scheme = Some(scheme);
        }

        let last = prev_scheme.unwrap_or_else(|| self.backgrounds.default_scheme());
        push_span(&mut spans, prev_x, paint_end, last);
        spans
    }
}

fn push_span<'a>(spans: &mut Vec<BackgroundSpan<'a>>, from: f32, to: f32, scheme: &'a HighlightingScheme) {
    if to > from {
        spans.push(BackgroundSpan {
            x: from,
            width: to - from,
            scheme,
        });
    }
}
