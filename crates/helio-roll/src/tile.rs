//! Pre-rendered background tiles: two octaves of keyboard rows per image

use helio_core::{Colour, Scale, MIDDLE_C, NUM_KEYS};

use crate::geometry::MIN_ROW_HEIGHT;
use crate::theme::RollTheme;

pub const TILE_WIDTH: usize = 128;
pub const ROWS_OF_TWO_OCTAVES: usize = 24;

/// RGB image, row-major, 3 bytes per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct RowTile {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RowTile {
    pub fn filled(width: usize, height: usize, colour: Colour) -> Self {
        let pixels = colour.to_array().repeat(width * height);
        Self { width, height, pixels }
    }

    /// Stand-in for row heights too small to render
    pub fn placeholder() -> Self {
        Self::filled(1, 1, Colour::BLACK)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width, self.height]
    }

    pub fn rgb(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some(Colour::rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Fill rows `y..y + h`, clipped to the image
    fn fill_rows(&mut self, y: i64, h: i64, colour: Colour) {
        let top = y.max(0) as usize;
        let bottom = (y + h).clamp(0, self.height as i64) as usize;
        let rgb = colour.to_array();
        for row in top..bottom {
            let start = row * self.width * 3;
            for px in self.pixels[start..start + self.width * 3].chunks_exact_mut(3) {
                px.copy_from_slice(&rgb);
            }
        }
    }

    fn draw_row_line(&mut self, y: i64, colour: Colour) {
        self.fill_rows(y, 1, colour);
    }

    fn apply_noise(&mut self, amplitude: u8, seed: u64) {
        if amplitude == 0 {
            return;
        }
        let mut rng = fastrand::Rng::with_seed(seed);
        let span = amplitude as i16;
        for channel in self.pixels.iter_mut() {
            let delta = rng.i16(-span..=span);
            *channel = (*channel as i16 + delta).clamp(0, 255) as u8;
        }
    }
}

/// Render the row pattern of `scale` rooted at `root_key` for one row height.
///
/// The tile top lines up with the top row of the keyboard, so stacking tiles
/// downwards from the header reproduces the pattern for every key.
pub fn render_rows_pattern(theme: &RollTheme, scale: &Scale, root_key: i32, row_height: i32) -> RowTile {
    if row_height < MIN_ROW_HEIGHT {
        return RowTile::placeholder();
    }

    let height = row_height as i64;
    let mut tile = RowTile::filled(TILE_WIDTH, row_height as usize * ROWS_OF_TWO_OCTAVES, theme.white_key);

    let period = scale.base_period().max(1) as i32;
    let middle_c_offset = period - MIDDLE_C % period;
    let last_octave_reminder = NUM_KEYS % period - root_key + middle_c_offset;

    let mut pos_y = tile.height() as i64 - height;
    for i in last_octave_reminder..last_octave_reminder + ROWS_OF_TWO_OCTAVES as i32 {
        let note_number = i.rem_euclid(period);
        let odd_octave = i.div_euclid(period) % 2 != 0;

        if note_number == 0 {
            let fill = if odd_octave { theme.root_key_bright() } else { theme.root_key() };
            tile.fill_rows(pos_y + 1, height - 1, fill);
            tile.draw_row_line(pos_y + 1, fill.brighter(0.025));
        } else if scale.has_key(note_number) {
            tile.draw_row_line(pos_y + 1, theme.scale_line());
        } else {
            let fill = if odd_octave { theme.black_key_alt } else { theme.black_key };
            tile.fill_rows(pos_y + 1, height - 1, fill);
        }

        tile.draw_row_line(pos_y, theme.row_line);
        pos_y -= height;
    }

    let seed = ((root_key as u64) << 32) ^ ((row_height as u64) << 8) ^ period as u64;
    tile.apply_noise(theme.noise, seed);
    tile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_theme() -> RollTheme {
        RollTheme { noise: 0, ..RollTheme::default() }
    }

    #[test]
    fn test_small_heights_render_placeholder() {
        let tile = render_rows_pattern(&quiet_theme(), &Scale::natural_major(), 0, MIN_ROW_HEIGHT - 1);
        assert_eq!(tile.size(), [1, 1]);
        let tile = render_rows_pattern(&quiet_theme(), &Scale::natural_major(), 0, 0);
        assert_eq!(tile.size(), [1, 1]);
    }

    #[test]
    fn test_tile_covers_two_octaves() {
        let tile = render_rows_pattern(&quiet_theme(), &Scale::natural_major(), 0, 10);
        assert_eq!(tile.size(), [TILE_WIDTH, 240]);
        assert_eq!(tile.rgb().len(), TILE_WIDTH * 240 * 3);
    }

    #[test]
    fn test_rows_follow_scale() {
        let theme = quiet_theme();
        let tile = render_rows_pattern(&theme, &Scale::natural_major(), 0, 10);

        // Bottom row of the tile is key 104 (G#): out of C major, odd octave
        assert_eq!(tile.pixel(5, 235), Some(theme.black_key_alt));
        assert_eq!(tile.pixel(5, 230), Some(theme.row_line));
        // Key 105 (A): in scale, highlight line then plain fill
        assert_eq!(tile.pixel(5, 221), Some(theme.scale_line()));
        assert_eq!(tile.pixel(5, 225), Some(theme.white_key));
        // Key 108 (C): root row
        assert_eq!(tile.pixel(5, 195), Some(theme.root_key()));
    }

    #[test]
    fn test_root_shifts_pattern() {
        let theme = quiet_theme();
        let tile = render_rows_pattern(&theme, &Scale::natural_major(), 2, 10);
        // Key 110 (D) is the root now
        assert_eq!(tile.pixel(5, 175), Some(theme.root_key()));
        assert_ne!(tile.pixel(5, 195), Some(theme.root_key()));
    }

    #[test]
    fn test_noise_is_deterministic() {
        let theme = RollTheme::default();
        let a = render_rows_pattern(&theme, &Scale::dorian(), 3, 12);
        let b = render_rows_pattern(&theme, &Scale::dorian(), 3, 12);
        assert_eq!(a, b);
    }
}
