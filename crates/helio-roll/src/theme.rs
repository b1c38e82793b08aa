//! Colours used to render the roll background

use helio_core::Colour;

#[derive(Debug, Clone, PartialEq)]
pub struct RollTheme {
    pub white_key: Colour,
    pub black_key: Colour,
    /// Black key shade used on odd octaves
    pub black_key_alt: Colour,
    pub row_line: Colour,
    /// Amplitude of the per-pixel noise applied to tiles, 0 disables it
    pub noise: u8,
}

impl Default for RollTheme {
    fn default() -> Self {
        Self {
            white_key: Colour::rgb(0x35, 0x37, 0x3d),
            black_key: Colour::rgb(0x2a, 0x2c, 0x31),
            black_key_alt: Colour::rgb(0x28, 0x2a, 0x2f),
            row_line: Colour::rgb(0x24, 0x25, 0x29),
            noise: 2,
        }
    }
}

impl RollTheme {
    pub fn root_key(&self) -> Colour {
        self.white_key.brighter(0.085)
    }

    pub fn root_key_bright(&self) -> Colour {
        self.white_key.brighter(0.09)
    }

    pub fn scale_line(&self) -> Colour {
        self.white_key.brighter(0.025)
    }
}
