//! RGB colour used for tracks, annotations and roll themes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    /// Linear blend towards `other`, `t` clamped to 0..=1
    pub fn interpolated_with(self, other: Colour, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Move every channel towards white by `amount` of the remaining headroom
    pub fn brighter(self, amount: f32) -> Self {
        self.interpolated_with(Colour::WHITE, amount)
    }

    pub fn darker(self, amount: f32) -> Self {
        self.interpolated_with(Colour::BLACK, amount)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::rgb(0x8f, 0xc2, 0xff)
    }
}
