//! Musical scales used by key signatures

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Number of keys in a western octave
pub const CHROMATIC_PERIOD: u8 = 12;

/// An interval pattern within a repeating period of keys.
///
/// Two scales are equivalent when their period and their interval pattern
/// match; the name is only a label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scale {
    pub name: String,
    /// Offsets from the root, ascending, each below `base_period`
    keys: Vec<u8>,
    base_period: u8,
}

impl Scale {
    pub fn new(name: impl Into<String>, keys: impl Into<Vec<u8>>, base_period: u8) -> Self {
        let base_period = base_period.max(1);
        let mut keys: Vec<u8> = keys.into().into_iter().filter(|&k| k < base_period).collect();
        keys.sort_unstable();
        keys.dedup();
        Self {
            name: name.into(),
            keys,
            base_period,
        }
    }

    pub fn natural_major() -> Arc<Self> {
        Arc::new(Self::new("Major", [0, 2, 4, 5, 7, 9, 11], CHROMATIC_PERIOD))
    }

    pub fn natural_minor() -> Arc<Self> {
        Arc::new(Self::new("Minor", [0, 2, 3, 5, 7, 8, 10], CHROMATIC_PERIOD))
    }

    pub fn harmonic_minor() -> Arc<Self> {
        Arc::new(Self::new("Harmonic minor", [0, 2, 3, 5, 7, 8, 11], CHROMATIC_PERIOD))
    }

    pub fn dorian() -> Arc<Self> {
        Arc::new(Self::new("Dorian", [0, 2, 3, 5, 7, 9, 10], CHROMATIC_PERIOD))
    }

    pub fn phrygian() -> Arc<Self> {
        Arc::new(Self::new("Phrygian", [0, 1, 3, 5, 7, 8, 10], CHROMATIC_PERIOD))
    }

    pub fn lydian() -> Arc<Self> {
        Arc::new(Self::new("Lydian", [0, 2, 4, 6, 7, 9, 11], CHROMATIC_PERIOD))
    }

    pub fn mixolydian() -> Arc<Self> {
        Arc::new(Self::new("Mixolydian", [0, 2, 4, 5, 7, 9, 10], CHROMATIC_PERIOD))
    }

    pub fn locrian() -> Arc<Self> {
        Arc::new(Self::new("Locrian", [0, 1, 3, 5, 6, 8, 10], CHROMATIC_PERIOD))
    }

    pub fn major_pentatonic() -> Arc<Self> {
        Arc::new(Self::new("Major pentatonic", [0, 2, 4, 7, 9], CHROMATIC_PERIOD))
    }

    pub fn minor_pentatonic() -> Arc<Self> {
        Arc::new(Self::new("Minor pentatonic", [0, 3, 5, 7, 10], CHROMATIC_PERIOD))
    }

    pub fn chromatic() -> Arc<Self> {
        Arc::new(Self::new("Chromatic", (0..CHROMATIC_PERIOD).collect::<Vec<_>>(), CHROMATIC_PERIOD))
    }

    /// All built-in scales, in menu order
    pub fn presets() -> Vec<Arc<Self>> {
        vec![
            Self::natural_major(),
            Self::natural_minor(),
            Self::harmonic_minor(),
            Self::dorian(),
            Self::phrygian(),
            Self::lydian(),
            Self::mixolydian(),
            Self::locrian(),
            Self::major_pentatonic(),
            Self::minor_pentatonic(),
            Self::chromatic(),
        ]
    }

    pub fn base_period(&self) -> u8 {
        self.base_period
    }

    pub fn keys(&self) -> &[u8] {
        &self.keys
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// Whether a key offset from the root (any octave) belongs to the scale
    pub fn has_key(&self, key: i32) -> bool {
        let offset = key.rem_euclid(self.base_period as i32) as u8;
        self.keys.binary_search(&offset).is_ok()
    }

    pub fn is_equivalent_to(&self, other: &Scale) -> bool {
        self.compare_pattern(other) == Ordering::Equal
    }

    /// Total order over (period, interval pattern), consistent with
    /// `is_equivalent_to`
    pub fn compare_pattern(&self, other: &Scale) -> Ordering {
        self.base_period
            .cmp(&other.base_period)
            .then_with(|| self.keys.cmp(&other.keys))
    }
}

impl PartialEq for Scale {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent_to(other)
    }
}

impl Eq for Scale {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_key_wraps_octaves() {
        let major = Scale::natural_major();
        assert!(major.has_key(0));
        assert!(major.has_key(4));
        assert!(!major.has_key(1));
        assert!(major.has_key(12 + 7));
        // B and A# below the root
        assert!(major.has_key(-1));
        assert!(!major.has_key(-2));
    }

    #[test]
    fn test_equivalence_ignores_name() {
        let a = Scale::new("Ionian", [0, 2, 4, 5, 7, 9, 11], 12);
        assert!(a.is_equivalent_to(&Scale::natural_major()));
        assert!(!a.is_equivalent_to(&Scale::dorian()));
    }

    #[test]
    fn test_new_normalizes_keys() {
        let s = Scale::new("Messy", vec![7, 0, 4, 4, 15], 12);
        assert_eq!(s.keys(), &[0, 4, 7]);
    }

    #[test]
    fn test_compare_pattern_is_total() {
        let presets = Scale::presets();
        for a in &presets {
            for b in &presets {
                assert_eq!(a.compare_pattern(b), b.compare_pattern(a).reverse());
            }
        }
    }
}
