//! Cache of background schemes, one per distinct (root key, scale) pair

use std::cmp::Ordering;
use std::sync::Arc;

use helio_core::{KeySignatureEvent, Scale};
use tracing::{debug, warn};

use crate::geometry::MAX_ROW_HEIGHT;
use crate::theme::RollTheme;
use crate::tile::{render_rows_pattern, RowTile};

/// Rendered row pattern of one key signature, one tile per row height
#[derive(Debug, Clone)]
pub struct HighlightingScheme {
    root_key: i32,
    scale: Arc<Scale>,
    rows: Vec<RowTile>,
}

impl HighlightingScheme {
    pub fn render(theme: &RollTheme, root_key: i32, scale: Arc<Scale>) -> Self {
        let rows = (0..=MAX_ROW_HEIGHT)
            .map(|height| render_rows_pattern(theme, &scale, root_key, height))
            .collect();
        Self { root_key, scale, rows }
    }

    pub fn root_key(&self) -> i32 {
        self.root_key
    }

    pub fn scale(&self) -> &Arc<Scale> {
        &self.scale
    }

    /// Tile for a row height; out-of-range heights get the nearest tile
    pub fn tile(&self, row_height: i32) -> &RowTile {
        let index = row_height.clamp(0, MAX_ROW_HEIGHT) as usize;
        &self.rows[index]
    }

    /// Order against a (root, scale) key without building a scheme
    pub fn compare_key(&self, root_key: i32, scale: &Scale) -> Ordering {
        self.root_key
            .cmp(&root_key)
            .then_with(|| self.scale.compare_pattern(scale))
    }

    pub fn matches(&self, key: &KeySignatureEvent) -> bool {
        self.compare_key(key.root_key, &key.scale).is_eq()
    }
}

/// Sorted set of schemes for the key signatures present in the project,
/// plus a default scheme used where no key signature applies
#[derive(Debug)]
pub struct BackgroundCache {
    theme: RollTheme,
    default_scheme: HighlightingScheme,
    schemes: Vec<HighlightingScheme>,
}

impl Default for BackgroundCache {
    fn default() -> Self {
        Self::new(RollTheme::default())
    }
}

impl BackgroundCache {
    pub fn new(theme: RollTheme) -> Self {
        let default_scheme = HighlightingScheme::render(&theme, 0, Scale::natural_major());
        Self {
            theme,
            default_scheme,
            schemes: Vec::new(),
        }
    }

    pub fn theme(&self) -> &RollTheme {
        &self.theme
    }

    pub fn default_scheme(&self) -> &HighlightingScheme {
        &self.default_scheme
    }

    pub fn schemes(&self) -> &[HighlightingScheme] {
        &self.schemes
    }

    pub fn get(&self, index: usize) -> Option<&HighlightingScheme> {
        self.schemes.get(index)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn clear(&mut self) {
        self.schemes.clear();
    }

    fn search(&self, root_key: i32, scale: &Scale) -> Result<usize, usize> {
        self.schemes.binary_search_by(|s| s.compare_key(root_key, scale))
    }

    pub fn lookup(&self, root_key: i32, scale: &Scale) -> Option<usize> {
        self.search(root_key, scale).ok()
    }

    /// Scheme to paint for a key signature, the default one when missing
    pub fn scheme_for(&self, key: &KeySignatureEvent) -> &HighlightingScheme {
        match self.lookup(key.root_key, &key.scale) {
            Some(index) => &self.schemes[index],
            None => {
                warn!(root = key.root_key, scale = %key.scale.name, "No cached scheme for key signature");
                &self.default_scheme
            }
        }
    }

    /// Render and insert a scheme unless an equivalent one is cached.
    /// Returns its index.
    pub fn ensure_scheme(&mut self, root_key: i32, scale: &Arc<Scale>) -> usize {
        match self.search(root_key, scale) {
            Ok(index) => {
                debug!(root = root_key, scale = %scale.name, "Ignored duplicate scheme");
                index
            }
            Err(index) => {
                let scheme = HighlightingScheme::render(&self.theme, root_key, Arc::clone(scale));
                self.schemes.insert(index, scheme);
                debug!(root = root_key, scale = %scale.name, total = self.schemes.len(), "Added scheme");
                index
            }
        }
    }

    /// Drop the scheme of a key signature that left the document, unless a
    /// live key signature still needs it. Returns whether it was removed.
    pub fn release_scheme<'a>(
        &mut self,
        root_key: i32,
        scale: &Scale,
        live: impl IntoIterator<Item = &'a KeySignatureEvent>,
    ) -> bool {
        let still_used = live
            .into_iter()
            .any(|k| k.root_key == root_key && k.scale.is_equivalent_to(scale));
        if still_used {
            debug!(root = root_key, scale = %scale.name, "Refused to remove scheme in use");
            return false;
        }

        match self.search(root_key, scale) {
            Ok(index) => {
                self.schemes.remove(index);
                debug!(root = root_key, scale = %scale.name, total = self.schemes.len(), "Removed scheme");
                true
            }
            Err(_) => {
                debug!(root = root_key, scale = %scale.name, "No scheme to remove");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use helio_core::TrackId;

    use super::*;

    fn cache() -> BackgroundCache {
        BackgroundCache::new(RollTheme { noise: 0, ..RollTheme::default() })
    }

    #[test]
    fn test_ensure_scheme_is_idempotent() {
        let mut cache = cache();
        let major = Scale::natural_major();
        let a = cache.ensure_scheme(0, &major);
        let b = cache.ensure_scheme(0, &major);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);

        // Equivalent scale under another name is the same scheme
        let renamed = Arc::new(Scale::new("Ionian", major.keys().to_vec(), major.base_period()));
        cache.ensure_scheme(0, &renamed);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_scheme_has_tile_per_row_height() {
        let mut cache = cache();
        let index = cache.ensure_scheme(5, &Scale::dorian());
        let scheme = cache.get(index).unwrap();
        assert_eq!(scheme.rows.len(), MAX_ROW_HEIGHT as usize + 1);
        assert_eq!(scheme.tile(0).size(), [1, 1]);
        assert_eq!(scheme.tile(20).height(), 20 * 24);
        assert_eq!(scheme.tile(1000).height(), MAX_ROW_HEIGHT as usize * 24);
    }

    #[test]
    fn test_cache_sorted_for_any_insertion_order() {
        let keys = [
            (7, Scale::natural_minor()),
            (0, Scale::dorian()),
            (7, Scale::natural_major()),
            (0, Scale::natural_major()),
            (3, Scale::major_pentatonic()),
            (0, Scale::chromatic()),
        ];

        let mut orders = vec![keys.to_vec()];
        let mut reversed = keys.to_vec();
        reversed.reverse();
        orders.push(reversed);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..4 {
            let mut shuffled = keys.to_vec();
            rng.shuffle(&mut shuffled);
            orders.push(shuffled);
        }

        for order in orders {
            let mut cache = cache();
            for (root, scale) in &order {
                cache.ensure_scheme(*root, scale);
            }
            assert_eq!(cache.len(), keys.len());
            for pair in cache.schemes().windows(2) {
                assert_eq!(pair[0].compare_key(pair[1].root_key, &pair[1].scale), Ordering::Less);
            }
            for (root, scale) in &keys {
                assert!(cache.lookup(*root, scale).is_some());
            }
        }
    }

    #[test]
    fn test_release_refused_while_in_use() {
        let mut cache = cache();
        let major = Scale::natural_major();
        cache.ensure_scheme(0, &major);

        let live = [KeySignatureEvent::new(TrackId(1), 16.0, 0, Scale::natural_major())];
        assert!(!cache.release_scheme(0, &major, &live));
        assert_eq!(cache.len(), 1);

        assert!(cache.release_scheme(0, &major, []));
        assert!(cache.is_empty());
        assert!(!cache.release_scheme(0, &major, []));
    }

    #[test]
    fn test_scheme_for_falls_back_to_default() {
        let cache = cache();
        let key = KeySignatureEvent::new(TrackId(1), 0.0, 4, Scale::lydian());
        let scheme = cache.scheme_for(&key);
        assert_eq!(scheme.root_key(), 0);
        assert!(scheme.scale().is_equivalent_to(&Scale::natural_major()));
    }
}
