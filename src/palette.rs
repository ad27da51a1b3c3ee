extern crate alloc;
use alloc::vec::Vec;

use rgb::{RGB8, RGBA8};

/// An ordered set of up to 256 colors destined for a GIF color table.
///
/// Entries are uniformly RGB or RGBA. RGB palettes store alpha as 255 so a
/// single entry type serves both; `has_alpha` records which flavor the
/// palette is, and controls whether alpha takes part in comparisons.
/// Index 0 is conventionally the background/transparent slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<RGBA8>,
    has_alpha: bool,
}

impl Palette {
    pub fn new(has_alpha: bool) -> Self {
        Self {
            entries: Vec::new(),
            has_alpha,
        }
    }

    pub fn from_rgb(colors: impl IntoIterator<Item = RGB8>) -> Self {
        Self {
            entries: colors
                .into_iter()
                .map(|c| RGBA8::new(c.r, c.g, c.b, 0xff))
                .collect(),
            has_alpha: false,
        }
    }

    pub fn from_rgba(colors: impl IntoIterator<Item = RGBA8>) -> Self {
        Self {
            entries: colors.into_iter().collect(),
            has_alpha: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether alpha is a meaningful channel for this palette.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Entries in table order. RGB palettes report alpha 255.
    pub fn entries(&self) -> &[RGBA8] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RGBA8] {
        &mut self.entries
    }

    pub fn contains(&self, color: RGBA8) -> bool {
        self.entries.iter().any(|&e| e == color)
    }

    /// Append `color` unless an exact-equal entry already exists.
    pub(crate) fn push_unique(&mut self, color: RGBA8) {
        if !self.contains(color) {
            self.entries.push(color);
        }
    }

    /// Bit width of the emitted color table: `max(ceil(log2(len)), 1)`.
    /// The table itself holds `1 << table_bits()` entries, zero-padded.
    pub(crate) fn table_bits(&self) -> u32 {
        let n = self.entries.len();
        if n <= 2 {
            return 1;
        }
        usize::BITS - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_entries_get_opaque_alpha() {
        let p = Palette::from_rgb([RGB8::new(1, 2, 3)]);
        assert!(!p.has_alpha());
        assert_eq!(p.entries(), &[RGBA8::new(1, 2, 3, 255)]);
    }

    #[test]
    fn push_unique_dedupes_exact_colors() {
        let mut p = Palette::new(true);
        p.push_unique(RGBA8::new(1, 2, 3, 255));
        p.push_unique(RGBA8::new(1, 2, 3, 255));
        p.push_unique(RGBA8::new(1, 2, 3, 0));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn table_bits_rounds_up() {
        let mk = |n: usize| {
            Palette::from_rgb((0..n).map(|i| RGB8::new(i as u8, 0, 0)))
        };
        assert_eq!(mk(1).table_bits(), 1);
        assert_eq!(mk(2).table_bits(), 1);
        assert_eq!(mk(3).table_bits(), 2);
        assert_eq!(mk(4).table_bits(), 2);
        assert_eq!(mk(5).table_bits(), 3);
        assert_eq!(mk(16).table_bits(), 4);
        assert_eq!(mk(17).table_bits(), 5);
        assert_eq!(mk(256).table_bits(), 8);
    }

    #[test]
    fn empty_palette() {
        let p = Palette::new(false);
        assert!(p.is_empty());
        assert_eq!(p.table_bits(), 1);
    }
}
