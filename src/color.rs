use rgb::{RGB8, RGBA8};

use crate::palette::Palette;

/// Squared Euclidean distance between two color vectors.
///
/// Vectors of unequal length are compared as if the shorter one were
/// zero-padded, so an RGB value against an RGBA value treats the missing
/// alpha as 0. For the usual RGB-vs-RGBA comparison prefer converting with
/// alpha 255 first.
pub fn euclidean_dist_sq(a: &[u8], b: &[u8]) -> u32 {
    let n = a.len().max(b.len());
    let mut sum = 0u32;
    for i in 0..n {
        let x = i32::from(a.get(i).copied().unwrap_or(0));
        let y = i32::from(b.get(i).copied().unwrap_or(0));
        let d = x - y;
        sum += (d * d) as u32;
    }
    sum
}

fn rgb_to_yiq(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    (
        0.299 * r + 0.587 * g + 0.114 * b,
        0.596 * r - 0.274 * g - 0.322 * b,
        0.211 * r - 0.523 * g + 0.312 * b,
    )
}

/// Weighted squared distance in YIQ space, plus the alpha delta.
///
/// Auxiliary perceptual metric. Not used by the quantizer; callers that
/// start from RGB should default alpha to 255.
pub fn yiq_dist_sq(a: RGBA8, b: RGBA8) -> f32 {
    let (y1, i1, q1) = rgb_to_yiq(a.r, a.g, a.b);
    let (y2, i2, q2) = rgb_to_yiq(b.r, b.g, b.b);
    let dy = y1 - y2;
    let di = i1 - i2;
    let dq = q1 - q2;
    let da = f32::from(a.a) - f32::from(b.a);
    0.5053 * dy * dy + 0.299 * di * di + 0.1957 * dq * dq + da * da
}

/// Nearest palette entry to `color` by squared RGB distance.
///
/// Returns `None` for an empty palette. Ties go to the earlier index.
pub fn nearest_color_index(palette: &[RGBA8], color: RGB8) -> Option<usize> {
    nearest_color_index_with_distance(palette, color).map(|(idx, _)| idx)
}

/// Like [`nearest_color_index`], also returning the squared distance.
pub fn nearest_color_index_with_distance(
    palette: &[RGBA8],
    color: RGB8,
) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, p) in palette.iter().enumerate() {
        let dist = euclidean_dist_sq(&[p.r, p.g, p.b], &[color.r, color.g, color.b]);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best
}

/// Nearest palette index for an opaque pixel, with per-channel early exit.
pub(crate) fn nearest_index_rgb(r: u8, g: u8, b: u8, palette: &[RGBA8]) -> u8 {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, p) in palette.iter().enumerate() {
        let dr = i32::from(p.r) - i32::from(r);
        let mut dist = (dr * dr) as u32;
        if dist >= best_dist {
            continue;
        }
        let dg = i32::from(p.g) - i32::from(g);
        dist += (dg * dg) as u32;
        if dist >= best_dist {
            continue;
        }
        let db = i32::from(p.b) - i32::from(b);
        dist += (db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u8
}

/// Nearest palette index for an RGBA pixel. Alpha is compared first since
/// it separates candidates fastest for palettes with a transparent slot.
pub(crate) fn nearest_index_rgba(r: u8, g: u8, b: u8, a: u8, palette: &[RGBA8]) -> u8 {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, p) in palette.iter().enumerate() {
        let da = i32::from(p.a) - i32::from(a);
        let mut dist = (da * da) as u32;
        if dist >= best_dist {
            continue;
        }
        let dr = i32::from(p.r) - i32::from(r);
        dist += (dr * dr) as u32;
        if dist >= best_dist {
            continue;
        }
        let dg = i32::from(p.g) - i32::from(g);
        dist += (dg * dg) as u32;
        if dist >= best_dist {
            continue;
        }
        let db = i32::from(p.b) - i32::from(b);
        dist += (db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u8
}

/// Overwrite palette entries that sit within `threshold` of a known color.
///
/// For each known color, the nearest palette entry (RGB distance only) is
/// replaced by the known color when `0 < dist² ≤ threshold²`. Exact matches
/// are left alone. The conventional threshold is 5.
pub fn snap_colors_to_palette(palette: &mut Palette, known: &[RGBA8], threshold: u8) {
    let limit = u32::from(threshold) * u32::from(threshold);
    let keep_alpha = palette.has_alpha();
    for &color in known {
        let query = RGB8::new(color.r, color.g, color.b);
        let Some((idx, dist)) = nearest_color_index_with_distance(palette.entries(), query)
        else {
            return;
        };
        if dist > 0 && dist <= limit {
            let a = if keep_alpha { color.a } else { 0xff };
            palette.entries_mut()[idx] = RGBA8::new(color.r, color.g, color.b, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_pads_missing_channels() {
        assert_eq!(euclidean_dist_sq(&[1, 2, 3], &[1, 2, 3]), 0);
        assert_eq!(euclidean_dist_sq(&[0, 0, 0], &[3, 4, 0]), 25);
        // missing alpha compared as 0
        assert_eq!(euclidean_dist_sq(&[0, 0, 0], &[0, 0, 0, 10]), 100);
    }

    #[test]
    fn yiq_identity_and_symmetry() {
        let a = RGBA8::new(100, 150, 200, 255);
        let b = RGBA8::new(200, 50, 10, 255);
        assert!(yiq_dist_sq(a, a) < 1e-6);
        assert!((yiq_dist_sq(a, b) - yiq_dist_sq(b, a)).abs() < 1e-3);
    }

    #[test]
    fn yiq_counts_alpha() {
        let opaque = RGBA8::new(10, 20, 30, 255);
        let faded = RGBA8::new(10, 20, 30, 155);
        assert!((yiq_dist_sq(opaque, faded) - 100.0 * 100.0).abs() < 1e-3);
    }

    #[test]
    fn nearest_ties_go_to_earlier_index() {
        let palette = [RGBA8::new(10, 0, 0, 255), RGBA8::new(30, 0, 0, 255)];
        // 20 is equidistant from both
        assert_eq!(nearest_color_index(&palette, RGB8::new(20, 0, 0)), Some(0));
        assert_eq!(nearest_index_rgb(20, 0, 0, &palette), 0);
    }

    #[test]
    fn nearest_empty_palette() {
        assert_eq!(nearest_color_index(&[], RGB8::new(1, 2, 3)), None);
    }

    #[test]
    fn rgba_scan_prefers_matching_alpha() {
        let palette = [RGBA8::new(10, 10, 10, 0), RGBA8::new(10, 10, 10, 255)];
        assert_eq!(nearest_index_rgba(10, 10, 10, 255, &palette), 1);
        assert_eq!(nearest_index_rgba(10, 10, 10, 0, &palette), 0);
    }

    #[test]
    fn snap_replaces_near_entries_only() {
        let mut palette = Palette::from_rgb([
            RGB8::new(10, 10, 10),
            RGB8::new(200, 200, 200),
        ]);
        let known = [
            RGBA8::new(12, 12, 12, 255),    // dist² = 12, within 5²
            RGBA8::new(100, 100, 100, 255), // far from everything
        ];
        snap_colors_to_palette(&mut palette, &known, 5);
        assert_eq!(palette.entries()[0], RGBA8::new(12, 12, 12, 255));
        assert_eq!(palette.entries()[1], RGBA8::new(200, 200, 200, 255));
    }

    #[test]
    fn snap_skips_exact_matches() {
        let mut palette = Palette::from_rgb([RGB8::new(10, 10, 10)]);
        snap_colors_to_palette(&mut palette, &[RGBA8::new(10, 10, 10, 0)], 5);
        // dist 0 means no replacement, so alpha stays opaque
        assert_eq!(palette.entries()[0], RGBA8::new(10, 10, 10, 255));
    }
}
