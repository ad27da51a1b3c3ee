extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::pack::{rgb888_to_rgb444, rgb888_to_rgb565, rgba8888_to_rgba4444};
use crate::PixelFormat;

/// One histogram bin per observed packed color key.
///
/// Channel fields start out as sums and become per-bin means after
/// [`build_bin_list`] normalizes them. The remaining fields are clustering
/// bookkeeping: `fw`/`bk` link live bins into a doubly-linked list,
/// `nn`/`err` cache the cheapest merge partner, and `tm`/`mtm` are the
/// stored-at / last-modified stamps the heap uses to detect staleness.
#[derive(Debug, Clone)]
pub(crate) struct Bin {
    pub ac: f64,
    pub rc: f64,
    pub gc: f64,
    pub bc: f64,
    pub cnt: f64,
    pub fw: u32,
    pub bk: u32,
    pub nn: u32,
    pub tm: u32,
    pub mtm: u32,
    pub err: f64,
}

impl Bin {
    fn new() -> Self {
        Self {
            ac: 0.0,
            rc: 0.0,
            gc: 0.0,
            bc: 0.0,
            cnt: 0.0,
            fw: 0,
            bk: 0,
            nn: 0,
            tm: 0,
            mtm: 0,
            err: 0.0,
        }
    }
}

/// Packed-key table size for a format; also the tombstone namespace.
pub(crate) fn table_size(format: PixelFormat) -> usize {
    match format {
        PixelFormat::Rgb444 => 4096,
        PixelFormat::Rgb565 | PixelFormat::Rgba4444 => 65536,
    }
}

/// Bucket pixels by packed key, then normalize sums to means and compact
/// the sparse table into a dense bin list (original key order preserved).
///
/// The per-format loops are deliberately duplicated so the packing call is
/// the only work besides the accumulate in the hot loop.
pub(crate) fn build_bin_list(rgba: &[u8], format: PixelFormat) -> Vec<Bin> {
    let bincount = table_size(format);
    let mut table: Vec<Option<Bin>> = vec![None; bincount];

    match format {
        PixelFormat::Rgba4444 => {
            for px in rgba.chunks_exact(4) {
                let (r, g, b, a) = (px[0], px[1], px[2], px[3]);
                let key = rgba8888_to_rgba4444(r, g, b, a) as usize;
                let bin = table[key].get_or_insert_with(Bin::new);
                bin.rc += f64::from(r);
                bin.gc += f64::from(g);
                bin.bc += f64::from(b);
                bin.ac += f64::from(a);
                bin.cnt += 1.0;
            }
        }
        PixelFormat::Rgb444 => {
            for px in rgba.chunks_exact(4) {
                let (r, g, b) = (px[0], px[1], px[2]);
                let key = rgb888_to_rgb444(r, g, b) as usize;
                let bin = table[key].get_or_insert_with(Bin::new);
                bin.rc += f64::from(r);
                bin.gc += f64::from(g);
                bin.bc += f64::from(b);
                bin.cnt += 1.0;
            }
        }
        PixelFormat::Rgb565 => {
            for px in rgba.chunks_exact(4) {
                let (r, g, b) = (px[0], px[1], px[2]);
                let key = rgb888_to_rgb565(r, g, b) as usize;
                let bin = table[key].get_or_insert_with(Bin::new);
                bin.rc += f64::from(r);
                bin.gc += f64::from(g);
                bin.bc += f64::from(b);
                bin.cnt += 1.0;
            }
        }
    }

    let has_alpha = format == PixelFormat::Rgba4444;
    let mut bins = Vec::new();
    for slot in table {
        let Some(mut bin) = slot else { continue };
        let d = 1.0 / bin.cnt;
        if has_alpha {
            bin.ac *= d;
        }
        bin.rc *= d;
        bin.gc *= d;
        bin.bc *= d;
        bins.push(bin);
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_input_one_bin() {
        let rgba: Vec<u8> = [10u8, 20, 30, 255].repeat(4);
        let bins = build_bin_list(&rgba, PixelFormat::Rgb565);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].cnt, 4.0);
        assert_eq!((bins[0].rc, bins[0].gc, bins[0].bc), (10.0, 20.0, 30.0));
    }

    #[test]
    fn channel_fields_become_means() {
        // Two colors sharing one rgb565 bucket (low bits differ)
        let rgba = [10u8, 20, 30, 255, 12, 22, 28, 255];
        let bins = build_bin_list(&rgba, PixelFormat::Rgb565);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].rc, 11.0);
        assert_eq!(bins[0].gc, 21.0);
        assert_eq!(bins[0].bc, 29.0);
    }

    #[test]
    fn distinct_colors_separate_bins() {
        let rgba = [0u8, 0, 0, 255, 255, 255, 255, 255];
        let bins = build_bin_list(&rgba, PixelFormat::Rgb565);
        assert_eq!(bins.len(), 2);
    }

    #[test]
    fn alpha_only_tracked_for_rgba4444() {
        let rgba = [10u8, 20, 30, 128];
        let bins = build_bin_list(&rgba, PixelFormat::Rgb565);
        assert_eq!(bins[0].ac, 0.0);
        let bins = build_bin_list(&rgba, PixelFormat::Rgba4444);
        assert_eq!(bins[0].ac, 128.0);
    }

    #[test]
    fn rgb444_uses_small_table() {
        assert_eq!(table_size(PixelFormat::Rgb444), 4096);
        assert_eq!(table_size(PixelFormat::Rgb565), 65536);
        // opposite-corner colors land in distinct bins even at 4 bits
        let rgba = [0u8, 0, 0, 255, 0xf0, 0xf0, 0xf0, 255];
        let bins = build_bin_list(&rgba, PixelFormat::Rgb444);
        assert_eq!(bins.len(), 2);
    }
}
