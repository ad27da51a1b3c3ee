extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::color::{nearest_index_rgb, nearest_index_rgba};
use crate::error::Error;
use crate::histogram::table_size;
use crate::pack::{rgb888_to_rgb444, rgb888_to_rgb565, rgba8888_to_rgba4444};
use crate::palette::Palette;
use crate::PixelFormat;

/// Map each RGBA pixel to its nearest palette index.
///
/// The first pixel seen with a given packed key pays for a linear scan
/// over the palette; every later pixel sharing the key reuses the cached
/// answer. Alpha participates only for [`PixelFormat::Rgba4444`].
pub fn apply_palette(
    rgba: &[u8],
    palette: &Palette,
    format: PixelFormat,
) -> Result<Vec<u8>, Error> {
    if rgba.len() % 4 != 0 {
        return Err(Error::PixelBufferLength(rgba.len()));
    }
    if palette.len() > 256 {
        return Err(Error::PaletteTooLarge(palette.len()));
    }

    let entries = palette.entries();
    let mut index = vec![0u8; rgba.len() / 4];
    let mut cache: Vec<Option<u8>> = vec![None; table_size(format)];

    if format == PixelFormat::Rgba4444 {
        for (out, px) in index.iter_mut().zip(rgba.chunks_exact(4)) {
            let (r, g, b, a) = (px[0], px[1], px[2], px[3]);
            let key = rgba8888_to_rgba4444(r, g, b, a) as usize;
            *out = match cache[key] {
                Some(idx) => idx,
                None => {
                    let idx = nearest_index_rgba(r, g, b, a, entries);
                    cache[key] = Some(idx);
                    idx
                }
            };
        }
    } else {
        let to_key = match format {
            PixelFormat::Rgb444 => rgb888_to_rgb444,
            _ => rgb888_to_rgb565,
        };
        for (out, px) in index.iter_mut().zip(rgba.chunks_exact(4)) {
            let (r, g, b) = (px[0], px[1], px[2]);
            let key = to_key(r, g, b) as usize;
            *out = match cache[key] {
                Some(idx) => idx,
                None => {
                    let idx = nearest_index_rgb(r, g, b, entries);
                    cache[key] = Some(idx);
                    idx
                }
            };
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::{RGB8, RGBA8};

    fn bw_palette() -> Palette {
        Palette::from_rgb([RGB8::new(0, 0, 0), RGB8::new(255, 255, 255)])
    }

    #[test]
    fn maps_to_nearest_entry() {
        let rgba = [0u8, 0, 0, 255, 250, 250, 250, 255, 10, 10, 10, 255];
        let index = apply_palette(&rgba, &bw_palette(), PixelFormat::Rgb565).unwrap();
        assert_eq!(index, vec![0, 1, 0]);
    }

    #[test]
    fn indices_stay_in_palette_range() {
        let palette = Palette::from_rgb((0..5).map(|i| RGB8::new(i * 50, 0, 0)));
        let rgba: Vec<u8> = (0..64u8).flat_map(|i| [i * 4, i, 255 - i, 255]).collect();
        for format in [
            PixelFormat::Rgb565,
            PixelFormat::Rgb444,
            PixelFormat::Rgba4444,
        ] {
            let index = apply_palette(&rgba, &palette, format).unwrap();
            assert_eq!(index.len(), 64);
            assert!(index.iter().all(|&i| (i as usize) < palette.len()));
        }
    }

    #[test]
    fn alpha_distinguishes_only_in_rgba4444() {
        let palette = Palette::from_rgba([
            RGBA8::new(10, 10, 10, 255),
            RGBA8::new(10, 10, 10, 0),
        ]);
        let rgba = [10u8, 10, 10, 0];
        let via_rgba = apply_palette(&rgba, &palette, PixelFormat::Rgba4444).unwrap();
        assert_eq!(via_rgba, vec![1]);
        // rgb565 ignores alpha, so the tie goes to the earlier entry
        let via_rgb = apply_palette(&rgba, &palette, PixelFormat::Rgb565).unwrap();
        assert_eq!(via_rgb, vec![0]);
    }

    #[test]
    fn cached_key_reuses_first_answer() {
        // (10,20,30) and (12,22,28) share an rgb565 key; both must get the
        // index chosen for the first occurrence.
        let palette = Palette::from_rgb([RGB8::new(10, 20, 30), RGB8::new(12, 22, 28)]);
        let rgba = [10u8, 20, 30, 255, 12, 22, 28, 255];
        let index = apply_palette(&rgba, &palette, PixelFormat::Rgb565).unwrap();
        assert_eq!(index, vec![0, 0]);
    }

    #[test]
    fn rejects_ragged_buffer_and_oversized_palette() {
        assert!(matches!(
            apply_palette(&[1, 2, 3], &bw_palette(), PixelFormat::Rgb565),
            Err(Error::PixelBufferLength(3))
        ));
        let big = Palette::from_rgba((0..=256u16).map(|i| RGBA8::new(i as u8, (i >> 8) as u8, 0, 255)));
        assert!(matches!(
            apply_palette(&[0, 0, 0, 255], &big, PixelFormat::Rgb565),
            Err(Error::PaletteTooLarge(257))
        ));
    }

    #[test]
    fn empty_input_empty_output() {
        let index = apply_palette(&[], &bw_palette(), PixelFormat::Rgb565).unwrap();
        assert!(index.is_empty());
    }
}
