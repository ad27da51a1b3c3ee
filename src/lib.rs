#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod color;
pub mod encoder;
pub mod error;
mod histogram;
mod lzw;
pub mod pack;
pub mod palette;
mod pnn;
pub mod remap;
pub mod stream;

pub use color::{
    euclidean_dist_sq, nearest_color_index, nearest_color_index_with_distance,
    snap_colors_to_palette, yiq_dist_sq,
};
pub use encoder::{Disposal, Encoder, FrameOptions, Repeat};
pub use error::Error;
pub use palette::Palette;
pub use remap::apply_palette;

use alloc::vec::Vec;
use log::debug;

/// Packed key used to bucket colors for the histogram and remap cache.
///
/// `Rgba4444` is the only format where alpha takes part in quantization
/// and remapping; the two RGB formats read the alpha byte but ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5-6-5 key. Best color resolution for opaque frames.
    Rgb565,
    /// 12-bit 4-4-4 key. Coarser, smaller histogram.
    Rgb444,
    /// 16-bit 4-4-4-4 key with alpha.
    Rgba4444,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::Rgb565
    }
}

/// Configuration for [`quantize`].
#[derive(Debug, Clone)]
pub struct QuantizeOptions {
    /// Histogram key format.
    pub format: PixelFormat,
    /// Damp bin populations by square root before merging, biasing the
    /// merge order away from heavily populated bins. Auto-disabled when
    /// the requested palette is tiny relative to the histogram.
    pub use_sqrt: bool,
    /// Snap emitted alpha to 0 or 255 around this threshold.
    pub one_bit_alpha: Option<u8>,
    /// Replace the RGB of entries at or below `clear_alpha_threshold`
    /// with `clear_alpha_color` and force their alpha to 0.
    pub clear_alpha: bool,
    pub clear_alpha_threshold: u8,
    pub clear_alpha_color: rgb::RGB<u8>,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            format: PixelFormat::Rgb565,
            use_sqrt: true,
            one_bit_alpha: None,
            clear_alpha: true,
            clear_alpha_threshold: 0,
            clear_alpha_color: rgb::RGB8::new(0, 0, 0),
        }
    }
}

impl QuantizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn use_sqrt(mut self, use_sqrt: bool) -> Self {
        self.use_sqrt = use_sqrt;
        self
    }

    /// Enable one-bit alpha with the given threshold (127 is customary).
    pub fn one_bit_alpha(mut self, threshold: u8) -> Self {
        self.one_bit_alpha = Some(threshold);
        self
    }

    pub fn clear_alpha(mut self, clear_alpha: bool) -> Self {
        self.clear_alpha = clear_alpha;
        self
    }

    pub fn clear_alpha_threshold(mut self, threshold: u8) -> Self {
        self.clear_alpha_threshold = threshold;
        self
    }

    pub fn clear_alpha_color(mut self, color: rgb::RGB<u8>) -> Self {
        self.clear_alpha_color = color;
        self
    }
}

/// Reduce an RGBA pixel buffer to a palette of at most `max_colors`.
///
/// `rgba` is tightly packed RGBA8888, row-major. The palette carries RGBA
/// entries when `format` is [`PixelFormat::Rgba4444`], RGB otherwise.
/// When the histogram has fewer occupied bins than `max_colors`, the
/// palette is simply the bin list.
pub fn quantize(
    rgba: &[u8],
    max_colors: usize,
    opts: &QuantizeOptions,
) -> Result<Palette, Error> {
    if rgba.len() % 4 != 0 {
        return Err(Error::PixelBufferLength(rgba.len()));
    }
    if max_colors == 0 || max_colors > 256 {
        return Err(Error::InvalidMaxColors(max_colors));
    }

    let bins = histogram::build_bin_list(rgba, opts.format);
    debug!(
        "quantize: {} pixels, {} occupied bins, target {}",
        rgba.len() / 4,
        bins.len(),
        max_colors
    );
    Ok(pnn::quantize_bins(
        bins,
        histogram::table_size(opts.format),
        max_colors,
        opts,
    ))
}

/// Quantize and remap in one call, returning the palette and index buffer.
pub fn quantize_and_apply(
    rgba: &[u8],
    max_colors: usize,
    opts: &QuantizeOptions,
) -> Result<(Palette, Vec<u8>), Error> {
    let palette = quantize(rgba, max_colors, opts)?;
    let index = apply_palette(rgba, &palette, opts.format)?;
    Ok((palette, index))
}
