//! GIF89a container assembly.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::error::Error;
use crate::lzw::{self, HSIZE};
use crate::palette::Palette;
use crate::stream::Stream;

/// Loop behavior carried by the NETSCAPE2.0 application extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// No extension block: play once.
    None,
    /// Loop count 0: repeat forever.
    Infinite,
    /// Repeat N extra times after the first pass.
    Finite(u16),
}

/// Frame disposal, as stored in the Graphic Control Extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Derive from transparency: restore-background for transparent
    /// frames, unspecified otherwise.
    Auto,
    Unspecified,
    Keep,
    Background,
    Previous,
}

impl Disposal {
    fn resolve(self, transparent: bool) -> u8 {
        match self {
            Disposal::Auto => {
                if transparent {
                    2
                } else {
                    0
                }
            }
            Disposal::Unspecified => 0,
            Disposal::Keep => 1,
            Disposal::Background => 2,
            Disposal::Previous => 3,
        }
    }
}

/// Per-frame options for [`Encoder::write_frame`].
#[derive(Debug, Clone)]
pub struct FrameOptions<'a> {
    /// Palette for this frame. Mandatory on the first frame (it becomes
    /// the Global Color Table); on later frames it becomes a Local Color
    /// Table.
    pub palette: Option<&'a Palette>,
    /// Marks the first frame in manual mode. Ignored in auto mode.
    pub first: bool,
    pub transparent: bool,
    pub transparent_index: u8,
    /// Frame delay in milliseconds; stored in 1/100 s units.
    pub delay_ms: u32,
    /// Looping behavior, written once with the first frame.
    pub repeat: Repeat,
    pub color_depth: u8,
    pub dispose: Disposal,
}

impl Default for FrameOptions<'_> {
    fn default() -> Self {
        Self {
            palette: None,
            first: false,
            transparent: false,
            transparent_index: 0,
            delay_ms: 0,
            repeat: Repeat::Infinite,
            color_depth: 8,
            dispose: Disposal::Auto,
        }
    }
}

impl<'a> FrameOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(mut self, palette: &'a Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn first(mut self, first: bool) -> Self {
        self.first = first;
        self
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = true;
        self.transparent_index = index;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn color_depth(mut self, depth: u8) -> Self {
        self.color_depth = depth;
        self
    }

    pub fn dispose(mut self, dispose: Disposal) -> Self {
        self.dispose = dispose;
        self
    }
}

/// Streaming GIF89a encoder.
///
/// Owns the output stream and the LZW scratch tables, both reused across
/// frames. In auto mode (the default) the first `write_frame` call writes
/// the header, Logical Screen Descriptor, Global Color Table, and looping
/// extension; in manual mode the caller drives `write_header` and flags
/// the first frame via [`FrameOptions::first`].
#[derive(Debug)]
pub struct Encoder {
    stream: Stream,
    accum: [u8; 256],
    htab: Vec<i32>,
    codetab: Vec<i32>,
    auto: bool,
    has_init: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_mode(Stream::new(), true)
    }

    /// Manual mode: the caller writes the header and marks first frames.
    pub fn new_manual() -> Self {
        Self::with_mode(Stream::new(), false)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_mode(Stream::with_capacity(capacity), true)
    }

    fn with_mode(stream: Stream, auto: bool) -> Self {
        Self {
            stream,
            accum: [0; 256],
            htab: vec![-1; HSIZE],
            codetab: vec![0; HSIZE],
            auto,
            has_init: false,
        }
    }

    /// Clear the stream and return to the uninitialized state. Buffers
    /// keep their allocations.
    pub fn reset(&mut self) {
        self.stream.reset();
        self.has_init = false;
    }

    /// Write the `GIF89a` signature.
    pub fn write_header(&mut self) {
        self.stream.write_bytes(b"GIF89a");
    }

    /// Append one frame of palette indices.
    pub fn write_frame(
        &mut self,
        index: &[u8],
        width: u16,
        height: u16,
        opts: &FrameOptions<'_>,
    ) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroDimension);
        }
        if index.len() != usize::from(width) * usize::from(height) {
            return Err(Error::IndexLengthMismatch {
                len: index.len(),
                width,
                height,
            });
        }
        if let Some(palette) = opts.palette {
            if palette.len() > 256 {
                return Err(Error::PaletteTooLarge(palette.len()));
            }
        }

        let first = if self.auto {
            if self.has_init {
                false
            } else {
                self.write_header();
                self.has_init = true;
                true
            }
        } else {
            opts.first
        };

        let color_depth = opts.color_depth.clamp(1, 8);

        if first {
            let palette = opts.palette.ok_or(Error::MissingFirstFramePalette)?;
            self.write_logical_screen_descriptor(width, height, palette, color_depth);
            self.write_color_table(palette);
            self.write_netscape_ext(opts.repeat);
        }

        let delay_cs = (opts.delay_ms.saturating_add(5) / 10).min(u32::from(u16::MAX)) as u16;
        self.write_graphic_control_ext(opts, delay_cs);

        let local_palette = if first { None } else { opts.palette };
        self.write_image_descriptor(width, height, local_palette);
        if let Some(palette) = local_palette {
            self.write_color_table(palette);
        }

        lzw::encode(
            index,
            color_depth,
            &mut self.stream,
            &mut self.accum,
            &mut self.htab,
            &mut self.codetab,
        );
        trace!(
            "frame {}x{} written, stream at {} bytes",
            width,
            height,
            self.stream.len()
        );
        Ok(())
    }

    /// Write the trailer byte. The stream stays readable afterwards.
    pub fn finish(&mut self) {
        self.stream.write_byte(0x3b);
    }

    /// Copy of the encoded bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.stream.bytes()
    }

    /// View into the encoded bytes.
    pub fn bytes_view(&self) -> &[u8] {
        self.stream.bytes_view()
    }

    fn write_logical_screen_descriptor(
        &mut self,
        width: u16,
        height: u16,
        palette: &Palette,
        color_depth: u8,
    ) {
        let fields = 0x80 | ((color_depth - 1) << 4) | (palette.table_bits() as u8 - 1);
        self.stream.write_u16_le(width);
        self.stream.write_u16_le(height);
        // packed fields, background color index, pixel aspect ratio
        self.stream.write_bytes(&[fields, 0x00, 0x00]);
    }

    fn write_netscape_ext(&mut self, repeat: Repeat) {
        let count = match repeat {
            Repeat::None => return,
            Repeat::Infinite => 0,
            Repeat::Finite(n) => n,
        };
        self.stream.write_bytes(&[0x21, 0xff, 0x0b]);
        self.stream.write_bytes(b"NETSCAPE2.0");
        self.stream.write_bytes(&[0x03, 0x01]);
        self.stream.write_u16_le(count);
        self.stream.write_byte(0x00);
    }

    fn write_graphic_control_ext(&mut self, opts: &FrameOptions<'_>, delay_cs: u16) {
        let disp = opts.dispose.resolve(opts.transparent) & 0x07;
        let packed = (disp << 2) | u8::from(opts.transparent);
        self.stream.write_bytes(&[0x21, 0xf9, 0x04, packed]);
        self.stream.write_u16_le(delay_cs);
        self.stream.write_byte(opts.transparent_index);
        self.stream.write_byte(0x00);
    }

    fn write_image_descriptor(&mut self, width: u16, height: u16, local: Option<&Palette>) {
        self.stream.write_byte(0x2c);
        self.stream.write_u16_le(0);
        self.stream.write_u16_le(0);
        self.stream.write_u16_le(width);
        self.stream.write_u16_le(height);
        match local {
            Some(palette) => {
                self.stream
                    .write_byte(0x80 | (palette.table_bits() as u8 - 1));
            }
            None => self.stream.write_byte(0x00),
        }
    }

    fn write_color_table(&mut self, palette: &Palette) {
        let len = 1usize << palette.table_bits();
        let entries = palette.entries();
        for i in 0..len {
            match entries.get(i) {
                Some(c) => self.stream.write_bytes(&[c.r, c.g, c.b]),
                None => self.stream.write_bytes(&[0, 0, 0]),
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
