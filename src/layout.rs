//! Conversion between pixel buffers and named byte layouts.
//!
//! A layout name is either `P` (one index byte per pixel) or an ordering of
//! channel letters: any permutation of `RGB`, or of `RGB` plus one of `A`
//! (alpha) or `X` (filler, written as 255). Alpha orderings accept a
//! `_PREMULT` suffix.

use std::fmt;
use std::str::FromStr;

use crate::error::SurfaceError;
use crate::palette::Palette;
use crate::pixel::{Color, PixelFormat};
use crate::surface::{PixelBuffer, row_bytes};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
    X,
}

impl Channel {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Self::R),
            'G' => Some(Self::G),
            'B' => Some(Self::B),
            'A' => Some(Self::A),
            'X' => Some(Self::X),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::R => 'R',
            Self::G => 'G',
            Self::B => 'B',
            Self::A => 'A',
            Self::X => 'X',
        }
    }
}

/// A parsed channel layout name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// `P`: one palette index byte per pixel.
    Indexed,
    /// Three or four channel bytes per pixel.
    Direct {
        order: [Channel; 4],
        len: usize,
        premultiplied: bool,
    },
}

const PREMULT_SUFFIX: &str = "_PREMULT";

impl ChannelLayout {
    pub fn parse(name: &str) -> Result<Self, SurfaceError> {
        let unsupported = || SurfaceError::UnsupportedLayout(name.to_string());
        if name == "P" {
            return Ok(Self::Indexed);
        }
        let (letters, premultiplied) = match name.strip_suffix(PREMULT_SUFFIX) {
            Some(rest) => (rest, true),
            None => (name, false),
        };
        let len = letters.len();
        if !(3..=4).contains(&len) {
            return Err(unsupported());
        }
        let mut order = [Channel::X; 4];
        let mut seen = [false; 5];
        for (slot, c) in order.iter_mut().zip(letters.chars()) {
            let ch = Channel::from_char(c).ok_or_else(unsupported)?;
            let idx = ch as usize;
            if seen[idx] {
                return Err(unsupported());
            }
            seen[idx] = true;
            *slot = ch;
        }
        let [r, g, b, a, x] = seen;
        let complete = r && g && b && (len == 3 || a != x);
        if !complete || (premultiplied && !a) {
            return Err(unsupported());
        }
        Ok(Self::Direct {
            order,
            len,
            premultiplied,
        })
    }

    /// Bytes per pixel in this layout.
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Indexed => 1,
            Self::Direct { len, .. } => *len,
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.channels().contains(&Channel::A)
    }

    pub fn is_premultiplied(&self) -> bool {
        matches!(self, Self::Direct { premultiplied: true, .. })
    }

    /// Channel order, empty for `P`.
    pub fn channels(&self) -> &[Channel] {
        match self {
            Self::Indexed => &[],
            Self::Direct { order, len, .. } => &order[..*len],
        }
    }

    /// Native format whose memory order matches this layout byte for byte.
    fn native_format(&self) -> Option<PixelFormat> {
        use Channel::*;
        let f = match self.channels() {
            [] => PixelFormat::Index8,
            [R, G, B] => PixelFormat::Bgr24,
            [B, G, R] => PixelFormat::Rgb24,
            [R, G, B, A] => PixelFormat::Abgr8888,
            [B, G, R, A] => PixelFormat::Argb8888,
            [A, R, G, B] => PixelFormat::Bgra8888,
            [A, B, G, R] => PixelFormat::Rgba8888,
            [R, G, B, X] => PixelFormat::Xbgr8888,
            [B, G, R, X] => PixelFormat::Xrgb8888,
            _ => return None,
        };
        Some(f)
    }

    /// Format produced by [`decode_from_layout`].
    fn decoded_format(&self) -> PixelFormat {
        match self {
            Self::Indexed => PixelFormat::Index8,
            Self::Direct { len: 3, .. } => PixelFormat::Rgb24,
            _ if self.has_alpha() => PixelFormat::Argb8888,
            _ => PixelFormat::Xrgb8888,
        }
    }

    fn resolve_pitch(&self, width: u32, pitch: Option<usize>) -> Result<(usize, usize), SurfaceError> {
        let row = row_bytes(width, self.channel_count()).ok_or_else(|| {
            SurfaceError::InvalidDimension(format!("width {width} overflows row size"))
        })?;
        match pitch {
            None => Ok((row, row)),
            Some(p) if p < row => Err(SurfaceError::Configuration(format!(
                "pitch {p} is smaller than the unpadded row size {row}"
            ))),
            Some(p) => Ok((row, p)),
        }
    }
}

impl FromStr for ChannelLayout {
    type Err = SurfaceError;
    fn from_str(s: &str) -> Result<Self, SurfaceError> {
        Self::parse(s)
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Indexed = self {
            return f.write_str("P");
        }
        for c in self.channels() {
            write!(f, "{}", c.as_char())?;
        }
        if self.is_premultiplied() {
            f.write_str(PREMULT_SUFFIX)?;
        }
        Ok(())
    }
}

/// Premultiply one channel: `((c + 1) * a) >> 8`.
#[inline]
pub fn premultiply(c: u8, a: u8) -> u8 {
    (((u32::from(c) + 1) * u32::from(a)) >> 8) as u8
}

/// Serialize a buffer's pixels in the named layout.
///
/// Rows are `pitch` bytes apart (default: unpadded) and zero-padded.
pub fn encode_to_layout(
    buffer: &PixelBuffer,
    layout: &str,
    pitch: Option<usize>,
) -> Result<Vec<u8>, SurfaceError> {
    let layout = ChannelLayout::parse(layout)?;
    let (width, height) = buffer.size();
    let (row, pitch) = layout.resolve_pitch(width, pitch)?;
    let len = pitch
        .checked_mul(height as usize)
        .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;

    if layout.is_premultiplied() && !buffer.has_alpha() {
        return Err(SurfaceError::UnsupportedLayout(format!(
            "{layout}: {} buffer has no alpha channel",
            buffer.format()
        )));
    }

    let mut out = vec![0u8; len];
    match layout {
        ChannelLayout::Indexed => {
            if !buffer.is_indexed() {
                return Err(SurfaceError::UnsupportedLayout(format!(
                    "P: {} buffer is not 8-bit indexed",
                    buffer.format()
                )));
            }
            for y in 0..height {
                let start = y as usize * pitch;
                out[start..start + row].copy_from_slice(buffer.row(y));
            }
        }
        ChannelLayout::Direct { premultiplied, .. } => {
            let channels = layout.channels();
            for (y, dst_row) in out.chunks_exact_mut(pitch).enumerate() {
                for (x, px) in dst_row[..row].chunks_exact_mut(channels.len()).enumerate() {
                    let mut c = buffer.color_at(x as u32, y as u32);
                    if premultiplied {
                        c.r = premultiply(c.r, c.a);
                        c.g = premultiply(c.g, c.a);
                        c.b = premultiply(c.b, c.a);
                    }
                    write_channels(px, channels, c);
                }
            }
        }
    }
    Ok(out)
}

/// Build a buffer from bytes in the named layout.
///
/// Four-channel layouts with alpha decode to `Argb8888` (premultiplied
/// values are kept as stored), `X` layouts to `Xrgb8888`, three-channel
/// layouts to `Rgb24`. `P` decodes to `Index8` with an all-black palette
/// the caller is expected to fill.
pub fn decode_from_layout(
    bytes: &[u8],
    width: u32,
    height: u32,
    layout: &str,
    pitch: Option<usize>,
) -> Result<PixelBuffer, SurfaceError> {
    let layout = ChannelLayout::parse(layout)?;
    decode_parsed(bytes, width, height, &layout, pitch)
}

fn decode_parsed(
    bytes: &[u8],
    width: u32,
    height: u32,
    layout: &ChannelLayout,
    pitch: Option<usize>,
) -> Result<PixelBuffer, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::InvalidDimension(format!(
            "{width}x{height}: width and height must be positive"
        )));
    }
    let (row, pitch) = layout.resolve_pitch(width, pitch)?;
    check_len(bytes.len(), pitch, height)?;

    let mut buffer = PixelBuffer::new(width, height, layout.decoded_format())?;
    if let ChannelLayout::Indexed = layout {
        buffer.replace_palette(Palette::black())?;
        for y in 0..height {
            let start = y as usize * pitch;
            buffer.row_mut(y).copy_from_slice(&bytes[start..start + row]);
        }
        return Ok(buffer);
    }

    let channels = layout.channels();
    let out_bpp = buffer.bytes_per_pixel();
    for y in 0..height {
        let start = y as usize * pitch;
        let src = &bytes[start..start + row];
        let dst = buffer.row_mut(y);
        for (s, d) in src.chunks_exact(channels.len()).zip(dst.chunks_exact_mut(out_bpp)) {
            let c = read_channels(s, channels);
            // Rgb24, Xrgb8888 and Argb8888 all store B, G, R first.
            d[0] = c.b;
            d[1] = c.g;
            d[2] = c.r;
            if out_bpp == 4 {
                d[3] = if layout.has_alpha() { c.a } else { 0 };
            }
        }
    }
    Ok(buffer)
}

/// Take ownership of raw pixel bytes.
///
/// Layouts whose byte order matches a native format (`P`, `RGB`, `BGR`,
/// `RGBA`, `BGRA`, `ARGB`, `ABGR`, `RGBX`, `BGRX`) keep `bytes` as the
/// buffer's storage with the given pitch. Other layouts are converted.
/// `P` yields an 8-bit buffer with an all-black palette.
pub fn from_raw_buffer(
    bytes: Vec<u8>,
    size: (u32, u32),
    layout: &str,
    pitch: Option<usize>,
) -> Result<PixelBuffer, SurfaceError> {
    let layout = ChannelLayout::parse(layout)?;
    let (width, height) = size;
    let Some(format) = layout.native_format() else {
        return decode_parsed(&bytes, width, height, &layout, pitch);
    };
    let (_, pitch) = layout.resolve_pitch(width, pitch)?;
    let palette = format.is_indexed().then(Palette::black);
    PixelBuffer::from_vec(width, height, format, pitch, bytes, palette)
}

fn check_len(actual: usize, pitch: usize, height: u32) -> Result<(), SurfaceError> {
    let needed = pitch.saturating_mul(height as usize);
    if actual < needed {
        return Err(SurfaceError::BufferTooSmall { needed, actual });
    }
    Ok(())
}

fn write_channels(px: &mut [u8], channels: &[Channel], c: Color) {
    for (dst, ch) in px.iter_mut().zip(channels) {
        *dst = match ch {
            Channel::R => c.r,
            Channel::G => c.g,
            Channel::B => c.b,
            Channel::A => c.a,
            Channel::X => 255,
        };
    }
}

fn read_channels(px: &[u8], channels: &[Channel]) -> Color {
    let mut c = Color::new(0, 0, 0, 255);
    for (&v, ch) in px.iter().zip(channels) {
        match ch {
            Channel::R => c.r = v,
            Channel::G => c.g = v,
            Channel::B => c.b = v,
            Channel::A => c.a = v,
            Channel::X => {}
        }
    }
    c
}
