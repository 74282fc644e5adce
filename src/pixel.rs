use std::borrow::Cow;
use std::fmt;

/// An RGBA color with 8 bits per channel.
pub type Color = rgb::RGBA8;

/// Canonical pixel formats a [`crate::PixelBuffer`] can be stored in.
///
/// Packed formats are described by masks over a little-endian pixel value of
/// `bytes_per_pixel` bytes, so `Argb8888` is laid out in memory as
/// `B, G, R, A` and `Abgr8888` as `R, G, B, A`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit palette index.
    Index8,
    /// 15-bit RGB in 2 bytes (x1r5g5b5).
    Rgb555,
    /// 16-bit ARGB with 1-bit alpha.
    Argb1555,
    /// 16-bit RGB (r5g6b5).
    Rgb565,
    /// 16-bit ARGB with 4 bits per channel.
    Argb4444,
    /// 24-bit packed, memory order `B, G, R`.
    Rgb24,
    /// 24-bit packed, memory order `R, G, B`.
    Bgr24,
    /// 32-bit, memory order `B, G, R, X`.
    Xrgb8888,
    /// 32-bit, memory order `R, G, B, X`.
    Xbgr8888,
    /// 32-bit, memory order `B, G, R, A`.
    Argb8888,
    /// 32-bit, memory order `R, G, B, A`.
    Abgr8888,
    /// 32-bit, memory order `A, B, G, R`.
    Rgba8888,
    /// 32-bit, memory order `A, R, G, B`.
    Bgra8888,
}

const ALL_FORMATS: [PixelFormat; 13] = [
    PixelFormat::Index8,
    PixelFormat::Rgb555,
    PixelFormat::Argb1555,
    PixelFormat::Rgb565,
    PixelFormat::Argb4444,
    PixelFormat::Rgb24,
    PixelFormat::Bgr24,
    PixelFormat::Xrgb8888,
    PixelFormat::Xbgr8888,
    PixelFormat::Argb8888,
    PixelFormat::Abgr8888,
    PixelFormat::Rgba8888,
    PixelFormat::Bgra8888,
];

impl PixelFormat {
    /// Stable numeric identifier used for descriptor equality.
    pub fn id(self) -> u32 {
        match self {
            Self::Index8 => 0x1300_0801,
            Self::Rgb555 => 0x1531_0f02,
            Self::Argb1555 => 0x1533_1002,
            Self::Rgb565 => 0x1515_1002,
            Self::Argb4444 => 0x1532_1002,
            Self::Rgb24 => 0x1710_1803,
            Self::Bgr24 => 0x1740_1803,
            Self::Xrgb8888 => 0x1616_1804,
            Self::Xbgr8888 => 0x1656_1804,
            Self::Argb8888 => 0x1636_2004,
            Self::Abgr8888 => 0x1676_2004,
            Self::Rgba8888 => 0x1646_2004,
            Self::Bgra8888 => 0x1686_2004,
        }
    }

    /// Friendly name, e.g. `"ARGB8888"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Index8 => "INDEX8",
            Self::Rgb555 => "RGB555",
            Self::Argb1555 => "ARGB1555",
            Self::Rgb565 => "RGB565",
            Self::Argb4444 => "ARGB4444",
            Self::Rgb24 => "RGB24",
            Self::Bgr24 => "BGR24",
            Self::Xrgb8888 => "XRGB8888",
            Self::Xbgr8888 => "XBGR8888",
            Self::Argb8888 => "ARGB8888",
            Self::Abgr8888 => "ABGR8888",
            Self::Rgba8888 => "RGBA8888",
            Self::Bgra8888 => "BGRA8888",
        }
    }

    /// Look up a format by friendly name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_FORMATS
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Significant bits per pixel. Not always `8 * bytes_per_pixel`.
    pub fn bits_per_pixel(self) -> u8 {
        match self {
            Self::Index8 => 8,
            Self::Rgb555 => 15,
            Self::Argb1555 | Self::Rgb565 | Self::Argb4444 => 16,
            Self::Rgb24 | Self::Bgr24 | Self::Xrgb8888 | Self::Xbgr8888 => 24,
            Self::Argb8888 | Self::Abgr8888 | Self::Rgba8888 | Self::Bgra8888 => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Index8 => 1,
            Self::Rgb555 | Self::Argb1555 | Self::Rgb565 | Self::Argb4444 => 2,
            Self::Rgb24 | Self::Bgr24 => 3,
            _ => 4,
        }
    }

    /// `[r, g, b, a]` masks over the little-endian pixel value.
    pub fn masks(self) -> [u32; 4] {
        match self {
            Self::Index8 => [0, 0, 0, 0],
            Self::Rgb555 => [0x7c00, 0x03e0, 0x001f, 0],
            Self::Argb1555 => [0x7c00, 0x03e0, 0x001f, 0x8000],
            Self::Rgb565 => [0xf800, 0x07e0, 0x001f, 0],
            Self::Argb4444 => [0x0f00, 0x00f0, 0x000f, 0xf000],
            Self::Rgb24 | Self::Xrgb8888 => [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0],
            Self::Bgr24 | Self::Xbgr8888 => [0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0],
            Self::Argb8888 => [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000],
            Self::Abgr8888 => [0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0xff00_0000],
            Self::Rgba8888 => [0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff],
            Self::Bgra8888 => [0x0000_ff00, 0x00ff_0000, 0xff00_0000, 0x0000_00ff],
        }
    }

    pub fn has_alpha(self) -> bool {
        self.masks()[3] != 0
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, Self::Index8)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory layout of a pixel buffer: depth, masks, shifts, alpha presence.
///
/// Derived fields are computed once from the [`PixelFormat`]. Two
/// descriptors compare equal iff their canonical format matches; the
/// friendly name takes no part in equality.
#[derive(Clone, Debug)]
pub struct PixelFormatDescriptor {
    format: PixelFormat,
    name: Cow<'static, str>,
    bits_per_pixel: u8,
    bytes_per_pixel: usize,
    masks: [u32; 4],
    shifts: [u8; 4],
    bits: [u8; 4],
    has_alpha: bool,
}

impl PixelFormatDescriptor {
    pub fn new(format: PixelFormat) -> Self {
        let masks = format.masks();
        let shifts = masks.map(|m| if m == 0 { 0 } else { m.trailing_zeros() as u8 });
        let bits = masks.map(|m| m.count_ones() as u8);
        Self {
            format,
            name: Cow::Borrowed(format.name()),
            bits_per_pixel: format.bits_per_pixel(),
            bytes_per_pixel: format.bytes_per_pixel(),
            masks,
            shifts,
            bits,
            has_alpha: masks[3] != 0,
        }
    }

    /// Replace the friendly name. Does not affect equality.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// `[r, g, b, a]` channel masks.
    pub fn masks(&self) -> [u32; 4] {
        self.masks
    }

    /// `[r, g, b, a]` channel shifts.
    pub fn shifts(&self) -> [u8; 4] {
        self.shifts
    }

    /// `[r, g, b, a]` significant bits per channel.
    pub fn bits(&self) -> [u8; 4] {
        self.bits
    }

    /// Bytes at the start and end of each pixel that carry no channel data.
    pub fn padding(&self) -> (u8, u8) {
        let used = self.masks.iter().fold(0u32, |acc, m| acc | m);
        if used == 0 {
            return (0, 0);
        }
        let total_bits = self.bytes_per_pixel as u32 * 8;
        let low = used.trailing_zeros() / 8;
        let high_bit = 32 - used.leading_zeros();
        let high = (total_bits.saturating_sub(high_bit)) / 8;
        (low as u8, high as u8)
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Pack a color into a pixel value. Alpha is dropped without an alpha mask.
    pub fn map(&self, color: Color) -> u32 {
        let channels = [color.r, color.g, color.b, color.a];
        let mut value = 0u32;
        for i in 0..4 {
            let bits = u32::from(self.bits[i]);
            if bits == 0 {
                continue;
            }
            let v = u32::from(channels[i]) >> (8 - bits);
            value |= (v << self.shifts[i]) & self.masks[i];
        }
        value
    }

    /// Unpack a pixel value. Alpha reads as 255 without an alpha mask.
    pub fn unmap(&self, value: u32) -> Color {
        let mut out = [0u8, 0, 0, 255];
        for (i, slot) in out.iter_mut().enumerate() {
            let bits = self.bits[i];
            if bits == 0 {
                continue;
            }
            let v = (value & self.masks[i]) >> self.shifts[i];
            *slot = expand_to_u8(v, bits);
        }
        Color::new(out[0], out[1], out[2], out[3])
    }
}

impl PartialEq for PixelFormatDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.format.id() == other.format.id()
    }
}

impl Eq for PixelFormatDescriptor {}

impl From<PixelFormat> for PixelFormatDescriptor {
    fn from(format: PixelFormat) -> Self {
        Self::new(format)
    }
}

/// Scale an n-bit channel value to the full 0..=255 range.
pub(crate) fn expand_to_u8(v: u32, bits: u8) -> u8 {
    match bits {
        0 => 0,
        8 => v as u8,
        b if b > 8 => (v >> (b - 8)) as u8,
        b => {
            let max = (1u32 << b) - 1;
            ((v * 255 + max / 2) / max) as u8
        }
    }
}
