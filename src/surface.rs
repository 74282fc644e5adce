use std::fmt;

use crate::error::SurfaceError;
use crate::palette::Palette;
use crate::pixel::{Color, PixelFormat, PixelFormatDescriptor};

/// Surface state flags derived from a buffer's alpha and colorkey settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceFlags(u32);

impl SurfaceFlags {
    /// Colorkey is set.
    pub const COLORKEY: Self = Self(0x0000_1000);
    /// Per-pixel alpha channel is present.
    pub const SRCALPHA: Self = Self(0x0001_0000);
    /// Blending applies (per-pixel alpha or per-surface alpha).
    pub const BLEND: Self = Self(0x0000_0004);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SurfaceFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SurfaceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A mutable 2D pixel buffer.
///
/// Storage is `pitch * height` bytes. Rows may be padded past
/// `width * bytes_per_pixel`; all access goes through `pitch`. 8-bit buffers
/// always carry a palette, direct-color buffers never do. Clones are deep.
#[derive(Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormatDescriptor,
    palette: Option<Palette>,
    pitch: usize,
    data: Vec<u8>,
    colorkey: Option<Color>,
    alpha: Option<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer by bit depth.
    ///
    /// | depth | without alpha | with alpha |
    /// |-------|---------------|------------|
    /// | 8     | `Index8`      | error      |
    /// | 15    | `Rgb555`      | `Argb1555` |
    /// | 16    | `Rgb565`      | `Argb4444` |
    /// | 24    | `Rgb24`       | `Argb8888` |
    /// | 32    | `Xrgb8888`    | `Argb8888` |
    ///
    /// 8-bit buffers start with the fixed 3-3-2 palette.
    pub fn allocate(width: i32, height: i32, depth: u8, with_alpha: bool) -> Result<Self, SurfaceError> {
        let (width, height) = check_dimensions(width, height)?;
        let format = match (depth, with_alpha) {
            (8, false) => PixelFormat::Index8,
            (8, true) => {
                return Err(SurfaceError::InvalidArgument(
                    "8-bit indexed buffers cannot carry an alpha channel".into(),
                ));
            }
            (15, false) => PixelFormat::Rgb555,
            (15, true) => PixelFormat::Argb1555,
            (16, false) => PixelFormat::Rgb565,
            (16, true) => PixelFormat::Argb4444,
            (24, false) => PixelFormat::Rgb24,
            (32, false) => PixelFormat::Xrgb8888,
            (24 | 32, true) => PixelFormat::Argb8888,
            (d, _) => {
                return Err(SurfaceError::InvalidArgument(format!(
                    "unsupported bit depth {d}"
                )));
            }
        };
        Self::new(width, height, format)
    }

    /// Allocate a zeroed buffer in an explicit format with a 4-byte aligned pitch.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimension(format!(
                "{width}x{height}: width and height must be positive"
            )));
        }
        let pitch = row_bytes(width, format.bytes_per_pixel())
            .and_then(|n| n.checked_next_multiple_of(4))
            .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
        let palette = format.is_indexed().then(Palette::rgb332);
        Ok(Self {
            width,
            height,
            format: PixelFormatDescriptor::new(format),
            palette,
            pitch,
            data: vec![0u8; len],
            colorkey: None,
            alpha: None,
        })
    }

    /// Wrap existing storage.
    ///
    /// `pitch` must cover one row and `data` must hold `pitch * height` bytes.
    /// Indexed buffers without a palette get the 3-3-2 palette; a palette on
    /// a direct-color format is rejected.
    pub fn from_vec(
        width: u32,
        height: u32,
        format: PixelFormat,
        pitch: usize,
        data: Vec<u8>,
        palette: Option<Palette>,
    ) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimension(format!(
                "{width}x{height}: width and height must be positive"
            )));
        }
        let row = row_bytes(width, format.bytes_per_pixel())
            .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
        if pitch < row {
            return Err(SurfaceError::Configuration(format!(
                "pitch {pitch} is smaller than the row size {row}"
            )));
        }
        let needed = pitch
            .checked_mul(height as usize)
            .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
        if data.len() < needed {
            return Err(SurfaceError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        let palette = match (format.is_indexed(), palette) {
            (true, Some(p)) => Some(p),
            (true, None) => Some(Palette::rgb332()),
            (false, None) => None,
            (false, Some(_)) => {
                return Err(SurfaceError::InvalidArgument(format!(
                    "{format} buffers do not take a palette"
                )));
            }
        };
        let mut data = data;
        data.truncate(needed);
        Ok(Self {
            width,
            height,
            format: PixelFormatDescriptor::new(format),
            palette,
            pitch,
            data,
            colorkey: None,
            alpha: None,
        })
    }

    /// Tightly packed `R, G, B, A` bytes as an `Abgr8888` buffer.
    pub(crate) fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SurfaceError> {
        Self::from_vec(width, height, PixelFormat::Abgr8888, width as usize * 4, rgba, None)
    }

    /// Tightly packed `R, G, B` bytes as a `Bgr24` buffer.
    pub(crate) fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, SurfaceError> {
        Self::from_vec(width, height, PixelFormat::Bgr24, width as usize * 3, rgb, None)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> PixelFormat {
        self.format.format()
    }

    pub fn descriptor(&self) -> &PixelFormatDescriptor {
        &self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    pub fn is_indexed(&self) -> bool {
        self.palette.is_some()
    }

    /// Raw storage including row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        &self.data[start..start + self.width as usize * self.bytes_per_pixel()]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.pitch;
        let len = self.width as usize * self.bytes_per_pixel();
        &mut self.data[start..start + len]
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Overwrite palette entries from index 0.
    pub fn set_palette(&mut self, colors: &[Color]) -> Result<(), SurfaceError> {
        self.palette_mut()?.set_range(0, colors)
    }

    pub fn set_palette_at(&mut self, index: usize, color: Color) -> Result<(), SurfaceError> {
        self.palette_mut()?.set(index, color)
    }

    pub fn palette_at(&self, index: usize) -> Result<Color, SurfaceError> {
        let palette = self.palette.as_ref().ok_or_else(no_palette)?;
        palette.get(index).ok_or_else(|| {
            SurfaceError::InvalidArgument(format!(
                "palette index {index} out of range 0..{}",
                palette.len()
            ))
        })
    }

    /// Replace the whole palette table. Only for 8-bit buffers.
    pub(crate) fn replace_palette(&mut self, palette: Palette) -> Result<(), SurfaceError> {
        *self.palette_mut()? = palette;
        Ok(())
    }

    fn palette_mut(&mut self) -> Result<&mut Palette, SurfaceError> {
        self.palette.as_mut().ok_or_else(no_palette)
    }

    pub fn colorkey(&self) -> Option<Color> {
        self.colorkey
    }

    /// Set or clear the colorkey. Stored verbatim.
    pub fn set_colorkey(&mut self, key: Option<Color>) {
        self.colorkey = key;
    }

    /// Per-surface alpha, if set.
    pub fn alpha(&self) -> Option<u8> {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: Option<u8>) {
        self.alpha = alpha;
    }

    pub fn flags(&self) -> SurfaceFlags {
        let mut flags = SurfaceFlags::empty();
        if self.has_alpha() {
            flags |= SurfaceFlags::SRCALPHA | SurfaceFlags::BLEND;
        }
        if self.alpha.is_some() {
            flags |= SurfaceFlags::BLEND;
        }
        if self.colorkey.is_some() {
            flags |= SurfaceFlags::COLORKEY;
        }
        flags
    }

    /// Read one pixel. Indexed buffers resolve through the palette.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<Color, SurfaceError> {
        let (x, y) = self.check_coords(x, y)?;
        Ok(self.color_at(x, y))
    }

    /// Write one pixel. Indexed buffers store the nearest palette entry.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> Result<(), SurfaceError> {
        let (x, y) = self.check_coords(x, y)?;
        let value = self.map_color(color);
        self.write_value(x, y, value);
        Ok(())
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        let value = self.map_color(color);
        let bpp = self.bytes_per_pixel();
        let bytes = value.to_le_bytes();
        for y in 0..self.height {
            for px in self.row_mut(y).chunks_exact_mut(bpp) {
                px.copy_from_slice(&bytes[..bpp]);
            }
        }
    }

    /// Pixel value as stored: little-endian, `bytes_per_pixel` wide.
    pub(crate) fn value_at(&self, x: u32, y: u32) -> u32 {
        let bpp = self.bytes_per_pixel();
        let offset = y as usize * self.pitch + x as usize * bpp;
        let mut bytes = [0u8; 4];
        bytes[..bpp].copy_from_slice(&self.data[offset..offset + bpp]);
        u32::from_le_bytes(bytes)
    }

    pub(crate) fn write_value(&mut self, x: u32, y: u32, value: u32) {
        let bpp = self.bytes_per_pixel();
        let offset = y as usize * self.pitch + x as usize * bpp;
        self.data[offset..offset + bpp].copy_from_slice(&value.to_le_bytes()[..bpp]);
    }

    /// Color at an in-bounds coordinate.
    pub(crate) fn color_at(&self, x: u32, y: u32) -> Color {
        let value = self.value_at(x, y);
        match &self.palette {
            Some(p) => p.get(value as usize).unwrap_or(Color::new(0, 0, 0, 255)),
            None => self.format.unmap(value),
        }
    }

    pub(crate) fn map_color(&self, color: Color) -> u32 {
        match &self.palette {
            Some(p) => u32::from(p.nearest(color)),
            None => self.format.map(color),
        }
    }

    /// All pixels as tightly packed `R, G, B, A` bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.color_at(x, y);
                out.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        out
    }

    /// All pixels as tightly packed `R, G, B` bytes.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.color_at(x, y);
                out.extend_from_slice(&[c.r, c.g, c.b]);
            }
        }
        out
    }

    /// Copy into an [`imgref::ImgVec`] of RGBA pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec(&self) -> imgref::ImgVec<Color> {
        use rgb::FromSlice as _;
        let rgba = self.to_rgba();
        imgref::ImgVec::new(
            rgba.as_rgba().to_vec(),
            self.width as usize,
            self.height as usize,
        )
    }

    fn check_coords(&self, x: i32, y: i32) -> Result<(u32, u32), SurfaceError> {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(ux), Ok(uy)) if ux < self.width && uy < self.height => Ok((ux, uy)),
            _ => Err(SurfaceError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            }),
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format.format())
            .field("pitch", &self.pitch)
            .field("palette_len", &self.palette.as_ref().map(Palette::len))
            .field("colorkey", &self.colorkey)
            .field("alpha", &self.alpha)
            .finish()
    }
}

fn no_palette() -> SurfaceError {
    SurfaceError::InvalidArgument("buffer has no palette (not 8-bit)".into())
}

pub(crate) fn row_bytes(width: u32, bytes_per_pixel: usize) -> Option<usize> {
    (width as usize).checked_mul(bytes_per_pixel)
}

pub(crate) fn check_dimensions(width: i32, height: i32) -> Result<(u32, u32), SurfaceError> {
    if width <= 0 || height <= 0 {
        return Err(SurfaceError::InvalidDimension(format!(
            "{width}x{height}: width and height must be positive"
        )));
    }
    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_depths() {
        let cases = [
            (8, false, PixelFormat::Index8),
            (15, false, PixelFormat::Rgb555),
            (15, true, PixelFormat::Argb1555),
            (16, false, PixelFormat::Rgb565),
            (16, true, PixelFormat::Argb4444),
            (24, false, PixelFormat::Rgb24),
            (24, true, PixelFormat::Argb8888),
            (32, false, PixelFormat::Xrgb8888),
            (32, true, PixelFormat::Argb8888),
        ];
        for (depth, alpha, expected) in cases {
            let b = PixelBuffer::allocate(3, 2, depth, alpha).unwrap();
            assert_eq!(b.format(), expected, "depth {depth} alpha {alpha}");
            assert_eq!(b.pitch() % 4, 0);
            assert!(b.pitch() >= 3 * b.bytes_per_pixel());
            assert_eq!(b.palette().is_some(), depth == 8);
        }
    }

    #[test]
    fn allocate_rejects_bad_input() {
        let e = PixelBuffer::allocate(0, 5, 32, false).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::InvalidDimension);
        let e = PixelBuffer::allocate(5, -1, 32, false).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::InvalidDimension);
        let e = PixelBuffer::allocate(5, 5, 8, true).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::InvalidArgument);
        let e = PixelBuffer::allocate(5, 5, 12, false).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn get_set_roundtrip_through_pitch() {
        let mut b = PixelBuffer::allocate(3, 3, 24, false).unwrap();
        assert_eq!(b.pitch(), 12);
        let c = Color::new(10, 20, 30, 255);
        b.set_pixel(2, 1, c).unwrap();
        assert_eq!(b.get_pixel(2, 1).unwrap(), c);
        assert_eq!(b.get_pixel(0, 1).unwrap(), Color::new(0, 0, 0, 255));
        // Rgb24 stores B, G, R
        assert_eq!(&b.data()[12 + 6..12 + 9], &[30, 20, 10]);
    }

    #[test]
    fn out_of_bounds() {
        let mut b = PixelBuffer::allocate(2, 2, 32, true).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2)] {
            let e = b.get_pixel(x, y).unwrap_err();
            assert!(matches!(e, SurfaceError::OutOfBounds { .. }));
            assert!(b.set_pixel(x, y, Color::new(0, 0, 0, 0)).is_err());
        }
    }

    #[test]
    fn indexed_uses_palette() {
        let mut b = PixelBuffer::allocate(2, 1, 8, false).unwrap();
        b.set_palette(&[Color::new(1, 2, 3, 255), Color::new(200, 100, 50, 255)])
            .unwrap();
        b.set_pixel(1, 0, Color::new(199, 99, 51, 255)).unwrap();
        assert_eq!(b.row(0)[1], 1);
        assert_eq!(b.get_pixel(1, 0).unwrap(), Color::new(200, 100, 50, 255));
    }

    #[test]
    fn flags_follow_state() {
        let mut b = PixelBuffer::allocate(1, 1, 24, false).unwrap();
        assert_eq!(b.flags(), SurfaceFlags::empty());
        b.set_colorkey(Some(Color::new(1, 2, 3, 255)));
        b.set_alpha(Some(128));
        assert!(b.flags().contains(SurfaceFlags::COLORKEY | SurfaceFlags::BLEND));
        assert!(!b.flags().contains(SurfaceFlags::SRCALPHA));
        let a = PixelBuffer::allocate(1, 1, 32, true).unwrap();
        assert!(a.flags().contains(SurfaceFlags::SRCALPHA));
    }

    #[test]
    fn clone_is_deep() {
        let mut a = PixelBuffer::allocate(2, 2, 32, false).unwrap();
        let b = a.clone();
        a.fill(Color::new(9, 9, 9, 255));
        assert_eq!(b.get_pixel(0, 0).unwrap(), Color::new(0, 0, 0, 255));
        assert_eq!(a.get_pixel(1, 1).unwrap(), Color::new(9, 9, 9, 255));
    }
}
