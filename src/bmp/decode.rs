//! BMP decoder: OS/2 and Windows headers, 1-32 bit depths, RLE4/RLE8 and
//! bitfields.
//!
//! Bit unpacking, bitfield scaling and the RLE state machine follow
//! zune-bmp 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

use enough::Stop;

use super::utils::{mask_shift, shift_signed, unpack_indices};
use crate::error::SurfaceError;
use crate::palette::Palette;
use crate::pixel::{Color, PixelFormat};
use crate::surface::PixelBuffer;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
}

impl Compression {
    fn from_u32(num: u32) -> Option<(Self, bool)> {
        match num {
            0 => Some((Self::Rgb, false)),
            1 => Some((Self::Rle8, false)),
            2 => Some((Self::Rle4, false)),
            3 => Some((Self::Bitfields, false)),
            // BI_ALPHABITFIELDS
            6 => Some((Self::Bitfields, true)),
            _ => None,
        }
    }
}

/// Little-endian reader over the input slice. Reads past the end fail.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn set_position(&mut self, pos: usize) -> Result<(), SurfaceError> {
        if pos > self.data.len() {
            return Err(SurfaceError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<(), SurfaceError> {
        let end = self.pos.checked_add(n).ok_or(SurfaceError::UnexpectedEof)?;
        self.set_position(end)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SurfaceError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(SurfaceError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SurfaceError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, SurfaceError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, SurfaceError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Packed formats a 16/32-bit BMP can be adopted into without conversion.
const NATIVE_16: [PixelFormat; 4] = [
    PixelFormat::Rgb555,
    PixelFormat::Argb1555,
    PixelFormat::Rgb565,
    PixelFormat::Argb4444,
];
const NATIVE_32: [PixelFormat; 6] = [
    PixelFormat::Argb8888,
    PixelFormat::Xrgb8888,
    PixelFormat::Abgr8888,
    PixelFormat::Xbgr8888,
    PixelFormat::Rgba8888,
    PixelFormat::Bgra8888,
];

fn native_for_masks(depth: u16, masks: [u32; 4]) -> Option<PixelFormat> {
    let candidates: &[PixelFormat] = match depth {
        16 => &NATIVE_16,
        32 => &NATIVE_32,
        _ => return None,
    };
    candidates.iter().copied().find(|f| f.masks() == masks)
}

pub(crate) struct BmpDecoder<'a> {
    bytes: ByteReader<'a>,
    width: u32,
    height: u32,
    bottom_up: bool,
    depth: u16,
    compression: Compression,
    masks: [u32; 4],
    palette: Vec<Color>,
    data_offset: usize,
    output: PixelFormat,
}

impl<'a> BmpDecoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            bytes: ByteReader::new(data),
            width: 0,
            height: 0,
            bottom_up: true,
            depth: 0,
            compression: Compression::Rgb,
            masks: [0; 4],
            palette: Vec::new(),
            data_offset: 0,
            output: PixelFormat::Index8,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn output_format(&self) -> PixelFormat {
        self.output
    }

    pub(crate) fn read_headers(&mut self) -> Result<(), SurfaceError> {
        if self.bytes.take(2).ok() != Some(b"BM".as_slice()) {
            return Err(SurfaceError::UnrecognizedFormat);
        }
        let _file_size = self.bytes.u32()?;
        self.bytes.skip(4)?;
        let data_offset = self.bytes.u32()?;
        let ihsize = self.bytes.u32()?;
        if ihsize.saturating_add(14) > data_offset {
            return Err(SurfaceError::InvalidHeader(format!(
                "pixel data offset {data_offset} overlaps the {ihsize}-byte info header"
            )));
        }

        let (width, height, planes, depth);
        let mut compression = Compression::Rgb;
        let mut alpha_bitfields = false;
        let mut colors_used = 0u32;
        match ihsize {
            12 => {
                width = i32::from(self.bytes.u16()?);
                height = i32::from(self.bytes.u16()?);
                planes = self.bytes.u16()?;
                depth = self.bytes.u16()?;
            }
            16 | 40 | 52 | 56 | 64 | 108 | 124 => {
                width = self.bytes.u32()? as i32;
                height = self.bytes.u32()? as i32;
                planes = self.bytes.u16()?;
                depth = self.bytes.u16()?;
                if ihsize >= 40 {
                    let raw = self.bytes.u32()?;
                    (compression, alpha_bitfields) = Compression::from_u32(raw).ok_or_else(|| {
                        SurfaceError::InvalidHeader(format!("unsupported BMP compression {raw}"))
                    })?;
                    let _image_size = self.bytes.u32()?;
                    self.bytes.skip(8)?; // resolution
                    colors_used = self.bytes.u32()?;
                    let _important = self.bytes.u32()?;

                    // V2+ headers embed the masks; BITMAPINFOHEADER appends
                    // them after the header for BI_BITFIELDS.
                    let embedded = matches!(ihsize, 52 | 56 | 108 | 124);
                    if embedded || compression == Compression::Bitfields {
                        self.masks[0] = self.bytes.u32()?;
                        self.masks[1] = self.bytes.u32()?;
                        self.masks[2] = self.bytes.u32()?;
                    }
                    if matches!(ihsize, 56 | 108 | 124) || (alpha_bitfields && !embedded) {
                        self.masks[3] = self.bytes.u32()?;
                    }
                }
            }
            _ => {
                return Err(SurfaceError::InvalidHeader(format!(
                    "unknown BMP info header size {ihsize}"
                )));
            }
        }

        if planes != 1 {
            return Err(SurfaceError::InvalidHeader(format!(
                "BMP planes field is {planes}, expected 1"
            )));
        }
        if width <= 0 || height == 0 || height == i32::MIN {
            return Err(SurfaceError::InvalidHeader(format!(
                "invalid BMP dimensions {width}x{height}"
            )));
        }
        self.width = width as u32;
        self.height = height.unsigned_abs();
        self.bottom_up = height > 0;

        let rle = matches!(compression, Compression::Rle4 | Compression::Rle8);
        if rle && !self.bottom_up {
            return Err(SurfaceError::InvalidData(
                "RLE compression with top-down row order".into(),
            ));
        }
        match (compression, depth) {
            (Compression::Rle8, 8) | (Compression::Rle4, 4) => {}
            (Compression::Rle8 | Compression::Rle4, d) => {
                return Err(SurfaceError::InvalidHeader(format!(
                    "{compression:?} with bit depth {d}"
                )));
            }
            (Compression::Bitfields, 16 | 32) => {}
            (Compression::Bitfields, d) => {
                return Err(SurfaceError::InvalidHeader(format!(
                    "bitfields with bit depth {d}"
                )));
            }
            _ => {}
        }

        self.output = match depth {
            1 | 2 | 4 | 8 => {
                self.read_palette(ihsize, data_offset, depth, colors_used)?;
                PixelFormat::Index8
            }
            16 => {
                if compression == Compression::Rgb {
                    self.masks = PixelFormat::Rgb555.masks();
                }
                native_for_masks(16, self.masks).unwrap_or(if self.masks[3] != 0 {
                    PixelFormat::Argb8888
                } else {
                    PixelFormat::Xrgb8888
                })
            }
            24 => PixelFormat::Rgb24,
            32 => {
                if compression == Compression::Rgb {
                    // Alpha byte is checked after decoding.
                    self.masks = PixelFormat::Argb8888.masks();
                }
                native_for_masks(32, self.masks).unwrap_or(if self.masks[3] != 0 {
                    PixelFormat::Argb8888
                } else {
                    PixelFormat::Xrgb8888
                })
            }
            d => {
                return Err(SurfaceError::InvalidHeader(format!(
                    "BMP bit depth {d} unsupported"
                )));
            }
        };

        self.depth = depth;
        self.compression = compression;
        self.data_offset = data_offset as usize;
        Ok(())
    }

    fn read_palette(
        &mut self,
        ihsize: u32,
        data_offset: u32,
        depth: u16,
        colors_used: u32,
    ) -> Result<(), SurfaceError> {
        let max_colors = 1u32 << depth;
        if colors_used > max_colors {
            return Err(SurfaceError::InvalidHeader(format!(
                "BMP palette count {colors_used} exceeds {max_colors} for {depth}-bit depth"
            )));
        }
        let entry_size = if ihsize == 12 { 3 } else { 4 };
        let start = 14 + ihsize as usize;
        let available = (data_offset as usize - start) / entry_size;
        let wanted = if colors_used == 0 { max_colors } else { colors_used } as usize;
        let count = wanted.min(available);

        if count == 0 {
            if depth != 8 {
                return Err(SurfaceError::InvalidHeader(format!(
                    "{depth}-bit BMP without a palette"
                )));
            }
            // 8-bit without a color table: grayscale
            self.palette = Palette::grayscale().entries().to_vec();
            return Ok(());
        }

        self.bytes.set_position(start)?;
        self.palette = Vec::with_capacity(count);
        for _ in 0..count {
            let entry = self.bytes.take(entry_size)?;
            self.palette.push(Color::new(entry[2], entry[1], entry[0], 255));
        }
        Ok(())
    }

    /// Decode pixel rows into a buffer in [`Self::output_format`].
    pub(crate) fn decode(mut self, stop: &dyn Stop) -> Result<PixelBuffer, SurfaceError> {
        self.bytes.set_position(self.data_offset)?;
        let out_bpp = self.output.bytes_per_pixel();
        let pitch = (self.width as usize * out_bpp).next_multiple_of(4);
        let mut data = vec![0u8; pitch * self.height as usize];

        match self.compression {
            Compression::Rle4 | Compression::Rle8 => {
                let plane = self.decode_rle(stop)?;
                let w = self.width as usize;
                for (dst, src) in data.chunks_exact_mut(pitch).zip(plane.chunks_exact(w)) {
                    self.check_indices(src)?;
                    dst[..w].copy_from_slice(src);
                }
            }
            _ => self.decode_rows(&mut data, pitch, stop)?,
        }

        let mut output = self.output;
        if self.depth == 32
            && self.compression == Compression::Rgb
            && data.chunks_exact(4).all(|px| px[3] == 0)
        {
            // BI_RGB 32-bit leaves the fourth byte unused; zero means opaque.
            output = PixelFormat::Xrgb8888;
        }

        let palette = if output.is_indexed() {
            Some(Palette::new(std::mem::take(&mut self.palette))?)
        } else {
            None
        };
        PixelBuffer::from_vec(self.width, self.height, output, pitch, data, palette)
    }

    fn decode_rows(&mut self, data: &mut [u8], pitch: usize, stop: &dyn Stop) -> Result<(), SurfaceError> {
        let w = self.width as usize;
        let h = self.height as usize;
        let depth = usize::from(self.depth);
        let in_stride = (w * depth).div_ceil(32) * 4;
        let out_bpp = self.output.bytes_per_pixel();
        let native = self.depth == 24 || native_for_masks(self.depth, self.masks).is_some();
        let needed = (w * depth).div_ceil(8);
        let mut indices = vec![0u8; w];

        for row in 0..h {
            if row % 16 == 0 {
                stop.check()?;
            }
            let y = if self.bottom_up { h - 1 - row } else { row };
            let src = self.bytes.take(needed)?;
            // Tolerate a missing pad on the final row.
            let pad = (in_stride - needed).min(self.bytes.remaining());
            self.bytes.skip(pad)?;
            let dst = &mut data[y * pitch..y * pitch + w * out_bpp];
            match self.depth {
                1 | 2 | 4 => {
                    unpack_indices(depth, src, &mut indices);
                    self.check_indices(&indices)?;
                    dst.copy_from_slice(&indices);
                }
                8 => {
                    self.check_indices(&src[..w])?;
                    dst.copy_from_slice(&src[..w]);
                }
                _ if native => dst.copy_from_slice(&src[..w * out_bpp]),
                _ => self.convert_bitfields(src, dst),
            }
        }
        Ok(())
    }

    /// Scale arbitrary bitfield masks into `Argb8888`/`Xrgb8888` (B, G, R, A).
    fn convert_bitfields(&self, src: &[u8], dst: &mut [u8]) {
        let [mr, mg, mb, ma] = self.masks;
        let channel = |v: u32, m: u32| shift_signed(v & m, mask_shift(m), m.count_ones()) as u8;
        let in_bpp = usize::from(self.depth / 8);
        for (s, d) in src.chunks_exact(in_bpp).zip(dst.chunks_exact_mut(4)) {
            let v = if in_bpp == 2 {
                u32::from(u16::from_le_bytes([s[0], s[1]]))
            } else {
                u32::from_le_bytes([s[0], s[1], s[2], s[3]])
            };
            d[0] = channel(v, mb);
            d[1] = channel(v, mg);
            d[2] = channel(v, mr);
            d[3] = if ma == 0 { 0 } else { channel(v, ma) };
        }
    }

    fn check_indices(&self, indices: &[u8]) -> Result<(), SurfaceError> {
        crate::palette::check_indices(indices, self.palette.len())
    }

    /// Expand RLE4/RLE8 data into a top-down plane of palette indices.
    ///
    /// Pixels that land past the row end are dropped. A missing
    /// end-of-bitmap marker ends the image at end of input.
    fn decode_rle(&mut self, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
        let w = self.width as usize;
        let h = self.height as usize;
        let rle4 = self.compression == Compression::Rle4;
        let mut plane = vec![0u8; w * h];
        let mut line = h as isize - 1;
        let mut x = 0usize;
        let mut ops = 0u32;

        let put = |plane: &mut [u8], line: isize, x: usize, index: u8| {
            if line >= 0 && x < w {
                plane[line as usize * w + x] = index;
            }
        };

        while line >= 0 {
            ops = ops.wrapping_add(1);
            if ops % 1024 == 0 {
                stop.check()?;
            }
            let Ok(count) = self.bytes.u8() else {
                break;
            };
            let value = self.bytes.u8()?;
            if count > 0 {
                for i in 0..count {
                    let index = match (rle4, i % 2) {
                        (false, _) => value,
                        (true, 0) => value >> 4,
                        (true, _) => value & 0x0f,
                    };
                    put(&mut plane, line, x, index);
                    x += 1;
                }
                continue;
            }
            match value {
                0 => {
                    line -= 1;
                    x = 0;
                }
                1 => break,
                2 => {
                    let dx = self.bytes.u8()?;
                    let dy = self.bytes.u8()?;
                    x += usize::from(dx);
                    line -= isize::from(dy);
                }
                n => {
                    let n = usize::from(n);
                    let byte_len = if rle4 { n.div_ceil(2) } else { n };
                    let run = self.bytes.take(byte_len)?;
                    for i in 0..n {
                        let index = if rle4 {
                            let b = run[i / 2];
                            if i % 2 == 0 { b >> 4 } else { b & 0x0f }
                        } else {
                            run[i]
                        };
                        put(&mut plane, line, x, index);
                        x += 1;
                    }
                    // Absolute runs are padded to a 16-bit boundary.
                    if byte_len % 2 == 1 {
                        self.bytes.skip(1)?;
                    }
                }
            }
        }
        Ok(plane)
    }
}
