//! BMP encoder: palettized 8-bit, 24-bit BGR and 32-bit BGRA with an alpha mask.

use enough::Stop;

use crate::error::SurfaceError;
use crate::pixel::PixelFormat;
use crate::surface::PixelBuffer;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const V4_HEADER_SIZE: usize = 108;
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
/// 'sRGB' color space tag for V4 headers.
const LCS_SRGB: u32 = 0x7352_4742;

pub(crate) fn encode_bmp(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    stop.check()?;
    if buffer.is_indexed() {
        encode_8bit(buffer, stop)
    } else if buffer.has_alpha() {
        encode_32bit(buffer, stop)
    } else {
        encode_24bit(buffer, stop)
    }
}

struct Layout {
    row_stride: usize,
    data_size: usize,
    file_size: usize,
}

fn layout(buffer: &PixelBuffer, bpp: usize, header_size: usize) -> Result<Layout, SurfaceError> {
    let (width, height) = buffer.size();
    let too_large = || SurfaceError::DimensionsTooLarge { width, height };
    let row_stride = (width as usize)
        .checked_mul(bpp)
        .and_then(|r| r.checked_next_multiple_of(4))
        .ok_or_else(too_large)?;
    let data_size = row_stride
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;
    let file_size = data_size
        .checked_add(header_size)
        .filter(|&s| u32::try_from(s).is_ok())
        .ok_or_else(too_large)?;
    Ok(Layout {
        row_stride,
        data_size,
        file_size,
    })
}

fn encode_8bit(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    let palette = buffer
        .palette()
        .ok_or_else(|| SurfaceError::InvalidArgument("8-bit buffer without a palette".into()))?;
    let palette_size = palette.len() * 4;
    let header_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE + palette_size;
    let l = layout(buffer, 1, header_size)?;

    let mut out = Vec::with_capacity(l.file_size);
    write_file_header(&mut out, l.file_size, header_size);
    write_info_header(&mut out, INFO_HEADER_SIZE, buffer, 8, BI_RGB, l.data_size, palette.len());
    for c in palette.entries() {
        out.extend_from_slice(&[c.b, c.g, c.r, 0]);
    }

    let width = buffer.width() as usize;
    let pad = l.row_stride - width;
    for (i, y) in (0..buffer.height()).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        out.extend_from_slice(buffer.row(y));
        out.extend(std::iter::repeat_n(0u8, pad));
    }
    Ok(out)
}

fn encode_24bit(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    let header_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
    let l = layout(buffer, 3, header_size)?;

    let mut out = Vec::with_capacity(l.file_size);
    write_file_header(&mut out, l.file_size, header_size);
    write_info_header(&mut out, INFO_HEADER_SIZE, buffer, 24, BI_RGB, l.data_size, 0);

    let width = buffer.width();
    let pad = l.row_stride - width as usize * 3;
    // Rgb24 is already B, G, R in memory.
    let native = buffer.format() == PixelFormat::Rgb24;
    for (i, y) in (0..buffer.height()).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        if native {
            out.extend_from_slice(buffer.row(y));
        } else {
            for x in 0..width {
                let c = buffer.color_at(x, y);
                out.extend_from_slice(&[c.b, c.g, c.r]);
            }
        }
        out.extend(std::iter::repeat_n(0u8, pad));
    }
    Ok(out)
}

fn encode_32bit(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    let header_size = FILE_HEADER_SIZE + V4_HEADER_SIZE;
    let l = layout(buffer, 4, header_size)?;

    let mut out = Vec::with_capacity(l.file_size);
    write_file_header(&mut out, l.file_size, header_size);
    write_info_header(&mut out, V4_HEADER_SIZE, buffer, 32, BI_BITFIELDS, l.data_size, 0);
    for mask in PixelFormat::Argb8888.masks() {
        out.extend_from_slice(&mask.to_le_bytes());
    }
    out.extend_from_slice(&LCS_SRGB.to_le_bytes());
    // Endpoints (36) and gamma (12), unused for sRGB.
    out.extend_from_slice(&[0u8; 48]);

    let width = buffer.width();
    // Argb8888 is already B, G, R, A in memory.
    let native = buffer.format() == PixelFormat::Argb8888;
    for (i, y) in (0..buffer.height()).rev().enumerate() {
        if i % 16 == 0 {
            stop.check()?;
        }
        if native {
            out.extend_from_slice(buffer.row(y));
        } else {
            for x in 0..width {
                let c = buffer.color_at(x, y);
                out.extend_from_slice(&[c.b, c.g, c.r, c.a]);
            }
        }
    }
    Ok(out)
}

fn write_file_header(out: &mut Vec<u8>, file_size: usize, data_offset: usize) {
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(&(data_offset as u32).to_le_bytes());
}

/// The 40-byte BITMAPINFOHEADER prefix shared by all header versions.
fn write_info_header(
    out: &mut Vec<u8>,
    header_size: usize,
    buffer: &PixelBuffer,
    bpp: u16,
    compression: u32,
    data_size: usize,
    colors_used: usize,
) {
    out.extend_from_slice(&(header_size as u32).to_le_bytes());
    out.extend_from_slice(&(buffer.width() as i32).to_le_bytes());
    out.extend_from_slice(&(buffer.height() as i32).to_le_bytes()); // positive = bottom-up
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&(data_size as u32).to_le_bytes());
    out.extend_from_slice(&2835u32.to_le_bytes()); // 72 DPI
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&(colors_used as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // important colors
}
