//! PNG codec adapter using the png crate.
//!
//! Indexed images decode to 8-bit buffers with their palette intact;
//! colorkeys travel through `tRNS` in both directions.

use std::io::Cursor;

use enough::Stop;

use crate::decode::DecodeContext;
use crate::encode::EncodeContext;
use crate::error::SurfaceError;
use crate::format::ImageFormat;
use crate::palette::{Palette, check_indices};
use crate::pixel::{Color, PixelFormat};
use crate::quantize::quantize;
use crate::surface::PixelBuffer;

fn png_err<E>(e: E) -> SurfaceError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SurfaceError::codec(ImageFormat::Png, e)
}

/// Decode PNG to a buffer.
///
/// | color type | output |
/// |------------|--------|
/// | indexed    | `Index8` with the PLTE palette; `Abgr8888` when `tRNS` is more than one colorkey |
/// | gray       | `Index8` with a gray ramp |
/// | RGB        | `Bgr24`, `tRNS` becomes the colorkey |
/// | gray+alpha, RGBA | `Abgr8888` |
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    let header = decoder.read_header_info().map_err(png_err)?;
    let (width, height) = (header.width, header.height);
    let color_type = header.color_type;
    ctx.limits.check_output(width, height, 4)?;

    decoder.set_transformations(match color_type {
        png::ColorType::Indexed => png::Transformations::IDENTITY,
        png::ColorType::Rgb => png::Transformations::STRIP_16,
        _ => png::Transformations::EXPAND | png::Transformations::STRIP_16,
    });
    let mut reader = decoder.read_info().map_err(png_err)?;
    ctx.stop.check()?;

    let size = reader
        .output_buffer_size()
        .ok_or_else(|| SurfaceError::InvalidHeader("cannot determine PNG output buffer size".into()))?;
    let mut raw = vec![0u8; size];
    let frame = reader.next_frame(&mut raw).map_err(png_err)?;
    let line_size = frame.line_size;
    let (out_color, _) = reader.output_color_type();
    let info = reader.info();

    match out_color {
        png::ColorType::Indexed => {
            let plte = info
                .palette
                .as_deref()
                .ok_or_else(|| SurfaceError::InvalidData("indexed PNG without PLTE".into()))?;
            let entries: Vec<Color> = plte
                .chunks_exact(3)
                .map(|c| Color::new(c[0], c[1], c[2], 255))
                .collect();
            let depth = frame.bit_depth as usize;
            let indices = rows_to_indices(&raw, line_size, width, height, depth, ctx.stop)?;
            check_indices(&indices, entries.len())?;
            let trns = info.trns.as_deref().unwrap_or_default();
            match indexed_alpha(trns) {
                IndexedAlpha::Blended => {
                    let rgba = indices
                        .iter()
                        .flat_map(|&i| {
                            let i = usize::from(i);
                            let c = entries[i];
                            [c.r, c.g, c.b, trns.get(i).copied().unwrap_or(255)]
                        })
                        .collect();
                    PixelBuffer::from_rgba(width, height, rgba)
                }
                alpha => {
                    let palette = Palette::new(entries)?;
                    let colorkey = match alpha {
                        IndexedAlpha::Key(i) => palette.get(i),
                        _ => None,
                    };
                    let mut buffer = PixelBuffer::from_vec(
                        width,
                        height,
                        PixelFormat::Index8,
                        width as usize,
                        indices,
                        Some(palette),
                    )?;
                    buffer.set_colorkey(colorkey);
                    Ok(buffer)
                }
            }
        }
        png::ColorType::Grayscale => {
            let indices = packed_rows(&raw, line_size, width as usize, height, ctx.stop)?;
            PixelBuffer::from_vec(
                width,
                height,
                PixelFormat::Index8,
                width as usize,
                indices,
                Some(Palette::grayscale()),
            )
        }
        png::ColorType::Rgb => {
            let colorkey = match info.trns.as_deref() {
                Some(&[r0, r1, g0, g1, b0, b1]) => Some(if header_is_16(info) {
                    Color::new(r0, g0, b0, 255)
                } else {
                    Color::new(r1, g1, b1, 255)
                }),
                _ => None,
            };
            let rgb = packed_rows(&raw, line_size, width as usize * 3, height, ctx.stop)?;
            let mut buffer = PixelBuffer::from_rgb(width, height, rgb)?;
            buffer.set_colorkey(colorkey);
            Ok(buffer)
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for (y, row) in raw.chunks(line_size).take(height as usize).enumerate() {
                if y % 16 == 0 {
                    ctx.stop.check()?;
                }
                for ga in row[..width as usize * 2].chunks_exact(2) {
                    rgba.extend_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
                }
            }
            PixelBuffer::from_rgba(width, height, rgba)
        }
        png::ColorType::Rgba => {
            let rgba = packed_rows(&raw, line_size, width as usize * 4, height, ctx.stop)?;
            PixelBuffer::from_rgba(width, height, rgba)
        }
    }
}

/// How a palette image's `tRNS` maps onto a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndexedAlpha {
    Opaque,
    /// Exactly one fully transparent entry, every other entry opaque.
    Key(usize),
    /// Partial alpha or several transparent entries; needs RGBA.
    Blended,
}

fn indexed_alpha(trns: &[u8]) -> IndexedAlpha {
    let mut key = None;
    for (i, &a) in trns.iter().enumerate() {
        match a {
            255 => {}
            0 if key.is_none() => key = Some(i),
            _ => return IndexedAlpha::Blended,
        }
    }
    key.map_or(IndexedAlpha::Opaque, IndexedAlpha::Key)
}

fn header_is_16(info: &png::Info<'_>) -> bool {
    info.bit_depth == png::BitDepth::Sixteen
}

/// Copy `row_len` bytes of each line, dropping any line padding.
fn packed_rows(
    raw: &[u8],
    line_size: usize,
    row_len: usize,
    height: u32,
    stop: &dyn Stop,
) -> Result<Vec<u8>, SurfaceError> {
    if line_size == row_len {
        let mut out = raw.to_vec();
        out.truncate(row_len * height as usize);
        return Ok(out);
    }
    let mut out = Vec::with_capacity(row_len * height as usize);
    for (y, row) in raw.chunks(line_size).take(height as usize).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        out.extend_from_slice(&row[..row_len]);
    }
    Ok(out)
}

/// One byte per index, unpacking 1/2/4-bit rows.
fn rows_to_indices(
    raw: &[u8],
    line_size: usize,
    width: u32,
    height: u32,
    depth: usize,
    stop: &dyn Stop,
) -> Result<Vec<u8>, SurfaceError> {
    if depth == 8 {
        return packed_rows(raw, line_size, width as usize, height, stop);
    }
    let w = width as usize;
    let mut out = vec![0u8; w * height as usize];
    for (y, (dst, src)) in out.chunks_exact_mut(w).zip(raw.chunks(line_size)).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        crate::bmp::unpack_indices(depth, src, dst);
    }
    Ok(out)
}

/// Encode a buffer as PNG.
///
/// 8-bit buffers are written as color type 3 with their palette verbatim;
/// with `indexed` set, direct-color buffers are quantized to the 3-3-2
/// palette first. Alpha buffers are written as RGBA, everything else as
/// RGB. The colorkey is written as `tRNS`.
///
/// Palette images can only mark an entry transparent, so an indexed
/// colorkey becomes the first entry equal to it in RGB, or the nearest
/// entry when none is. A quantized buffer's key therefore reads back as
/// its 3-3-2 neighbor.
pub(crate) fn encode(buffer: &PixelBuffer, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, SurfaceError> {
    ctx.stop.check()?;
    if buffer.is_indexed() {
        encode_indexed(buffer, ctx.stop)
    } else if ctx.indexed {
        encode_indexed(&quantize(buffer)?, ctx.stop)
    } else if buffer.has_alpha() {
        encode_truecolor(buffer, png::ColorType::Rgba, ctx.stop)
    } else {
        encode_truecolor(buffer, png::ColorType::Rgb, ctx.stop)
    }
}

fn encode_indexed(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    let palette = buffer
        .palette()
        .ok_or_else(|| SurfaceError::InvalidArgument("8-bit buffer without a palette".into()))?;
    let plte: Vec<u8> = palette.entries().iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    let trns = buffer.colorkey().map(|key| {
        let index = usize::from(palette.nearest(key));
        let mut alpha = vec![255u8; index + 1];
        alpha[index] = 0;
        alpha
    });

    let (width, height) = buffer.size();
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        pixels.extend_from_slice(buffer.row(y));
    }

    let mut output = Vec::new();
    let mut encoder = png::Encoder::new(&mut output, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(plte);
    if let Some(trns) = trns {
        encoder.set_trns(trns);
    }
    write_png(encoder, &pixels)?;
    Ok(output)
}

fn encode_truecolor(
    buffer: &PixelBuffer,
    color: png::ColorType,
    stop: &dyn Stop,
) -> Result<Vec<u8>, SurfaceError> {
    let (width, height) = buffer.size();
    let rgba = color == png::ColorType::Rgba;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * if rgba { 4 } else { 3 });
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        for x in 0..width {
            let c = buffer.color_at(x, y);
            if rgba {
                pixels.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            } else {
                pixels.extend_from_slice(&[c.r, c.g, c.b]);
            }
        }
    }

    let mut output = Vec::new();
    let mut encoder = png::Encoder::new(&mut output, width, height);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    // RGBA images have no colorkey chunk; RGB keys are three 16-bit samples.
    if let (false, Some(key)) = (rgba, buffer.colorkey()) {
        encoder.set_trns(vec![0, key.r, 0, key.g, 0, key.b]);
    }
    write_png(encoder, &pixels)?;
    Ok(output)
}

fn write_png<W: std::io::Write>(encoder: png::Encoder<'_, W>, pixels: &[u8]) -> Result<(), SurfaceError> {
    let mut writer = encoder.write_header().map_err(png_err)?;
    writer.write_image_data(pixels).map_err(png_err)?;
    writer.finish().map_err(png_err)
}
