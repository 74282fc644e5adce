use enough::Stop;

use super::{DESC_TOP_DOWN, FOOTER_SIGNATURE, HEADER_SIZE};
use crate::error::SurfaceError;
use crate::pixel::PixelFormat;
use crate::surface::PixelBuffer;

/// Longest run or literal span one packet can hold.
const MAX_PACKET: usize = 128;

pub(crate) fn encode_tga(buffer: &PixelBuffer, stop: &dyn Stop) -> Result<Vec<u8>, SurfaceError> {
    stop.check()?;
    let (width, height) = buffer.size();
    let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(SurfaceError::DimensionsTooLarge { width, height }),
    };

    let mut header = [0u8; HEADER_SIZE];
    header[12..14].copy_from_slice(&w16.to_le_bytes());
    header[14..16].copy_from_slice(&h16.to_le_bytes());

    let bpp: usize;
    let mut out = Vec::new();
    if let Some(palette) = buffer.palette() {
        bpp = 1;
        header[1] = 1;
        header[2] = 9;
        header[5..7].copy_from_slice(&(palette.len() as u16).to_le_bytes());
        header[7] = 24;
        header[16] = 8;
        header[17] = DESC_TOP_DOWN;
        out.extend_from_slice(&header);
        for c in palette.entries() {
            out.extend_from_slice(&[c.b, c.g, c.r]);
        }
    } else if buffer.has_alpha() {
        bpp = 4;
        header[2] = 10;
        header[16] = 32;
        header[17] = DESC_TOP_DOWN | 8;
        out.extend_from_slice(&header);
    } else {
        bpp = 3;
        header[2] = 10;
        header[16] = 24;
        header[17] = DESC_TOP_DOWN;
        out.extend_from_slice(&header);
    }

    let mut row = Vec::with_capacity(width as usize * bpp);
    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        row.clear();
        file_row(buffer, y, bpp, &mut row);
        rle_row(&row, bpp, &mut out);
    }

    // TGA 2.0 footer: no extension area, no developer directory.
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(FOOTER_SIGNATURE);
    Ok(out)
}

/// Row `y` in TGA byte order: indices, B G R, or B G R A.
fn file_row(buffer: &PixelBuffer, y: u32, bpp: usize, out: &mut Vec<u8>) {
    let native = match bpp {
        1 => true,
        3 => buffer.format() == PixelFormat::Rgb24,
        _ => buffer.format() == PixelFormat::Argb8888,
    };
    if native {
        out.extend_from_slice(buffer.row(y));
        return;
    }
    for x in 0..buffer.width() {
        let c = buffer.color_at(x, y);
        if bpp == 4 {
            out.extend_from_slice(&[c.b, c.g, c.r, c.a]);
        } else {
            out.extend_from_slice(&[c.b, c.g, c.r]);
        }
    }
}

/// Run-length packets for one row. Packets never span rows.
fn rle_row(row: &[u8], bpp: usize, out: &mut Vec<u8>) {
    let pixels: Vec<&[u8]> = row.chunks_exact(bpp).collect();
    let n = pixels.len();
    let run_at = |i: usize| {
        let mut len = 1;
        while i + len < n && len < MAX_PACKET && pixels[i + len] == pixels[i] {
            len += 1;
        }
        len
    };

    let mut i = 0;
    while i < n {
        let run = run_at(i);
        if run >= 2 {
            out.push(0x80 | (run - 1) as u8);
            out.extend_from_slice(pixels[i]);
            i += run;
            continue;
        }
        // Literal span up to the next run of two or more.
        let start = i;
        while i < n && i - start < MAX_PACKET && (i == start || run_at(i) < 2) {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        for px in &pixels[start..i] {
            out.extend_from_slice(px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_literals() {
        let row = [1, 1, 1, 2, 3, 4, 4];
        let mut out = Vec::new();
        rle_row(&row, 1, &mut out);
        assert_eq!(out, [0x82, 1, 0x01, 2, 3, 0x81, 4]);
    }

    #[test]
    fn long_run_splits() {
        let row = [7u8; 130];
        let mut out = Vec::new();
        rle_row(&row, 1, &mut out);
        assert_eq!(out, [0xff, 7, 0x81, 7]);
    }

    #[test]
    fn single_pixel_literal() {
        let mut out = Vec::new();
        rle_row(&[9, 8, 7], 3, &mut out);
        assert_eq!(out, [0x00, 9, 8, 7]);
    }
}
