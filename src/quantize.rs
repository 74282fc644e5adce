//! Fixed-palette quantization for indexed output.

use crate::error::SurfaceError;
use crate::pixel::{Color, PixelFormat};
use crate::surface::PixelBuffer;

/// Index of `c` in [`Palette::rgb332`](crate::palette::Palette::rgb332).
///
/// The palette is a separable 8x8x4 grid, so rounding each channel to its
/// nearest level independently picks the Euclidean nearest entry.
pub(crate) fn rgb332_index(c: Color) -> u8 {
    let r = (u32::from(c.r) * 7 + 127) / 255;
    let g = (u32::from(c.g) * 7 + 127) / 255;
    let b = (u32::from(c.b) * 3 + 127) / 255;
    ((r << 5) | (g << 2) | b) as u8
}

/// Map a buffer onto the 3-3-2 palette as a new 8-bit buffer.
///
/// Deterministic: identical inputs produce identical indices. Alpha is
/// dropped; colorkey and per-surface alpha carry over. The source is
/// untouched.
pub(crate) fn quantize(buffer: &PixelBuffer) -> Result<PixelBuffer, SurfaceError> {
    let (width, height) = buffer.size();
    let pitch = width as usize;
    let mut data = Vec::with_capacity(pitch * height as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(rgb332_index(buffer.color_at(x, y)));
        }
    }
    let mut out = PixelBuffer::from_vec(width, height, PixelFormat::Index8, pitch, data, None)?;
    out.set_colorkey(buffer.colorkey());
    out.set_alpha(buffer.alpha());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    #[test]
    fn matches_euclidean_nearest() {
        let palette = Palette::rgb332();
        for v in (0u16..=255).step_by(5) {
            let v = v as u8;
            for c in [
                Color::new(v, 0, 0, 255),
                Color::new(0, v, 0, 255),
                Color::new(0, 0, v, 255),
                Color::new(v, 255 - v, v / 2, 255),
            ] {
                let idx = rgb332_index(c);
                let expected = palette.get(palette.nearest(c) as usize).unwrap();
                let got = palette.get(idx as usize).unwrap();
                let dist = |e: Color| {
                    let d = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2);
                    d(e.r, c.r) + d(e.g, c.g) + d(e.b, c.b)
                };
                assert_eq!(dist(got), dist(expected), "{c:?}");
            }
        }
    }

    #[test]
    fn corners_are_exact() {
        assert_eq!(rgb332_index(Color::new(0, 0, 0, 255)), 0);
        assert_eq!(rgb332_index(Color::new(255, 255, 255, 255)), 255);
        assert_eq!(rgb332_index(Color::new(255, 0, 0, 255)), 0b1110_0000);
    }

    #[test]
    fn quantize_keeps_state_and_source() {
        let mut src = PixelBuffer::new(3, 2, PixelFormat::Argb8888).unwrap();
        src.fill(Color::new(10, 200, 90, 128));
        src.set_colorkey(Some(Color::new(1, 2, 3, 255)));
        let before = src.data().to_vec();
        let q = quantize(&src).unwrap();
        assert_eq!(q.format(), PixelFormat::Index8);
        assert_eq!(q.colorkey(), src.colorkey());
        assert_eq!(src.data(), &before[..]);
        let first = q.row(0)[0];
        assert!(q.data().iter().all(|&i| i == first));
        assert_eq!(quantize(&src).unwrap().data(), q.data());
    }
}
