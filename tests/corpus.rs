//! Test corpus: roundtrips with various patterns, sizes, pitches and containers.

use enough::Unstoppable;
use zensurface::*;

fn checkerboard(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    for y in 0..h {
        for x in 0..w {
            let off = (y * w + x) * bpp;
            if (x + y) % 2 == 0 {
                for c in 0..bpp {
                    pixels[off + c] = 200 + (c as u8 * 20);
                }
            } else {
                for c in 0..bpp {
                    pixels[off + c] = 10 + (c as u8 * 30);
                }
            }
        }
    }
    pixels
}

fn noise_pattern(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    let mut state: u32 = 0xDEAD_BEEF;
    for p in pixels.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *p = state as u8;
    }
    pixels
}

fn buffer(pixels: &[u8], w: u32, h: u32, layout: &str) -> PixelBuffer {
    decode_from_layout(pixels, w, h, layout, None).unwrap()
}

fn roundtrip(format: ImageFormat, source: &PixelBuffer) -> PixelBuffer {
    let encoded = EncodeRequest::new(format).encode(source, Unstoppable).unwrap();
    let hint = format.to_string();
    DecodeRequest::new(&encoded)
        .with_name_hint(&hint)
        .decode(Unstoppable)
        .unwrap()
}

fn lossless_formats() -> &'static [ImageFormat] {
    if cfg!(feature = "extended") {
        &[ImageFormat::Bmp, ImageFormat::Tga, ImageFormat::Png]
    } else {
        &[ImageFormat::Bmp]
    }
}

// ── Patterns ─────────────────────────────────────────────────────────

#[test]
fn checkerboard_rgb_all_containers() {
    let source = buffer(&checkerboard(8, 6, 3), 8, 6, "RGB");
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &source);
        assert_eq!(decoded.to_rgb(), source.to_rgb(), "{format}");
    }
}

#[test]
fn noise_rgba_all_containers() {
    let source = buffer(&noise_pattern(13, 9, 4), 13, 9, "RGBA");
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &source);
        assert!(decoded.has_alpha(), "{format}");
        assert_eq!(decoded.to_rgba(), source.to_rgba(), "{format}");
    }
}

#[test]
fn noise_indexed_all_containers() {
    let mut source = buffer(&noise_pattern(11, 7, 1), 11, 7, "P");
    let colors: Vec<Color> = noise_pattern(256, 1, 3)
        .chunks_exact(3)
        .map(|c| Color::new(c[0], c[1], c[2], 255))
        .collect();
    source.set_palette(&colors).unwrap();
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &source);
        assert!(decoded.is_indexed(), "{format}");
        assert_eq!(decoded.to_rgba(), source.to_rgba(), "{format}");
    }
}

#[test]
fn bgrx_source_drops_filler() {
    let source = buffer(&noise_pattern(5, 5, 4), 5, 5, "BGRX");
    assert!(!source.has_alpha());
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &source);
        assert!(!decoded.has_alpha(), "{format}");
        assert_eq!(decoded.to_rgb(), source.to_rgb(), "{format}");
    }
}

// ── Pitch ────────────────────────────────────────────────────────────

#[test]
fn padded_source_encodes_like_tight() {
    let pixels = noise_pattern(7, 4, 3);
    let mut padded_bytes = vec![0xAAu8; 32 * 4];
    for y in 0..4 {
        padded_bytes[y * 32..y * 32 + 21].copy_from_slice(&pixels[y * 21..(y + 1) * 21]);
    }
    let tight = from_raw_buffer(pixels, (7, 4), "RGB", None).unwrap();
    let padded = from_raw_buffer(padded_bytes, (7, 4), "RGB", Some(32)).unwrap();
    assert_eq!(padded.pitch(), 32);
    for &format in lossless_formats() {
        let a = EncodeRequest::new(format).encode(&tight, Unstoppable).unwrap();
        let b = EncodeRequest::new(format).encode(&padded, Unstoppable).unwrap();
        assert_eq!(a, b, "{format}");
    }
}

#[test]
fn adopted_buffer_with_wide_pitch() {
    let bytes = noise_pattern(24, 3, 1);
    let adopted = from_raw_buffer(bytes, (5, 3), "BGRA", Some(24)).unwrap();
    assert_eq!(adopted.pitch(), 24);
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &adopted);
        assert_eq!(decoded.to_rgba(), adopted.to_rgba(), "{format}");
    }
}

// ── Edge cases ───────────────────────────────────────────────────────

#[test]
fn single_pixel() {
    let source = buffer(&[255, 0, 128], 1, 1, "RGB");
    for &format in lossless_formats() {
        let decoded = roundtrip(format, &source);
        assert_eq!(decoded.get_pixel(0, 0).unwrap(), Color::new(255, 0, 128, 255));
    }
}

#[test]
fn wide_and_tall() {
    let wide = buffer(&noise_pattern(1000, 1, 3), 1000, 1, "RGB");
    let tall = buffer(&noise_pattern(1, 1000, 3), 1, 1000, "RGB");
    for &format in lossless_formats() {
        assert_eq!(roundtrip(format, &wide).to_rgb(), wide.to_rgb(), "{format}");
        assert_eq!(roundtrip(format, &tall).to_rgb(), tall.to_rgb(), "{format}");
    }
}

#[test]
fn bmp_odd_width_padding() {
    for w in 1..=5u32 {
        let source = buffer(&noise_pattern(w as usize, 3, 3), w, 3, "RGB");
        let decoded = roundtrip(ImageFormat::Bmp, &source);
        assert_eq!(decoded.to_rgb(), source.to_rgb(), "width {w}");
    }
}

#[test]
fn tga_long_runs_compress() {
    let source = buffer(&[7u8; 300 * 2 * 3], 300, 2, "RGB");
    let encoded = EncodeRequest::new(ImageFormat::Tga)
        .encode(&source, Unstoppable)
        .unwrap();
    assert!(encoded.len() < 100);
    if cfg!(feature = "extended") {
        assert_eq!(roundtrip(ImageFormat::Tga, &source).to_rgb(), source.to_rgb());
    }
}

#[cfg(feature = "extended")]
#[test]
fn pnm_comments_and_low_maxval() {
    let data = b"P5\n# first\n3 # width\n1\n# maxval next\n1\n\x00\x01\x01";
    let decoded = load(&data[..], None).unwrap();
    assert_eq!(decoded.row(0), &[0, 255, 255]);

    let data = b"P6 1 1 15 \x0f\x00\x07";
    let decoded = load(&data[..], None).unwrap();
    assert_eq!(decoded.get_pixel(0, 0).unwrap(), Color::new(255, 0, 119, 255));
}

#[cfg(feature = "extended")]
#[test]
fn pnm_truncated() {
    let err = load(&b"P6\n4 4\n255\n\x01\x02"[..], None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

// ── Limits ───────────────────────────────────────────────────────────

fn encoded_bmp() -> Vec<u8> {
    let source = buffer(&checkerboard(2, 2, 3), 2, 2, "RGB");
    EncodeRequest::new(ImageFormat::Bmp)
        .encode(&source, Unstoppable)
        .unwrap()
}

#[test]
fn limits_max_width() {
    let limits = Limits {
        max_width: Some(1),
        ..Default::default()
    };
    let err = DecodeRequest::new(&encoded_bmp())
        .with_limits(&limits)
        .decode(Unstoppable)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
}

#[test]
fn limits_max_height() {
    let limits = Limits {
        max_height: Some(1),
        ..Default::default()
    };
    let err = DecodeRequest::new(&encoded_bmp())
        .with_limits(&limits)
        .decode_basic(Unstoppable)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
}

#[test]
fn limits_max_memory() {
    let limits = Limits {
        max_memory_bytes: Some(1),
        ..Default::default()
    };
    assert!(
        DecodeRequest::new(&encoded_bmp())
            .with_limits(&limits)
            .decode(Unstoppable)
            .is_err()
    );
}
