//! Channel layout conversion: permutations, padding, premultiplication.

use zensurface::*;

fn permutations(letters: &[char]) -> Vec<String> {
    if letters.len() == 1 {
        return vec![letters[0].to_string()];
    }
    let mut out = Vec::new();
    for i in 0..letters.len() {
        let mut rest = letters.to_vec();
        let first = rest.remove(i);
        for tail in permutations(&rest) {
            out.push(format!("{first}{tail}"));
        }
    }
    out
}

fn noise_buffer(width: u32, height: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height, PixelFormat::Argb8888).unwrap();
    let mut state: u32 = 0xDEAD_BEEF;
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, a] = state.to_le_bytes();
            buffer.set_pixel(x, y, Color::new(r, g, b, a)).unwrap();
        }
    }
    buffer
}

#[test]
fn four_channel_permutations_are_lossless() {
    let names = permutations(&['R', 'G', 'B', 'A']);
    assert_eq!(names.len(), 24);
    let buffer = noise_buffer(7, 5);
    for a in &names {
        let reference = decode_from_layout(&encode_to_layout(&buffer, a, None).unwrap(), 7, 5, a, None)
            .unwrap();
        assert_eq!(reference.to_rgba(), buffer.to_rgba(), "{a}");
        for b in &names {
            let via_b = encode_to_layout(&buffer, b, None).unwrap();
            let back = decode_from_layout(&via_b, 7, 5, b, None).unwrap();
            let again = decode_from_layout(&encode_to_layout(&back, a, None).unwrap(), 7, 5, a, None)
                .unwrap();
            assert_eq!(again.to_rgba(), reference.to_rgba(), "{a} via {b}");
        }
    }
}

#[test]
fn three_channel_permutations() {
    let buffer = noise_buffer(4, 3);
    let names = permutations(&['R', 'G', 'B']);
    assert_eq!(names.len(), 6);
    for name in &names {
        let bytes = encode_to_layout(&buffer, name, None).unwrap();
        assert_eq!(bytes.len(), 4 * 3 * 3);
        let decoded = decode_from_layout(&bytes, 4, 3, name, None).unwrap();
        assert_eq!(decoded.to_rgb(), buffer.to_rgb(), "{name}");
        assert!(!decoded.has_alpha());
    }
}

#[test]
fn byte_order_follows_name() {
    let mut buffer = PixelBuffer::new(1, 1, PixelFormat::Rgba8888).unwrap();
    buffer.fill(Color::new(1, 2, 3, 4));
    assert_eq!(encode_to_layout(&buffer, "RGBA", None).unwrap(), [1, 2, 3, 4]);
    assert_eq!(encode_to_layout(&buffer, "ARGB", None).unwrap(), [4, 1, 2, 3]);
    assert_eq!(encode_to_layout(&buffer, "BGR", None).unwrap(), [3, 2, 1]);
    assert_eq!(encode_to_layout(&buffer, "XBGR", None).unwrap(), [255, 3, 2, 1]);
}

#[test]
fn pitch_invariance() {
    let buffer = noise_buffer(5, 4);
    for name in ["RGBA", "BGR", "XRGB", "P"] {
        let source = if name == "P" {
            let mut p = PixelBuffer::new(5, 4, PixelFormat::Index8).unwrap();
            for y in 0..4 {
                p.row_mut(y).copy_from_slice(&[0, 1, 2, 3, 4]);
            }
            p
        } else {
            buffer.clone()
        };
        let row = 5 * ChannelLayout::parse(name).unwrap().channel_count();
        let tight = encode_to_layout(&source, name, None).unwrap();
        let padded = encode_to_layout(&source, name, Some(row + 7)).unwrap();
        assert_eq!(padded.len(), (row + 7) * 4);
        for y in 0..4 {
            let pad = &padded[y * (row + 7) + row..(y + 1) * (row + 7)];
            assert!(pad.iter().all(|&b| b == 0), "{name} padding");
        }
        let a = decode_from_layout(&tight, 5, 4, name, None).unwrap();
        let b = decode_from_layout(&padded, 5, 4, name, Some(row + 7)).unwrap();
        assert_eq!(a.data(), &b.data()[..], "{name}");
    }
}

#[test]
fn pitch_smaller_than_row_is_configuration_error() {
    let buffer = noise_buffer(5, 2);
    let err = encode_to_layout(&buffer, "RGBA", Some(19)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let err = decode_from_layout(&[0; 64], 5, 2, "RGBA", Some(8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn premultiplied_encode() {
    let mut buffer = PixelBuffer::new(2, 1, PixelFormat::Argb8888).unwrap();
    buffer.set_pixel(0, 0, Color::new(254, 255, 0, 200)).unwrap();
    buffer.set_pixel(1, 0, Color::new(10, 20, 30, 255)).unwrap();
    let bytes = encode_to_layout(&buffer, "RGBA_PREMULT", None).unwrap();
    assert_eq!(bytes, [199, 200, 0, 200, 10, 20, 30, 255]);
    // Decoding keeps the stored values.
    let decoded = decode_from_layout(&bytes, 2, 1, "RGBA_PREMULT", None).unwrap();
    assert_eq!(decoded.get_pixel(0, 0).unwrap(), Color::new(199, 200, 0, 200));
}

#[test]
fn premultiplied_needs_alpha() {
    let buffer = PixelBuffer::new(2, 2, PixelFormat::Rgb24).unwrap();
    let err = encode_to_layout(&buffer, "ARGB_PREMULT", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedLayout);
    // Plain alpha layouts write opaque alpha.
    assert_eq!(encode_to_layout(&buffer, "RGBA", None).unwrap()[3], 255);
}

#[test]
fn indexed_layout_rules() {
    let direct = noise_buffer(2, 2);
    let err = encode_to_layout(&direct, "P", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedLayout);

    let decoded = decode_from_layout(&[3, 1, 4, 1], 2, 2, "P", None).unwrap();
    assert!(decoded.is_indexed());
    assert_eq!(decoded.palette_at(4).unwrap(), Color::new(0, 0, 0, 255));
    assert_eq!(encode_to_layout(&decoded, "P", None).unwrap(), [3, 1, 4, 1]);
}

#[test]
fn unknown_layout_and_short_input() {
    let buffer = noise_buffer(2, 2);
    assert_eq!(
        encode_to_layout(&buffer, "CMYK", None).unwrap_err().kind(),
        ErrorKind::UnsupportedLayout
    );
    let err = decode_from_layout(&[0; 15], 2, 2, "RGBA", None).unwrap_err();
    assert!(matches!(err, SurfaceError::BufferTooSmall { needed: 16, actual: 15 }));
}

#[test]
fn raw_buffer_adoption() {
    let bytes: Vec<u8> = (0..2 * 20).map(|i| i as u8).collect();
    let ptr = bytes.as_ptr();
    let buffer = from_raw_buffer(bytes, (4, 2), "BGRA", Some(20)).unwrap();
    assert_eq!(buffer.format(), PixelFormat::Argb8888);
    assert_eq!(buffer.pitch(), 20);
    assert_eq!(buffer.data().as_ptr(), ptr);
    assert_eq!(buffer.get_pixel(1, 1).unwrap(), Color::new(26, 25, 24, 27));

    // Non-native orders are converted.
    let converted = from_raw_buffer(vec![1, 2, 3, 9, 8, 7], (2, 1), "GBR", None).unwrap();
    assert_eq!(converted.get_pixel(0, 0).unwrap(), Color::new(3, 1, 2, 255));
}
