#![cfg(feature = "extended")]

use enough::Unstoppable;
use zensurface::*;

const SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <rect width="100" height="100" fill="#ff0000"/>
</svg>"##;

const WIDE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="50">
  <rect width="200" height="50" fill="#0000ff"/>
</svg>"##;

#[test]
fn native_size_load() {
    let buffer = load(SQUARE, None).unwrap();
    assert_eq!(buffer.size(), (100, 100));
    assert_eq!(buffer.get_pixel(50, 50).unwrap(), Color::new(255, 0, 0, 255));
}

#[test]
fn exact_box() {
    let buffer = load_sized_vector(SQUARE, (10, 10)).unwrap();
    assert_eq!(buffer.size(), (10, 10));
    assert_eq!(buffer.get_pixel(5, 5).unwrap(), Color::new(255, 0, 0, 255));
}

#[test]
fn aspect_is_preserved() {
    let buffer = load_sized_vector(SQUARE, (1000, 30)).unwrap();
    assert_eq!(buffer.size(), (30, 30));

    let buffer = load_sized_vector(WIDE, [400.0f32, 400.0]).unwrap();
    assert_eq!(buffer.size(), (400, 100));

    let buffer = load_sized_vector(WIDE, &[40i32, 1000][..]).unwrap();
    assert_eq!(buffer.size(), (40, 10));
}

#[test]
fn bad_boxes() {
    let err = load_sized_vector(SQUARE, (100, 0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDimension);
    let err = load_sized_vector(SQUARE, (-5, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDimension);
    let err = load_sized_vector(SQUARE, &[1.0f32, 2.0, 3.0][..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = load_sized_vector(SQUARE, (f32::NAN, 1.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn raster_sources_are_rejected() {
    let buffer = PixelBuffer::new(2, 2, PixelFormat::Rgb24).unwrap();
    let bmp = EncodeRequest::new(ImageFormat::Bmp)
        .encode(&buffer, Unstoppable)
        .unwrap();
    let err = load_sized_vector(&bmp, (10, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn sized_vector_needs_capability() {
    let err = DecodeRequest::new(SQUARE)
        .with_capability(Capability::unavailable())
        .decode_sized_vector(FitBox::new(10, 10).unwrap(), Unstoppable)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
}
