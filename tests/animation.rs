#![cfg(feature = "extended")]

use enough::Unstoppable;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use zensurface::*;

fn close(a: Color, b: Color) -> bool {
    a.r.abs_diff(b.r) <= 8 && a.g.abs_diff(b.g) <= 8 && a.b.abs_diff(b.b) <= 8 && a.a == b.a
}

fn gif_with_delays(delays_ms: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for (i, &ms) in delays_ms.iter().enumerate() {
            let shade = (i * 60) as u8;
            let image = RgbaImage::from_pixel(6, 4, Rgba([shade, 255 - shade, 0, 255]));
            let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(ms, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }
    out
}

#[test]
fn gif_frames_and_durations() {
    let delays = [100, 250, 40];
    let gif = gif_with_delays(&delays);
    let frames = load_animation(&gif, None).unwrap();
    assert_eq!(frames.len(), 3);
    for (i, (frame, &ms)) in frames.into_iter().zip(&delays).enumerate() {
        let (buffer, duration) = frame.into_parts();
        assert_eq!(buffer.size(), (6, 4));
        assert!((duration - f64::from(ms)).abs() < 1e-6, "frame {i}: {duration}");
        let shade = (i * 60) as u8;
        let px = buffer.get_pixel(3, 2).unwrap();
        assert!(close(px, Color::new(shade, 255 - shade, 0, 255)), "frame {i}: {px:?}");
    }
}

#[test]
fn gif_still_load_is_first_frame() {
    let gif = gif_with_delays(&[100, 100]);
    let buffer = load(&gif, None).unwrap();
    assert_eq!(buffer.size(), (6, 4));
    assert!(close(buffer.get_pixel(0, 0).unwrap(), Color::new(0, 255, 0, 255)));
}

#[test]
fn still_images_are_one_frame() {
    let mut buffer = PixelBuffer::new(5, 5, PixelFormat::Rgb24).unwrap();
    buffer.fill(Color::new(1, 2, 3, 255));
    for format in [ImageFormat::Bmp, ImageFormat::Png] {
        let bytes = EncodeRequest::new(format).encode(&buffer, Unstoppable).unwrap();
        let frames = load_animation(&bytes, None).unwrap();
        assert_eq!(frames.len(), 1, "{format}");
        let (still, duration) = frames.into_iter().next().unwrap().into_parts();
        assert_eq!(duration, 0.0);
        assert_eq!(still.to_rgba(), buffer.to_rgba());
    }
}
