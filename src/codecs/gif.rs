//! GIF codec adapter using the image crate.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder as _, ImageDecoder as _};

use crate::animation::AnimationFrame;
use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::format::ImageFormat;
use crate::surface::PixelBuffer;

fn gif_err(e: image::ImageError) -> SurfaceError {
    SurfaceError::codec(ImageFormat::Gif, e)
}

fn open<'a>(
    data: &'a [u8],
    ctx: &DecodeContext<'_>,
) -> Result<GifDecoder<Cursor<&'a [u8]>>, SurfaceError> {
    let decoder = GifDecoder::new(Cursor::new(data)).map_err(gif_err)?;
    let (width, height) = decoder.dimensions();
    ctx.limits.check_output(width, height, 4)?;
    ctx.stop.check()?;
    Ok(decoder)
}

/// Decode the first frame to a 32-bit buffer.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let decoder = open(data, ctx)?;
    let (width, height) = decoder.dimensions();
    let rgba = image::DynamicImage::from_decoder(decoder)
        .map_err(gif_err)?
        .into_rgba8();
    PixelBuffer::from_rgba(width, height, rgba.into_raw())
}

/// Decode every frame, composited onto the logical screen.
pub(crate) fn decode_frames(
    data: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<Vec<AnimationFrame>, SurfaceError> {
    let decoder = open(data, ctx)?;
    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        ctx.stop.check()?;
        let frame = frame.map_err(gif_err)?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let duration_ms = if denom == 0 {
            0.0
        } else {
            f64::from(numer) / f64::from(denom)
        };
        let image = frame.into_buffer();
        let (width, height) = image.dimensions();
        let buffer = PixelBuffer::from_rgba(width, height, image.into_raw())?;
        frames.push(AnimationFrame::new(buffer, duration_ms));
    }
    tracing::debug!(frames = frames.len(), "decoded GIF animation");
    Ok(frames)
}
