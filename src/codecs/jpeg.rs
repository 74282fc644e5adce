//! JPEG codec adapter using the image crate.

use std::io::Cursor;

use image::ImageDecoder as _;
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};

use crate::decode::DecodeContext;
use crate::encode::EncodeContext;
use crate::error::SurfaceError;
use crate::format::ImageFormat;
use crate::surface::PixelBuffer;

fn jpeg_err(e: image::ImageError) -> SurfaceError {
    SurfaceError::codec(ImageFormat::Jpeg, e)
}

/// Decode JPEG to a 24-bit buffer. Grayscale and CMYK are converted.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let decoder = JpegDecoder::new(Cursor::new(data)).map_err(jpeg_err)?;
    let (width, height) = decoder.dimensions();
    ctx.limits.check_output(width, height, 3)?;
    ctx.stop.check()?;
    let rgb = image::DynamicImage::from_decoder(decoder)
        .map_err(jpeg_err)?
        .into_rgb8();
    PixelBuffer::from_rgb(width, height, rgb.into_raw())
}

/// Encode as baseline JPEG at `ctx.quality`. Alpha is dropped.
pub(crate) fn encode(buffer: &PixelBuffer, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, SurfaceError> {
    ctx.stop.check()?;
    let (width, height) = buffer.size();
    let rgb = buffer.to_rgb();
    ctx.stop.check()?;
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, ctx.quality)
        .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(jpeg_err)?;
    Ok(out)
}
