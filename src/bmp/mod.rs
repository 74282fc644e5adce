//! BMP container: the always-available decoder and an uncompressed encoder.

mod decode;
mod encode;
mod utils;

pub(crate) use utils::unpack_indices;

use crate::decode::DecodeContext;
use crate::encode::EncodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

/// Decode BMP data into a buffer in the closest native format.
///
/// Palettized images (1/2/4/8-bit and RLE) keep their palette as an 8-bit
/// buffer. 16/24/32-bit images map onto the matching packed format when
/// the channel masks allow it and are converted otherwise.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let mut dec = decode::BmpDecoder::new(data);
    dec.read_headers()?;
    ctx.limits
        .check_output(dec.width(), dec.height(), dec.output_format().bytes_per_pixel())?;
    ctx.stop.check()?;
    dec.decode(ctx.stop)
}

/// Encode a buffer as uncompressed BMP.
///
/// 8-bit buffers are written palettized, alpha buffers as 32-bit BGRA,
/// everything else as 24-bit BGR.
pub(crate) fn encode(buffer: &PixelBuffer, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, SurfaceError> {
    encode::encode_bmp(buffer, ctx.stop)
}
