//! QOI codec adapter using rapid-qoi.

use rapid_qoi::Qoi;

use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

fn qoi_err(e: rapid_qoi::DecodeError) -> SurfaceError {
    SurfaceError::InvalidData(format!("QOI: {e:?}"))
}

/// Decode QOI to a 24-bit or 32-bit buffer, matching the header's channels.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let header = Qoi::decode_header(data).map_err(qoi_err)?;
    let channels = if header.colors.has_alpha() { 4 } else { 3 };
    ctx.limits
        .check_output(header.width, header.height, channels)?;
    ctx.stop.check()?;
    let (qoi, pixels) = Qoi::decode_alloc(data).map_err(qoi_err)?;
    if qoi.colors.has_alpha() {
        PixelBuffer::from_rgba(qoi.width, qoi.height, pixels)
    } else {
        PixelBuffer::from_rgb(qoi.width, qoi.height, pixels)
    }
}
