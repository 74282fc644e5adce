//! Truevision TGA: run-length encoder for the basic save set and a decoder
//! for color-mapped, truecolor and grayscale images.
//!
//! TGA has no leading signature; it is picked by name hint or extension.

mod decode;
mod encode;

use crate::decode::DecodeContext;
use crate::encode::EncodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

const HEADER_SIZE: usize = 18;
/// TGA 2.0 footer signature, including the trailing NUL.
const FOOTER_SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

/// Descriptor bit 5: rows stored top to bottom.
const DESC_TOP_DOWN: u8 = 0x20;
/// Descriptor bit 4: pixels stored right to left.
const DESC_RIGHT_TO_LEFT: u8 = 0x10;

/// Decode TGA image types 1, 2, 3 and their RLE variants 9, 10, 11.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let header = decode::TgaHeader::parse(data)?;
    ctx.limits.check_output(
        u32::from(header.width),
        u32::from(header.height),
        header.output_format().bytes_per_pixel(),
    )?;
    ctx.stop.check()?;
    decode::decode_tga(data, &header, ctx.stop)
}

/// Encode as RLE TGA: type 9 with a 24-bit color map for 8-bit buffers,
/// type 10 otherwise (32-bit when the buffer has alpha, else 24-bit).
pub(crate) fn encode(buffer: &PixelBuffer, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, SurfaceError> {
    encode::encode_tga(buffer, ctx.stop)
}
