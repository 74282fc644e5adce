//! Binary PNM: P5 (PGM) and P6 (PPM), 8- and 16-bit.
//!
//! Credits: header parsing draws from [zune-ppm](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).

mod decode;

use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::palette::Palette;
use crate::pixel::PixelFormat;
use crate::surface::PixelBuffer;

/// Which PNM sub-format a header declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PnmKind {
    /// P5, one gray sample per pixel.
    Pgm,
    /// P6, R G B samples.
    Ppm,
}

impl PnmKind {
    fn channels(self) -> usize {
        match self {
            Self::Pgm => 1,
            Self::Ppm => 3,
        }
    }
}

/// Parsed PNM header (internal).
pub(crate) struct PnmHeader {
    pub kind: PnmKind,
    pub width: u32,
    pub height: u32,
    pub maxval: u32,
    pub data_offset: usize,
}

/// Decode P5 to an 8-bit gray-palette buffer, P6 to 24-bit.
///
/// Samples are scaled from `0..=maxval` to `0..=255`; 16-bit samples are
/// big-endian.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    let header = decode::parse_header(data)?;
    let channels = header.kind.channels();
    ctx.limits.check_output(header.width, header.height, channels)?;
    ctx.stop.check()?;

    let pixel_data = data
        .get(header.data_offset..)
        .ok_or(SurfaceError::UnexpectedEof)?;
    let samples = decode::decode_samples(pixel_data, &header, ctx.stop)?;

    match header.kind {
        PnmKind::Pgm => PixelBuffer::from_vec(
            header.width,
            header.height,
            PixelFormat::Index8,
            header.width as usize,
            samples,
            Some(Palette::grayscale()),
        ),
        PnmKind::Ppm => PixelBuffer::from_rgb(header.width, header.height, samples),
    }
}
