//! Codec adapters over third-party codec crates.
//!
//! Each module is a thin adapter between this crate's `PixelBuffer` and the
//! codec crate's own pixel types. PNG is always compiled because PNG output
//! belongs to the basic save set; the rest come with the `extended` feature.

pub(crate) mod png;

#[cfg(feature = "extended")]
pub(crate) mod gif;

#[cfg(feature = "extended")]
pub(crate) mod jpeg;

#[cfg(feature = "extended")]
pub(crate) mod qoi;

#[cfg(feature = "extended")]
pub(crate) mod svg;

/// Entry points of feature-gated codecs, `None` when compiled out.
#[cfg(feature = "extended")]
pub(crate) mod table {
    use crate::animation::FramesFn;
    use crate::format::{DecodeFn, EncodeFn};
    use crate::vector::RenderFn;

    pub(crate) const JPEG_DECODE: Option<DecodeFn> = Some(super::jpeg::decode);
    pub(crate) const JPEG_ENCODE: Option<EncodeFn> = Some(super::jpeg::encode);
    pub(crate) const GIF_DECODE: Option<DecodeFn> = Some(super::gif::decode);
    pub(crate) const GIF_FRAMES: Option<FramesFn> = Some(super::gif::decode_frames);
    pub(crate) const QOI_DECODE: Option<DecodeFn> = Some(super::qoi::decode);
    pub(crate) const SVG_DECODE: Option<DecodeFn> = Some(super::svg::decode);
    pub(crate) const SVG_RENDER: Option<RenderFn> = Some(super::svg::render);
}

#[cfg(not(feature = "extended"))]
pub(crate) mod table {
    use crate::animation::FramesFn;
    use crate::format::{DecodeFn, EncodeFn};
    use crate::vector::RenderFn;

    pub(crate) const JPEG_DECODE: Option<DecodeFn> = None;
    pub(crate) const JPEG_ENCODE: Option<EncodeFn> = None;
    pub(crate) const GIF_DECODE: Option<DecodeFn> = None;
    pub(crate) const GIF_FRAMES: Option<FramesFn> = None;
    pub(crate) const QOI_DECODE: Option<DecodeFn> = None;
    pub(crate) const SVG_DECODE: Option<DecodeFn> = None;
    pub(crate) const SVG_RENDER: Option<RenderFn> = None;
}
