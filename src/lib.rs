//! # zensurface
//!
//! Mutable 2D pixel buffers with raw channel-layout conversion, and image
//! file I/O with a small always-available codec set plus optional extended
//! codecs.
//!
//! ## Pixel buffers
//!
//! A [`PixelBuffer`] owns `pitch * height` bytes in one of the packed
//! [`PixelFormat`]s. 8-bit buffers are palettized and always carry a
//! [`Palette`]. All pixel access goes through the pitch, so padded rows are
//! handled everywhere.
//!
//! ## Channel layouts
//!
//! [`encode_to_layout`] and [`decode_from_layout`] convert between buffers
//! and raw byte streams named by channel order: any permutation of `RGBA`
//! or `RGB`, `X` filler bytes, a `_PREMULT` suffix for premultiplied alpha,
//! and `P` for palette indices. [`from_raw_buffer`] adopts a byte vector
//! without copying when its layout matches a native format.
//!
//! ## Supported formats
//!
//! | format | `load_basic` | `load_extended` | `save` | `save_extended` |
//! |--------|:---:|:---:|:---:|:---:|
//! | BMP    | yes | yes | yes | |
//! | PNG    |     | yes | yes | yes |
//! | TGA    |     | yes | yes | |
//! | JPEG   |     | yes | extended | yes |
//! | GIF, QOI, PNM (P5/P6), SVG | | yes | | |
//!
//! [`load`] uses the extended codecs when the capability registry reports
//! them and falls back to the BMP decoder otherwise. Formats are identified
//! by content signature first and by name hint second; TGA has no signature
//! and is only found by name.
//!
//! ## Cargo features
//!
//! - `extended` (default): JPEG, GIF, QOI, SVG codecs through `image`,
//!   `rapid-qoi` and `resvg`. Without it the registry reports unavailable.
//! - `imgref`: [`PixelBuffer::to_imgvec`].
//!
//! ## Usage
//!
//! ```no_run
//! use zensurface::{Color, PixelBuffer, PixelFormat};
//!
//! let mut buffer = PixelBuffer::new(64, 64, PixelFormat::Argb8888)?;
//! buffer.fill(Color::new(255, 128, 0, 255));
//! zensurface::save(&buffer, "out.png", None)?;
//!
//! let loaded = zensurface::load("out.png", None)?;
//! let bytes = zensurface::encode_to_layout(&loaded, "RGBA_PREMULT", None)?;
//! # Ok::<(), zensurface::SurfaceError>(())
//! ```
//!
//! ## Credits
//!
//! The BMP and PNM decoders draw from [zune-image](https://github.com/etemesi254/zune-image)
//! by Caleb Etemesi (MIT/Apache-2.0/Zlib licensed).

#![forbid(unsafe_code)]

mod animation;
mod bmp;
pub mod capability;
mod codecs;
mod decode;
mod encode;
mod error;
mod format;
mod layout;
mod limits;
mod palette;
mod pixel;
mod pnm;
mod quantize;
mod source;
mod surface;
mod tga;
mod vector;

// Re-exports
pub use animation::AnimationFrame;
pub use capability::{Capability, Version, extended_version, is_extended_available};
pub use decode::DecodeRequest;
pub use encode::{DEFAULT_QUALITY, EncodeRequest};
pub use enough::{Stop, Unstoppable};
pub use error::{ErrorKind, SurfaceError};
pub use format::ImageFormat;
pub use layout::{
    Channel, ChannelLayout, decode_from_layout, encode_to_layout, from_raw_buffer, premultiply,
};
pub use limits::Limits;
pub use palette::{MAX_PALETTE_ENTRIES, Palette};
pub use pixel::{Color, PixelFormat, PixelFormatDescriptor};
pub use source::{ImageDestination, ImageSource};
pub use surface::{PixelBuffer, SurfaceFlags};
pub use vector::FitBox;

fn request<'a>(source: impl Into<ImageSource<'a>>, name_hint: Option<&'a str>) -> DecodeRequest<'a> {
    let request = DecodeRequest::new(source);
    match name_hint {
        Some(hint) => request.with_name_hint(hint),
        None => request,
    }
}

/// Decode an image, using the extended codecs when available and the basic
/// BMP decoder otherwise.
pub fn load<'a>(
    source: impl Into<ImageSource<'a>>,
    name_hint: Option<&'a str>,
) -> Result<PixelBuffer, SurfaceError> {
    request(source, name_hint).decode(Unstoppable)
}

/// Decode with the always-available BMP decoder only.
pub fn load_basic<'a>(source: impl Into<ImageSource<'a>>) -> Result<PixelBuffer, SurfaceError> {
    DecodeRequest::new(source).decode_basic(Unstoppable)
}

/// Decode with the extended codecs. Fails with
/// [`ErrorKind::CapabilityUnavailable`] when they are absent.
pub fn load_extended<'a>(
    source: impl Into<ImageSource<'a>>,
    name_hint: Option<&'a str>,
) -> Result<PixelBuffer, SurfaceError> {
    request(source, name_hint).decode_extended(Unstoppable)
}

/// Rasterize a vector image to fit inside `size`, preserving aspect ratio.
///
/// `size` is any two-element numeric pair; see [`FitBox`].
pub fn load_sized_vector<'a, S>(
    source: impl Into<ImageSource<'a>>,
    size: S,
) -> Result<PixelBuffer, SurfaceError>
where
    S: TryInto<FitBox, Error = SurfaceError>,
{
    let size = size.try_into()?;
    DecodeRequest::new(source).decode_sized_vector(size, Unstoppable)
}

/// Decode all frames of an animation with their durations in milliseconds.
pub fn load_animation<'a>(
    source: impl Into<ImageSource<'a>>,
    name_hint: Option<&'a str>,
) -> Result<Vec<AnimationFrame>, SurfaceError> {
    request(source, name_hint).decode_animation(Unstoppable)
}

/// Encode `buffer` to `destination`, picking the format from `name_hint`
/// or the destination's file name.
///
/// BMP, TGA and PNG are always available; `png8` writes indexed PNG.
pub fn save<'a>(
    buffer: &PixelBuffer,
    destination: impl Into<ImageDestination<'a>>,
    name_hint: Option<&str>,
) -> Result<(), SurfaceError> {
    let destination = destination.into();
    EncodeRequest::for_destination(&destination, name_hint)?.save(buffer, destination, Unstoppable)
}

/// Encode with the extended encoder subset (PNG, JPEG).
pub fn save_extended<'a>(
    buffer: &PixelBuffer,
    destination: impl Into<ImageDestination<'a>>,
    name_hint: Option<&str>,
) -> Result<(), SurfaceError> {
    let destination = destination.into();
    EncodeRequest::for_destination(&destination, name_hint)?.save_extended(
        buffer,
        destination,
        Unstoppable,
    )
}
