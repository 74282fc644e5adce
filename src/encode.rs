use enough::Stop;

use crate::capability::{self, Capability};
use crate::error::SurfaceError;
use crate::format::{ImageFormat, parse_hint};
use crate::source::ImageDestination;
use crate::surface::PixelBuffer;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Per-call encoder inputs threaded through every codec.
pub(crate) struct EncodeContext<'a> {
    pub(crate) quality: u8,
    /// Write palettized output, quantizing direct-color buffers.
    pub(crate) indexed: bool,
    pub(crate) stop: &'a dyn Stop,
}

/// Builder for encoding a [`PixelBuffer`] into one container format.
///
/// ```no_run
/// use zensurface::{EncodeRequest, ImageFormat, PixelBuffer, PixelFormat, Unstoppable};
///
/// let buffer = PixelBuffer::new(16, 16, PixelFormat::Rgb24)?;
/// let bytes = EncodeRequest::new(ImageFormat::Jpeg)
///     .with_quality(80)
///     .encode(&buffer, Unstoppable)?;
/// # Ok::<(), zensurface::SurfaceError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    format: ImageFormat,
    indexed: bool,
    quality: u8,
    capability: Option<Capability>,
}

impl EncodeRequest {
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            indexed: false,
            quality: DEFAULT_QUALITY,
            capability: None,
        }
    }

    /// Resolve a file name, extension or format name.
    ///
    /// `png8` selects indexed PNG output.
    pub fn from_name_hint(hint: &str) -> Result<Self, SurfaceError> {
        let (format, indexed) =
            parse_hint(hint).ok_or_else(|| SurfaceError::unsupported_format(hint, "save"))?;
        Ok(Self::new(format).with_indexed(indexed))
    }

    /// Pick the format from an explicit hint, else from the destination's
    /// file name. A writer without a hint has no name to go on.
    pub(crate) fn for_destination(
        destination: &ImageDestination<'_>,
        hint: Option<&str>,
    ) -> Result<Self, SurfaceError> {
        match hint {
            Some(hint) => Self::from_name_hint(hint),
            None => match destination.name() {
                Some(name) => Self::from_name_hint(&name),
                None => Err(SurfaceError::unsupported_format("unknown", "save")),
            },
        }
    }

    /// JPEG quality, clamped to 1..=100. Ignored by lossless formats.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Palettized output for formats that support it (PNG).
    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Use this capability snapshot instead of the process-wide registry.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Encode with the `save` format set: the basic encoders, plus extended
    /// encoders when the capability is present.
    pub fn encode(&self, buffer: &PixelBuffer, stop: impl Stop) -> Result<Vec<u8>, SurfaceError> {
        let entry = self.format.entry();
        if !entry.basic_encode {
            if !entry.extended_encode {
                return Err(SurfaceError::unsupported_format(self.format, "save"));
            }
            self.capability().require(entry.encode_min, "save")?;
        }
        self.run(buffer, &stop, "save")
    }

    /// Encode with the extended encoder subset only.
    pub fn encode_extended(&self, buffer: &PixelBuffer, stop: impl Stop) -> Result<Vec<u8>, SurfaceError> {
        let entry = self.format.entry();
        if !entry.extended_encode {
            return Err(SurfaceError::unsupported_format(self.format, "save_extended"));
        }
        self.capability().require(entry.encode_min, "save_extended")?;
        self.run(buffer, &stop, "save_extended")
    }

    /// [`encode`](Self::encode) and write the result to `destination`.
    ///
    /// Nothing is written unless encoding succeeds.
    pub fn save<'d>(
        &self,
        buffer: &PixelBuffer,
        destination: impl Into<ImageDestination<'d>>,
        stop: impl Stop,
    ) -> Result<(), SurfaceError> {
        let bytes = self.encode(buffer, stop)?;
        destination.into().write_all(&bytes)
    }

    /// [`encode_extended`](Self::encode_extended) and write the result to `destination`.
    pub fn save_extended<'d>(
        &self,
        buffer: &PixelBuffer,
        destination: impl Into<ImageDestination<'d>>,
        stop: impl Stop,
    ) -> Result<(), SurfaceError> {
        let bytes = self.encode_extended(buffer, stop)?;
        destination.into().write_all(&bytes)
    }

    fn capability(&self) -> Capability {
        self.capability.unwrap_or_else(capability::snapshot)
    }

    fn run(&self, buffer: &PixelBuffer, stop: &dyn Stop, operation: &'static str) -> Result<Vec<u8>, SurfaceError> {
        let encode = self
            .format
            .entry()
            .encode
            .ok_or_else(|| SurfaceError::unsupported_format(self.format, operation))?;
        let ctx = EncodeContext {
            quality: self.quality,
            indexed: self.indexed,
            stop,
        };
        encode(buffer, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn hint_resolution() {
        let req = EncodeRequest::from_name_hint("out.png8").unwrap();
        assert_eq!(req.format(), ImageFormat::Png);
        assert!(req.indexed);
        let err = EncodeRequest::from_name_hint("out.xyz").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn writer_needs_hint() {
        let mut sink = Vec::new();
        let dest = ImageDestination::from(&mut sink);
        let err = EncodeRequest::for_destination(&dest, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        let req = EncodeRequest::for_destination(&dest, Some("tga")).unwrap();
        assert_eq!(req.format(), ImageFormat::Tga);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(EncodeRequest::new(ImageFormat::Jpeg).with_quality(0).quality, 1);
        assert_eq!(EncodeRequest::new(ImageFormat::Jpeg).with_quality(200).quality, 100);
    }

    #[test]
    fn extended_subset_excludes_basic_containers() {
        let buffer = PixelBuffer::new(2, 2, crate::PixelFormat::Rgb24).unwrap();
        for format in [ImageFormat::Bmp, ImageFormat::Tga, ImageFormat::Gif] {
            let err = EncodeRequest::new(format)
                .encode_extended(&buffer, enough::Unstoppable)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat, "{format}");
        }
    }
}
