use std::borrow::Cow;

use enough::Stop;

use crate::animation::AnimationFrame;
use crate::capability::{self, ANIMATION_MIN_VERSION, Capability, SIZED_VECTOR_MIN_VERSION};
use crate::codecs::table;
use crate::error::SurfaceError;
use crate::format::{ImageFormat, parse_hint};
use crate::limits::Limits;
use crate::source::ImageSource;
use crate::surface::PixelBuffer;
use crate::vector::FitBox;

/// Per-call decoder inputs threaded through every codec.
pub(crate) struct DecodeContext<'a> {
    pub(crate) limits: &'a Limits,
    pub(crate) stop: &'a dyn Stop,
}

/// Builder for decoding one encoded image.
///
/// ```no_run
/// use zensurface::{DecodeRequest, Unstoppable};
///
/// let buffer = DecodeRequest::new("sprite.tga")
///     .with_name_hint("tga")
///     .decode(Unstoppable)?;
/// println!("{}x{} {}", buffer.width(), buffer.height(), buffer.format());
/// # Ok::<(), zensurface::SurfaceError>(())
/// ```
pub struct DecodeRequest<'a> {
    source: ImageSource<'a>,
    name_hint: Option<&'a str>,
    limits: Option<&'a Limits>,
    capability: Option<Capability>,
}

/// Bytes read from the source plus everything needed to dispatch them.
struct Loaded<'a> {
    data: Cow<'a, [u8]>,
    hint: Option<String>,
    limits: Limits,
    capability: Capability,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(source: impl Into<ImageSource<'a>>) -> Self {
        Self {
            source: source.into(),
            name_hint: None,
            limits: None,
            capability: None,
        }
    }

    /// File name, extension or format name used when the content has no
    /// recognizable signature. Overrides the name of a path source.
    pub fn with_name_hint(mut self, hint: &'a str) -> Self {
        self.name_hint = Some(hint);
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Use this capability snapshot instead of the process-wide registry.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Decode with the extended codecs, falling back to the basic BMP
    /// decoder when they are unavailable.
    pub fn decode(self, stop: impl Stop) -> Result<PixelBuffer, SurfaceError> {
        let loaded = self.load()?;
        if loaded.capability.is_available() {
            return loaded.decode_extended(&stop, "load");
        }
        tracing::debug!("extended codecs unavailable, falling back to basic decoder");
        if ImageFormat::detect(&loaded.data) == Some(ImageFormat::Bmp) {
            return loaded.decode_basic(&stop);
        }
        let required = loaded
            .identify()
            .map(|f| f.entry().decode_min)
            .unwrap_or(capability::EXTENDED_MIN_VERSION);
        Err(SurfaceError::CapabilityUnavailable {
            operation: "load",
            required,
            available: loaded.capability.version(),
        })
    }

    /// Decode with the always-available BMP decoder only.
    pub fn decode_basic(self, stop: impl Stop) -> Result<PixelBuffer, SurfaceError> {
        self.load()?.decode_basic(&stop)
    }

    /// Decode with the extended codec set.
    pub fn decode_extended(self, stop: impl Stop) -> Result<PixelBuffer, SurfaceError> {
        let loaded = self.load()?;
        loaded
            .capability
            .require(capability::EXTENDED_MIN_VERSION, "load_extended")?;
        loaded.decode_extended(&stop, "load_extended")
    }

    /// Rasterize a vector image to fit inside `size`, keeping its aspect ratio.
    pub fn decode_sized_vector(self, size: FitBox, stop: impl Stop) -> Result<PixelBuffer, SurfaceError> {
        let loaded = self.load()?;
        loaded
            .capability
            .require(SIZED_VECTOR_MIN_VERSION, "load_sized_vector")?;
        let format = loaded.identify()?;
        let render = match (format, table::SVG_RENDER) {
            (ImageFormat::Svg, Some(render)) => render,
            _ => return Err(SurfaceError::unsupported_format(format, "load_sized_vector")),
        };
        render(&loaded.data, Some(size), &loaded.context(&stop))
    }

    /// Decode every frame with its display duration.
    ///
    /// Still images yield a single frame with a zero duration.
    pub fn decode_animation(self, stop: impl Stop) -> Result<Vec<AnimationFrame>, SurfaceError> {
        let loaded = self.load()?;
        loaded
            .capability
            .require(ANIMATION_MIN_VERSION, "load_animation")?;
        let format = loaded.identify()?;
        if let (ImageFormat::Gif, Some(frames)) = (format, table::GIF_FRAMES) {
            return frames(&loaded.data, &loaded.context(&stop));
        }
        let buffer = loaded.decode_format(format, &stop, "load_animation")?;
        Ok(vec![AnimationFrame::still(buffer)])
    }

    fn load(self) -> Result<Loaded<'a>, SurfaceError> {
        let hint = match self.name_hint {
            Some(h) => Some(h.to_string()),
            None => self.source.name(),
        };
        let limits = self.limits.cloned().unwrap_or_default();
        let capability = self.capability.unwrap_or_else(capability::snapshot);
        let data = self.source.read_all()?;
        Ok(Loaded {
            data,
            hint,
            limits,
            capability,
        })
    }
}

impl Loaded<'_> {
    fn context<'s>(&'s self, stop: &'s dyn Stop) -> DecodeContext<'s> {
        DecodeContext {
            limits: &self.limits,
            stop,
        }
    }

    /// Content signature first, name hint second.
    fn identify(&self) -> Result<ImageFormat, SurfaceError> {
        if let Some(format) = ImageFormat::detect(&self.data) {
            tracing::debug!(%format, "format identified by signature");
            return Ok(format);
        }
        let hinted = self.hint.as_deref().and_then(parse_hint).map(|(f, _)| f);
        match hinted {
            Some(format) => {
                tracing::debug!(%format, hint = ?self.hint, "format taken from name hint");
                Ok(format)
            }
            None => Err(SurfaceError::UnrecognizedFormat),
        }
    }

    fn decode_basic(&self, stop: &dyn Stop) -> Result<PixelBuffer, SurfaceError> {
        crate::bmp::decode(&self.data, &self.context(stop))
    }

    fn decode_extended(&self, stop: &dyn Stop, operation: &'static str) -> Result<PixelBuffer, SurfaceError> {
        let format = self.identify()?;
        self.decode_format(format, stop, operation)
    }

    fn decode_format(
        &self,
        format: ImageFormat,
        stop: &dyn Stop,
        operation: &'static str,
    ) -> Result<PixelBuffer, SurfaceError> {
        let entry = format.entry();
        self.capability.require(entry.decode_min, operation)?;
        let decode = entry
            .decode
            .ok_or_else(|| SurfaceError::unsupported_format(format, operation))?;
        decode(&self.data, &self.context(stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let data = b"BM";
        let limits = Limits::default();
        let request = DecodeRequest::new(&data[..])
            .with_name_hint("x.bmp")
            .with_limits(&limits)
            .with_capability(Capability::unavailable());
        assert_eq!(request.name_hint, Some("x.bmp"));
        assert_eq!(request.capability, Some(Capability::unavailable()));
    }

    #[test]
    fn unavailable_extended_is_capability_error() {
        let result = DecodeRequest::new(&b"not an image"[..])
            .with_capability(Capability::unavailable())
            .decode_extended(enough::Unstoppable);
        assert!(matches!(result, Err(SurfaceError::CapabilityUnavailable { .. })));
    }
}
