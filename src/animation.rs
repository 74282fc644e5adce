//! Multi-frame decoding results.

use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

/// Decoder entry point for formats that carry several frames.
pub(crate) type FramesFn =
    fn(&[u8], &DecodeContext<'_>) -> Result<Vec<AnimationFrame>, SurfaceError>;

/// One fully composited frame and how long it stays on screen.
#[derive(Clone, Debug)]
pub struct AnimationFrame {
    pub buffer: PixelBuffer,
    /// Display duration in milliseconds. Zero for still images.
    pub duration_ms: f64,
}

impl AnimationFrame {
    pub fn new(buffer: PixelBuffer, duration_ms: f64) -> Self {
        Self {
            buffer,
            duration_ms,
        }
    }

    /// A still image as a single zero-duration frame.
    pub(crate) fn still(buffer: PixelBuffer) -> Self {
        Self::new(buffer, 0.0)
    }

    pub fn into_parts(self) -> (PixelBuffer, f64) {
        (self.buffer, self.duration_ms)
    }
}
