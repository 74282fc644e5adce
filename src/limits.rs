use crate::error::SurfaceError;

/// Resource limits applied by every decoder before it allocates.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the output pixel buffer.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check decoded dimensions against the configured maxima.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if let Some(max_w) = self.max_width
            && u64::from(width) > max_w
        {
            return Err(SurfaceError::LimitExceeded(format!(
                "width {width} exceeds limit {max_w}"
            )));
        }
        if let Some(max_h) = self.max_height
            && u64::from(height) > max_h
        {
            return Err(SurfaceError::LimitExceeded(format!(
                "height {height} exceeds limit {max_h}"
            )));
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(SurfaceError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check that an output allocation fits the memory limit.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), SurfaceError> {
        if let Some(max_mem) = self.max_memory_bytes
            && bytes as u64 > max_mem
        {
            return Err(SurfaceError::LimitExceeded(format!(
                "allocation {bytes} bytes exceeds memory limit {max_mem}"
            )));
        }
        Ok(())
    }

    /// Dimension and memory check for a buffer of `bytes_per_pixel`-sized pixels.
    pub(crate) fn check_output(
        &self,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
    ) -> Result<(), SurfaceError> {
        self.check(width, height)?;
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(bytes_per_pixel))
            .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
        self.check_memory(bytes)
    }
}
