//! Bounding boxes for rasterizing vector images.

use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

/// Rasterizer entry point: render at native size, or fit inside a box.
pub(crate) type RenderFn =
    fn(&[u8], Option<FitBox>, &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError>;

/// Target box for sized vector decoding. Both sides are at least 1.
///
/// Built from a two-element numeric pair:
///
/// ```
/// use zensurface::FitBox;
///
/// let b = FitBox::try_from((1000, 30)).unwrap();
/// assert_eq!(b.fit(100.0, 100.0), (30, 30));
/// assert!(FitBox::try_from((100, 0)).is_err());
/// assert!(FitBox::try_from(&[1.0f32, 2.0, 3.0][..]).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitBox {
    width: u32,
    height: u32,
}

impl FitBox {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimension(format!(
                "bounding box {width}x{height}: both sides must be positive"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Largest size with the aspect ratio of `native_w x native_h` that fits
    /// inside the box. One side always equals the box side.
    pub fn fit(&self, native_w: f32, native_h: f32) -> (u32, u32) {
        if !(native_w > 0.0 && native_h > 0.0) {
            return (self.width, self.height);
        }
        let (bw, bh) = (f64::from(self.width), f64::from(self.height));
        let (nw, nh) = (f64::from(native_w), f64::from(native_h));
        if bw * nh <= bh * nw {
            let h = (nh * bw / nw).round() as u32;
            (self.width, h.clamp(1, self.height))
        } else {
            let w = (nw * bh / nh).round() as u32;
            (w.clamp(1, self.width), self.height)
        }
    }

    fn from_f64(width: f64, height: f64) -> Result<Self, SurfaceError> {
        if width.is_nan() || height.is_nan() {
            return Err(SurfaceError::InvalidArgument(
                "bounding box components must be numbers".into(),
            ));
        }
        let side = |v: f64| {
            let r = v.round();
            if r >= 1.0 && r <= f64::from(u32::MAX) {
                Some(r as u32)
            } else {
                None
            }
        };
        match (side(width), side(height)) {
            (Some(w), Some(h)) => Self::new(w, h),
            _ => Err(SurfaceError::InvalidDimension(format!(
                "bounding box {width}x{height}: both sides must be positive"
            ))),
        }
    }
}

fn pair<T: Copy>(values: &[T]) -> Result<(T, T), SurfaceError> {
    match values {
        &[w, h] => Ok((w, h)),
        _ => Err(SurfaceError::InvalidArgument(format!(
            "bounding box needs exactly 2 components, got {}",
            values.len()
        ))),
    }
}

impl TryFrom<(u32, u32)> for FitBox {
    type Error = SurfaceError;
    fn try_from((w, h): (u32, u32)) -> Result<Self, SurfaceError> {
        Self::new(w, h)
    }
}

impl TryFrom<(i32, i32)> for FitBox {
    type Error = SurfaceError;
    fn try_from((w, h): (i32, i32)) -> Result<Self, SurfaceError> {
        Self::from_f64(f64::from(w), f64::from(h))
    }
}

impl TryFrom<(f32, f32)> for FitBox {
    type Error = SurfaceError;
    fn try_from((w, h): (f32, f32)) -> Result<Self, SurfaceError> {
        Self::from_f64(f64::from(w), f64::from(h))
    }
}

impl TryFrom<[f32; 2]> for FitBox {
    type Error = SurfaceError;
    fn try_from([w, h]: [f32; 2]) -> Result<Self, SurfaceError> {
        Self::from_f64(f64::from(w), f64::from(h))
    }
}

impl TryFrom<&[f32]> for FitBox {
    type Error = SurfaceError;
    fn try_from(values: &[f32]) -> Result<Self, SurfaceError> {
        let (w, h) = pair(values)?;
        Self::from_f64(f64::from(w), f64::from(h))
    }
}

impl TryFrom<&[i32]> for FitBox {
    type Error = SurfaceError;
    fn try_from(values: &[i32]) -> Result<Self, SurfaceError> {
        let (w, h) = pair(values)?;
        Self::from_f64(f64::from(w), f64::from(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn fit_keeps_aspect() {
        let b = FitBox::new(10, 10).unwrap();
        assert_eq!(b.fit(100.0, 100.0), (10, 10));
        assert_eq!(b.fit(200.0, 100.0), (10, 5));
        let wide = FitBox::new(1000, 30).unwrap();
        assert_eq!(wide.fit(100.0, 100.0), (30, 30));
        assert_eq!(wide.fit(400.0, 30.0), (400, 30));
        // extreme aspect still yields a pixel
        assert_eq!(b.fit(10_000.0, 1.0), (10, 1));
    }

    #[test]
    fn argument_errors() {
        let kind = |r: Result<FitBox, SurfaceError>| r.unwrap_err().kind();
        assert_eq!(kind(FitBox::try_from((100, 0))), ErrorKind::InvalidDimension);
        assert_eq!(kind(FitBox::try_from((-5.0f32, 10.0))), ErrorKind::InvalidDimension);
        assert_eq!(kind(FitBox::try_from((f32::NAN, 10.0))), ErrorKind::InvalidArgument);
        assert_eq!(kind(FitBox::try_from(&[1, 2, 3][..])), ErrorKind::InvalidArgument);
        assert_eq!(kind(FitBox::try_from(&[][..] as &[f32])), ErrorKind::InvalidArgument);
        assert_eq!(FitBox::try_from([12.4f32, 7.6]).unwrap(), FitBox::new(12, 8).unwrap());
    }
}
