//! SVG rasterizer adapter using resvg.

use resvg::{tiny_skia, usvg};

use crate::decode::DecodeContext;
use crate::error::SurfaceError;
use crate::format::ImageFormat;
use crate::surface::PixelBuffer;
use crate::vector::FitBox;

/// Render at the document's native size.
pub(crate) fn decode(data: &[u8], ctx: &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError> {
    render(data, None, ctx)
}

/// Render at native size, or scaled to fit inside `fit` keeping the aspect
/// ratio. Output is straight (not premultiplied) RGBA.
pub(crate) fn render(
    data: &[u8],
    fit: Option<FitBox>,
    ctx: &DecodeContext<'_>,
) -> Result<PixelBuffer, SurfaceError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| SurfaceError::codec(ImageFormat::Svg, e))?;
    let size = tree.size();
    let (width, height) = match fit {
        Some(b) => b.fit(size.width(), size.height()),
        None => (
            (size.width().ceil() as u32).max(1),
            (size.height().ceil() as u32).max(1),
        ),
    };
    ctx.limits.check_output(width, height, 4)?;
    ctx.stop.check()?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    ctx.stop.check()?;

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    tracing::debug!(width, height, "rasterized SVG");
    PixelBuffer::from_rgba(width, height, rgba)
}
