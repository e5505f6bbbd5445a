//! Anti-aliased shape rasterization on top of `vello_cpu`.

use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{StoreshotError, StoreshotResult};

const PATH_TOLERANCE: f64 = 0.1;

/// Run `draw` against a fresh render context and return the result as a canvas.
///
/// The context starts transparent; whatever `draw` paints ends up premultiplied in the canvas.
pub fn render_layer(
    width: u32,
    height: u32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext) -> StoreshotResult<()>,
) -> StoreshotResult<Canvas> {
    let (w, h) = dims_u16(width, height)?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx)?;
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Canvas::from_premul_bytes(width, height, pixmap.data_as_u8_slice().to_vec())
}

/// Single-channel coverage mask of a rounded rectangle filling `width x height`.
///
/// The radius is clamped to half the shorter side.
pub fn rounded_rect_mask(width: u32, height: u32, radius: f64) -> StoreshotResult<Vec<u8>> {
    let max_radius = f64::from(width.min(height)) / 2.0;
    let radius = radius.clamp(0.0, max_radius);
    let layer = render_layer(width, height, |ctx| {
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        let shape = vello_cpu::kurbo::RoundedRect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
            radius,
        );
        ctx.fill_path(&shape.to_path(PATH_TOLERANCE));
        Ok(())
    })?;
    Ok(layer.data().chunks_exact(4).map(|px| px[3]).collect())
}

fn dims_u16(width: u32, height: u32) -> StoreshotResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoreshotError::render("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoreshotError::render("raster height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StoreshotError::render("raster must be non-empty"));
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_mask_clears_corners_and_fills_interior() {
        let (w, h) = (200u32, 400u32);
        let mask = rounded_rect_mask(w, h, 20.0).unwrap();
        let at = |x: u32, y: u32| mask[(y * w + x) as usize];

        assert_eq!(mask.len(), (w * h) as usize);
        assert_eq!(at(0, 0), 0);
        assert_eq!(at(w - 1, 0), 0);
        assert_eq!(at(0, h - 1), 0);
        assert_eq!(at(w - 1, h - 1), 0);
        assert_eq!(at(100, 200), 255);
        assert_eq!(at(100, 0), 255);
        assert_eq!(at(0, 200), 255);
    }

    #[test]
    fn zero_radius_mask_is_fully_opaque() {
        let mask = rounded_rect_mask(8, 4, 0.0).unwrap();
        assert!(mask.iter().all(|&m| m == 255));
    }

    #[test]
    fn render_layer_rejects_empty() {
        assert!(render_layer(0, 4, |_| Ok(())).is_err());
    }
}
