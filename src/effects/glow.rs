//! Radial accent glow behind the subject.
//!
//! The falloff is built from concentric filled ellipses painted outside-in. Each ellipse replaces
//! the pixels it covers, so inner (more opaque) rings overwrite outer ones and the stack reads as
//! a stepped radial gradient. The layer is then blurred and composited over the canvas.

use crate::effects::blur::blur_canvas;
use crate::effects::composite::over_canvas;
use crate::foundation::core::{Canvas, Point, Rect, Rgb8, Rgba8Premul};
use crate::foundation::error::StoreshotResult;

/// Glow radii as multiples of the subject rectangle's width and height.
const RADIUS_X_FACTOR: f64 = 0.9;
const RADIUS_Y_FACTOR: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowParams {
    /// Peak opacity at the innermost ellipse.
    pub opacity: f64,
    /// Number of concentric ellipses.
    pub steps: u32,
    /// Blur applied to the finished ellipse stack.
    pub blur: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            opacity: 0.40,
            steps: 80,
            blur: 60.0,
        }
    }
}

/// Composite a blurred elliptical accent glow centered on `subject`.
pub fn apply_accent_glow(
    canvas: Canvas,
    accent: Rgb8,
    subject: Rect,
    params: GlowParams,
) -> StoreshotResult<Canvas> {
    let layer = glow_layer(canvas.width(), canvas.height(), accent, subject, params)?;
    let layer = blur_canvas(&layer, params.blur)?;
    over_canvas(canvas, &layer)
}

/// The unblurred ellipse stack, on a transparent canvas of the given size.
pub fn glow_layer(
    width: u32,
    height: u32,
    accent: Rgb8,
    subject: Rect,
    params: GlowParams,
) -> StoreshotResult<Canvas> {
    let mut layer = Canvas::new(width, height)?;
    let center = subject.center();
    let rx = RADIUS_X_FACTOR * subject.width();
    let ry = RADIUS_Y_FACTOR * subject.height();
    let steps = params.steps.max(1);

    for i in 0..steps {
        let t = f64::from(i) / f64::from(steps);
        let scale = 1.0 - t;
        let alpha = (255.0 * params.opacity * t * t).round().clamp(0.0, 255.0) as u8;
        fill_ellipse_replace(&mut layer, center, rx * scale, ry * scale, accent.with_alpha(alpha));
    }

    Ok(layer)
}

/// Fill every pixel whose center lies inside the ellipse, replacing what was there.
fn fill_ellipse_replace(layer: &mut Canvas, center: Point, rx: f64, ry: f64, px: Rgba8Premul) {
    if !(rx > 0.0 && ry > 0.0) {
        return;
    }
    let y_start = (center.y - ry - 0.5).floor() as i32;
    let y_end = (center.y + ry + 0.5).ceil() as i32;
    for y in y_start..=y_end {
        let dy = (f64::from(y) + 0.5 - center.y) / ry;
        if dy.abs() > 1.0 {
            continue;
        }
        let half = rx * (1.0 - dy * dy).sqrt();
        let x0 = (center.x - half - 0.5).ceil() as i32;
        let x1 = (center.x + half - 0.5).floor() as i32 + 1;
        layer.fill_span(y, x0, x1, px);
    }
}
