//! Accent vignette: a bottom-weighted tint plus a corner falloff, both in the accent color.

use crate::effects::composite::over_color_with_alpha;
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::math::quadratic_ramp;

pub const DEFAULT_VIGNETTE_OPACITY: f64 = 0.18;

/// Fraction of the height above which the bottom gradient contributes nothing.
const BOTTOM_START: f64 = 0.4;
/// Fraction of the center-to-corner distance left untouched by the corner falloff.
const CORNER_START: f64 = 0.6;

/// Tint the bottom and corners of `canvas` with `accent`.
///
/// The bottom gradient is composited first, then the corner falloff.
pub fn apply_vignette(mut canvas: Canvas, accent: Rgb8, opacity: f64) -> Canvas {
    let (w, h) = canvas.dimensions();

    let row_alpha: Vec<u8> = (0..h).map(|y| bottom_gradient_alpha(y, h, opacity)).collect();
    over_color_with_alpha(&mut canvas, accent, |_, y| row_alpha[y as usize]);

    over_color_with_alpha(&mut canvas, accent, |x, y| {
        corner_falloff_alpha(x, y, w, h, opacity)
    });

    canvas
}

/// Alpha of the bottom gradient at row `y`: zero in the top 40%, quadratic below.
pub fn bottom_gradient_alpha(y: u32, height: u32, opacity: f64) -> u8 {
    let h = f64::from(height);
    let t2 = quadratic_ramp(f64::from(y), BOTTOM_START * h, (1.0 - BOTTOM_START) * h);
    to_alpha(255.0 * opacity * t2)
}

/// Alpha of the corner falloff at `(x, y)`: zero inside 60% of the normalized radius, ramping
/// quadratically to half the opacity at the corners.
pub fn corner_falloff_alpha(x: u32, y: u32, width: u32, height: u32, opacity: f64) -> u8 {
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let nx = (f64::from(x) - cx) / cx;
    let ny = (f64::from(y) - cy) / cy;
    let dist = (nx * nx + ny * ny).sqrt();
    let t2 = quadratic_ramp(dist, CORNER_START, 1.0 - CORNER_START);
    to_alpha(255.0 * opacity * 0.5 * t2)
}

fn to_alpha(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
