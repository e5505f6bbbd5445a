use crate::effects::composite::over_color_with_alpha;
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{StoreshotError, StoreshotResult};
use crate::foundation::math::alpha_from_opacity;

pub const DEFAULT_SCAN_LINE_OPACITY: f64 = 0.10;
pub const DEFAULT_SCAN_LINE_SPACING: u32 = 4;

/// Overlay one full-width black line every `spacing` rows, starting at row 0.
pub fn apply_scan_lines(mut canvas: Canvas, opacity: f64, spacing: u32) -> StoreshotResult<Canvas> {
    if spacing == 0 {
        return Err(StoreshotError::config("scan line spacing must be > 0"));
    }
    let alpha = alpha_from_opacity(opacity);
    if alpha == 0 {
        return Ok(canvas);
    }
    over_color_with_alpha(&mut canvas, Rgb8::BLACK, |_, y| {
        if y % spacing == 0 { alpha } else { 0 }
    });
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgba8Premul;

    #[test]
    fn darkens_every_nth_row_only() {
        let base = Rgba8Premul::from_straight_rgba(200, 200, 200, 255);
        let c = Canvas::filled(3, 9, base).unwrap();
        let out = apply_scan_lines(c, DEFAULT_SCAN_LINE_OPACITY, DEFAULT_SCAN_LINE_SPACING).unwrap();

        assert_eq!(out.dimensions(), (3, 9));
        for y in 0..9 {
            let px = out.pixel(1, y);
            if y % 4 == 0 {
                assert!(px.r < 200, "row {y} should be darkened");
                assert_eq!(px.a, 255);
            } else {
                assert_eq!(px, base, "row {y} should be untouched");
            }
        }
        // 200 * (255 - 26) / 255
        assert_eq!(out.pixel(0, 0).r, 180);
    }

    #[test]
    fn zero_spacing_is_a_configuration_error() {
        let c = Canvas::new(2, 2).unwrap();
        assert!(matches!(
            apply_scan_lines(c, 0.1, 0),
            Err(StoreshotError::Config(_))
        ));
    }

    #[test]
    fn zero_opacity_is_identity() {
        let base = Rgba8Premul::from_straight_rgba(1, 2, 3, 255);
        let c = Canvas::filled(2, 2, base).unwrap();
        let out = apply_scan_lines(c.clone(), 0.0, 1).unwrap();
        assert_eq!(out, c);
    }
}
