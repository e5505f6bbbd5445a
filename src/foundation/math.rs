pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Channel interpolation that truncates toward zero, matching integer row fills.
pub fn lerp_u8_trunc(a: u8, b: u8, t: f64) -> u8 {
    lerp(f64::from(a), f64::from(b), t).clamp(0.0, 255.0) as u8
}

/// Convert a `[0, 1]` opacity into an 8-bit alpha.
pub fn alpha_from_opacity(opacity: f64) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Quadratic ramp used by the vignette and glow falloffs: `(clamp((v - start) / span))^2`.
pub fn quadratic_ramp(v: f64, start: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return if v >= start { 1.0 } else { 0.0 };
    }
    let t = ((v - start) / span).clamp(0.0, 1.0);
    t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div255_rounds_to_nearest() {
        assert_eq!(mul_div255_u8(255, 255), 255);
        assert_eq!(mul_div255_u8(0, 255), 0);
        assert_eq!(mul_div255_u8(128, 255), 128);
        assert_eq!(mul_div255_u8(255, 128), 128);
    }

    #[test]
    fn lerp_trunc_hits_endpoints() {
        assert_eq!(lerp_u8_trunc(10, 200, 0.0), 10);
        assert_eq!(lerp_u8_trunc(10, 200, 1.0), 200);
        assert_eq!(lerp_u8_trunc(200, 10, 0.5), 105);
        assert_eq!(lerp_u8_trunc(0, 3, 0.5), 1);
    }

    #[test]
    fn quadratic_ramp_is_zero_before_start_and_one_after_span() {
        assert_eq!(quadratic_ramp(0.2, 0.4, 0.6), 0.0);
        assert_eq!(quadratic_ramp(1.0, 0.4, 0.6), 1.0);
        assert!((quadratic_ramp(0.7, 0.4, 0.6) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn alpha_from_opacity_clamps() {
        assert_eq!(alpha_from_opacity(-1.0), 0);
        assert_eq!(alpha_from_opacity(2.0), 255);
        assert_eq!(alpha_from_opacity(0.10), 26);
    }
}
