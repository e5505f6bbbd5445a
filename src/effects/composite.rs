use crate::foundation::core::{Canvas, Rgb8, Rgba8Premul};
use crate::foundation::error::{StoreshotError, StoreshotResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> StoreshotResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(StoreshotError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a same-size `layer` over `base`, consuming the base.
pub fn over_canvas(mut base: Canvas, layer: &Canvas) -> StoreshotResult<Canvas> {
    base.ensure_same_size(layer, "over_canvas")?;
    over_in_place(base.data_mut(), layer.data(), 1.0)?;
    Ok(base)
}

/// Composite a uniform color over every pixel, with per-pixel alpha from `alpha_at(x, y)`.
///
/// Equivalent to building a full layer of `color` with that alpha channel and compositing it
/// "over" the canvas, without allocating the layer.
pub fn over_color_with_alpha(
    canvas: &mut Canvas,
    color: Rgb8,
    mut alpha_at: impl FnMut(u32, u32) -> u8,
) {
    let (w, h) = canvas.dimensions();
    let data = canvas.data_mut();
    for y in 0..h {
        for x in 0..w {
            let a = alpha_at(x, y);
            if a == 0 {
                continue;
            }
            let src = color.with_alpha(a).to_array();
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            let out = over([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]], src, 1.0);
            data[idx..idx + 4].copy_from_slice(&out);
        }
    }
}

/// Paste `src` over `dst` with its top-left at `(x, y)`, using `src`'s own alpha as the mask.
///
/// Parts of `src` falling outside `dst` are clipped.
pub fn paste_over(dst: &mut Canvas, src: &Canvas, x: i32, y: i32) {
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    let (sw, sh) = (src.width() as i32, src.height() as i32);

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let src_data = src.data();
    let dst_w = dst.width() as usize;
    let dst_data = dst.data_mut();
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        for dx in x0..x1 {
            let sx = (dx - x) as usize;
            let si = (sy * (sw as usize) + sx) * 4;
            let di = ((dy as usize) * dst_w + (dx as usize)) * 4;
            let out = over(
                [dst_data[di], dst_data[di + 1], dst_data[di + 2], dst_data[di + 3]],
                [src_data[si], src_data[si + 1], src_data[si + 2], src_data[si + 3]],
                1.0,
            );
            dst_data[di..di + 4].copy_from_slice(&out);
        }
    }
}

/// Replace each pixel's alpha with the matching `mask` byte (one per pixel).
///
/// Color is re-premultiplied against the new alpha.
pub fn apply_alpha_mask(canvas: &mut Canvas, mask: &[u8]) -> StoreshotResult<()> {
    let px_count = (canvas.width() as usize) * (canvas.height() as usize);
    if mask.len() != px_count {
        return Err(StoreshotError::render(
            "apply_alpha_mask expects one mask byte per pixel",
        ));
    }
    for (px, &m) in canvas.data_mut().chunks_exact_mut(4).zip(mask) {
        let straight = Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba();
        let out = Rgba8Premul::from_straight_rgba(straight[0], straight[1], straight[2], m);
        px.copy_from_slice(&out.to_array());
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
