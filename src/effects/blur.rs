use crate::foundation::core::Canvas;
use crate::foundation::error::{StoreshotError, StoreshotResult};

/// Number of box passes per axis. Three passes are within a few percent of a true Gaussian.
const BOX_PASSES: usize = 3;

/// Blur a premultiplied RGBA8 buffer with a Gaussian of standard deviation `sigma`.
///
/// The Gaussian is approximated by three successive box blurs per axis, so cost does not grow
/// with the radius. Edges clamp to the border pixel. `sigma <= 0` returns the input unchanged.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> StoreshotResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StoreshotError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(StoreshotError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if !sigma.is_finite() {
        return Err(StoreshotError::render("blur sigma must be finite"));
    }
    if sigma <= 0.0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let radii = box_radii_for_gauss(sigma, BOX_PASSES);
    let mut a: Vec<f32> = src.iter().map(|&v| f32::from(v)).collect();
    let mut b = vec![0f32; expected_len];

    for &r in &radii {
        horizontal_pass(&a, &mut b, width, height, r);
        std::mem::swap(&mut a, &mut b);
    }
    for &r in &radii {
        vertical_pass(&a, &mut b, width, height, r);
        std::mem::swap(&mut a, &mut b);
    }

    Ok(a.into_iter().map(f32_to_u8).collect())
}

/// Blur a whole canvas, returning a new one of the same size.
pub fn blur_canvas(canvas: &Canvas, sigma: f32) -> StoreshotResult<Canvas> {
    let out = blur_rgba8_premul(canvas.data(), canvas.width(), canvas.height(), sigma)?;
    Canvas::from_premul_bytes(canvas.width(), canvas.height(), out)
}

/// Box radii whose successive application approximates a Gaussian with deviation `sigma`.
fn box_radii_for_gauss(sigma: f32, passes: usize) -> Vec<usize> {
    let n = passes as f64;
    let s2 = f64::from(sigma) * f64::from(sigma);
    let w_ideal = (12.0 * s2 / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f64;
    let m_ideal = (12.0 * s2 - n * wlf * wlf - 4.0 * n * wlf - 3.0 * n) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().clamp(0.0, n) as usize;

    (0..passes)
        .map(|i| {
            let w = if i < m { wl } else { wu };
            ((w - 1) / 2) as usize
        })
        .collect()
}

fn horizontal_pass(src: &[f32], dst: &mut [f32], width: u32, height: u32, r: usize) {
    let w = width as usize;
    for y in 0..height as usize {
        let row = y * w * 4;
        box_line(&src[row..row + w * 4], &mut dst[row..row + w * 4], w, r);
    }
}

fn vertical_pass(src: &[f32], dst: &mut [f32], width: u32, height: u32, r: usize) {
    let w = width as usize;
    let h = height as usize;
    let mut line_in = vec![0f32; h * 4];
    let mut line_out = vec![0f32; h * 4];
    for x in 0..w {
        for y in 0..h {
            let idx = (y * w + x) * 4;
            line_in[y * 4..y * 4 + 4].copy_from_slice(&src[idx..idx + 4]);
        }
        box_line(&line_in, &mut line_out, h, r);
        for y in 0..h {
            let idx = (y * w + x) * 4;
            dst[idx..idx + 4].copy_from_slice(&line_out[y * 4..y * 4 + 4]);
        }
    }
}

/// Running-sum box filter over a contiguous line of `len` RGBA samples.
fn box_line(src: &[f32], dst: &mut [f32], len: usize, r: usize) {
    if r == 0 || len == 0 {
        dst[..len * 4].copy_from_slice(&src[..len * 4]);
        return;
    }
    let last = len as isize - 1;
    let at = |i: isize, c: usize| -> f32 {
        let i = i.clamp(0, last) as usize;
        src[i * 4 + c]
    };
    let norm = 1.0 / (2 * r + 1) as f32;
    let r = r as isize;

    for c in 0..4 {
        let mut acc = 0f32;
        for k in -r..=r {
            acc += at(k, c);
        }
        dst[c] = acc * norm;
        for i in 1..len as isize {
            acc += at(i + r, c) - at(i - r - 1, c);
            dst[(i as usize) * 4 + c] = acc * norm;
        }
    }
}

fn f32_to_u8(v: f32) -> u8 {
    (v + 0.5).clamp(0.0, 255.0) as u8
}
