//! The device capture: scaled to the canvas, corners rounded and a soft drop shadow attached.

use crate::config::LayoutParams;
use crate::effects::blur::blur_canvas;
use crate::effects::composite::{apply_alpha_mask, paste_over};
use crate::effects::raster::rounded_rect_mask;
use crate::foundation::core::{Canvas, MAX_CANVAS_DIM, PixelRect, Rgb8};
use crate::foundation::error::{StoreshotError, StoreshotResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubjectParams {
    /// Subject width as a fraction of `canvas_width`.
    pub phone_scale: f64,
    pub canvas_width: u32,
    /// Corner radius before scaling by `phone_scale`.
    pub corner_radius: f64,
    pub shadow_offset: u32,
    pub shadow_blur: u32,
    /// Alpha of the solid shadow before blurring.
    pub shadow_alpha: u8,
}

impl SubjectParams {
    pub fn from_layout(layout: &LayoutParams, canvas_width: u32, shadow_alpha: u8) -> Self {
        Self {
            phone_scale: layout.phone_scale,
            canvas_width,
            corner_radius: layout.corner_radius,
            shadow_offset: layout.shadow_offset,
            shadow_blur: layout.shadow_blur,
            shadow_alpha,
        }
    }
}

/// Padded subject composite, ready to paste onto the canvas.
#[derive(Clone, Debug)]
pub struct SubjectLayer {
    composite: Canvas,
    subject_width: u32,
    subject_height: u32,
    /// Offset of the subject inside the composite, on both axes.
    pad: u32,
}

/// Where a [`SubjectLayer`] lands on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub paste_x: i32,
    pub paste_y: i32,
    /// The un-padded subject, in canvas coordinates.
    pub subject: PixelRect,
}

impl SubjectLayer {
    pub fn composite(&self) -> &Canvas {
        &self.composite
    }

    pub fn subject_size(&self) -> (u32, u32) {
        (self.subject_width, self.subject_height)
    }

    pub fn pad(&self) -> u32 {
        self.pad
    }

    /// Center horizontally; put the composite's top edge at `phone_y_offset` of the height.
    pub fn placement(&self, canvas_width: u32, canvas_height: u32, phone_y_offset: f64) -> Placement {
        let paste_x = (i64::from(canvas_width) - i64::from(self.composite.width())).div_euclid(2);
        let paste_y = (f64::from(canvas_height) * phone_y_offset).floor();
        let paste_x = paste_x as i32;
        let paste_y = paste_y as i32;
        let pad = self.pad as i32;
        Placement {
            paste_x,
            paste_y,
            subject: PixelRect::new(
                paste_x + pad,
                paste_y + pad,
                self.subject_width,
                self.subject_height,
            ),
        }
    }

    /// Composite the layer onto `canvas` at `placement`, using its own alpha.
    pub fn paste_onto(&self, canvas: &mut Canvas, placement: Placement) {
        paste_over(canvas, &self.composite, placement.paste_x, placement.paste_y);
    }
}

/// Scale, round and shadow a raw capture.
pub fn process_subject(raw: &image::RgbaImage, params: SubjectParams) -> StoreshotResult<SubjectLayer> {
    let (raw_w, raw_h) = raw.dimensions();
    if raw_w == 0 || raw_h == 0 {
        return Err(StoreshotError::decode("raw capture has zero width or height"));
    }

    let width = (f64::from(params.canvas_width) * params.phone_scale).floor() as u32;
    if width == 0 {
        return Err(StoreshotError::render(format!(
            "subject scales to zero width on a {}px canvas",
            params.canvas_width
        )));
    }
    let height = ((f64::from(raw_h) * (f64::from(width) / f64::from(raw_w))).floor() as u32).max(1);
    let blur = params.shadow_blur;
    let padded_h = u64::from(height) + u64::from(blur) * 4;
    if padded_h > u64::from(MAX_CANVAS_DIM) {
        return Err(StoreshotError::decode(format!(
            "{raw_w}x{raw_h} capture scales to a {width}x{height} subject, taller than {MAX_CANVAS_DIM}px"
        )));
    }

    let scaled = image::imageops::resize(raw, width, height, image::imageops::FilterType::Lanczos3);
    let mut subject = Canvas::from_rgba_image(&scaled)?;

    let radius = (params.corner_radius * params.phone_scale).floor();
    let mask = rounded_rect_mask(width, height, radius)?;
    apply_alpha_mask(&mut subject, &mask)?;

    let pad = blur * 2;
    let mut composite = Canvas::new(width + blur * 4, height + blur * 4)?;

    let shadow_px = Rgb8::BLACK.with_alpha(params.shadow_alpha);
    let sx = (pad + params.shadow_offset) as i32;
    let sy = (pad + params.shadow_offset) as i32;
    for y in sy..sy + height as i32 {
        composite.fill_span(y, sx, sx + width as i32, shadow_px);
    }
    let mut composite = blur_canvas(&composite, blur as f32)?;

    paste_over(&mut composite, &subject, pad as i32, pad as i32);

    tracing::debug!(
        width,
        height,
        radius,
        composite_w = composite.width(),
        composite_h = composite.height(),
        "processed subject"
    );

    Ok(SubjectLayer {
        composite,
        subject_width: width,
        subject_height: height,
        pad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgba8Premul;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> image::RgbaImage {
        image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
    }

    fn params() -> SubjectParams {
        SubjectParams {
            phone_scale: 0.8,
            canvas_width: 200,
            corner_radius: 20.0,
            shadow_offset: 4,
            shadow_blur: 8,
            shadow_alpha: 120,
        }
    }

    #[test]
    fn sizes_follow_scale_and_padding() {
        let layer = process_subject(&solid(10, 20, [200, 40, 40, 255]), params()).unwrap();
        assert_eq!(layer.subject_size(), (160, 320));
        assert_eq!(layer.pad(), 16);
        assert_eq!(layer.composite().dimensions(), (192, 352));
    }

    #[test]
    fn corners_are_cut_and_center_is_opaque() {
        let layer = process_subject(&solid(10, 20, [200, 40, 40, 255]), params()).unwrap();
        let c = layer.composite();
        let center = c.pixel(16 + 80, 16 + 160);
        assert_eq!(center.a, 255);
        assert!((i32::from(center.r) - 200).abs() <= 2, "center = {center:?}");
        // Top-left corner of the subject sits outside the rounded rect and before the shadow.
        let corner = c.pixel(16, 16);
        assert!(corner.a < 60, "corner = {corner:?}");
    }

    #[test]
    fn shadow_falls_toward_the_offset() {
        let layer = process_subject(&solid(10, 20, [255, 255, 255, 255]), params()).unwrap();
        let c = layer.composite();
        // Below-right of the subject carries shadow, above-left much less.
        let below = c.pixel(16 + 80, 16 + 320 + 4);
        let above = c.pixel(16 + 80, 16 - 4);
        assert!(below.a > above.a, "below = {below:?}, above = {above:?}");
        assert_eq!(below.r, 0);
    }

    #[test]
    fn placement_centers_and_offsets() {
        let layer = process_subject(&solid(10, 20, [1, 2, 3, 255]), params()).unwrap();
        let p = layer.placement(200, 400, 0.3);
        assert_eq!((p.paste_x, p.paste_y), (4, 120));
        assert_eq!(p.subject, PixelRect::new(20, 136, 160, 320));
    }

    #[test]
    fn zero_blur_has_no_padding() {
        let p = SubjectParams {
            shadow_blur: 0,
            shadow_offset: 0,
            corner_radius: 0.0,
            ..params()
        };
        let layer = process_subject(&solid(4, 4, [9, 9, 9, 255]), p).unwrap();
        assert_eq!(layer.composite().dimensions(), (160, 160));
        assert_eq!(
            layer.composite().pixel(0, 0),
            Rgba8Premul::from_straight_rgba(9, 9, 9, 255)
        );
    }

    #[test]
    fn overly_tall_capture_is_a_decode_error() {
        let err = process_subject(&solid(1, 120, [0, 0, 0, 255]), params()).unwrap_err();
        assert!(matches!(err, StoreshotError::Decode(_)), "{err}");
        assert!(!err.is_fatal());
    }

    #[test]
    fn tiny_canvas_is_rejected() {
        let p = SubjectParams {
            canvas_width: 1,
            ..params()
        };
        assert!(process_subject(&solid(4, 4, [0, 0, 0, 255]), p).is_err());
    }
}
