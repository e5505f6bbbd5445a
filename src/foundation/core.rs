use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{StoreshotError, StoreshotResult};

pub use kurbo::{Point, Rect, Vec2};

/// Largest canvas edge accepted anywhere in the pipeline.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::default()
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }

    /// Undo premultiplication. Fully transparent pixels map to black.
    pub fn to_straight_rgba(self) -> [u8; 4] {
        if self.a == 0 {
            return [0, 0, 0, 0];
        }
        if self.a == 255 {
            return [self.r, self.g, self.b, 255];
        }
        let a = u32::from(self.a);
        let unpremul = |c: u8| -> u8 { ((u32::from(c) * 255 + a / 2) / a).min(255) as u8 };
        [unpremul(self.r), unpremul(self.g), unpremul(self.b), self.a]
    }
}

/// Opaque RGB color parsed from `#RRGGBB` (the `#` is optional).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(s: &str) -> StoreshotResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreshotError::config(format!(
                "hex color must be #RRGGBB, got \"{s}\""
            )));
        }

        fn hex_byte(pair: &str) -> StoreshotResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| StoreshotError::config(format!("invalid hex byte \"{pair}\"")))
        }

        Ok(Self {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
        })
    }

    /// Premultiplied pixel of this color at the given alpha.
    pub fn with_alpha(self, a: u8) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, a)
    }
}

impl FromStr for Rgb8 {
    type Err = StoreshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = StoreshotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb8> for String {
    fn from(c: Rgb8) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Integer pixel rectangle. The origin may be negative or extend past the canvas; consumers clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    pub fn center(self) -> Point {
        Point::new(
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

/// Fixed-size raster buffer, premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Allocate a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> StoreshotResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Allocate a canvas where every pixel is `px`.
    pub fn filled(width: u32, height: u32, px: Rgba8Premul) -> StoreshotResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: px.to_array().repeat(len / 4),
        })
    }

    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> StoreshotResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(StoreshotError::render(format!(
                "canvas byte len mismatch: expected {len}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Premultiply a straight-alpha image into a canvas.
    pub fn from_rgba_image(img: &image::RgbaImage) -> StoreshotResult<Self> {
        let (width, height) = img.dimensions();
        let mut data = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_bytes(width, height, data)
    }

    /// Straight-alpha copy of the canvas.
    pub fn to_rgba_image(&self) -> StoreshotResult<image::RgbaImage> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(
                &Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba(),
            );
        }
        image::RgbaImage::from_raw(self.width, self.height, out)
            .ok_or_else(|| StoreshotError::render("rgba image buffer size mismatch"))
    }

    /// Drop the alpha channel, keeping the straight color of each pixel.
    pub fn to_rgb_image(&self) -> StoreshotResult<image::RgbImage> {
        let mut out = Vec::with_capacity((self.data.len() / 4) * 3);
        for px in self.data.chunks_exact(4) {
            let s = Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba();
            out.extend_from_slice(&s[..3]);
        }
        image::RgbImage::from_raw(self.width, self.height, out)
            .ok_or_else(|| StoreshotError::render("rgb image buffer size mismatch"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba8Premul {
        let idx = self.index(x, y);
        Rgba8Premul::from_array([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba8Premul) {
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&px.to_array());
    }

    /// Fill the whole row `y` with `px`.
    pub fn fill_row(&mut self, y: u32, px: Rgba8Premul) {
        let start = self.index(0, y);
        let end = start + (self.width as usize) * 4;
        let src = px.to_array();
        for dst in self.data[start..end].chunks_exact_mut(4) {
            dst.copy_from_slice(&src);
        }
    }

    /// Fill the clipped horizontal span `[x0, x1)` of row `y`, replacing existing pixels.
    pub fn fill_span(&mut self, y: i32, x0: i32, x1: i32, px: Rgba8Premul) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width as i32);
        if x0 >= x1 {
            return;
        }
        let start = self.index(x0 as u32, y as u32);
        let end = start + ((x1 - x0) as usize) * 4;
        let src = px.to_array();
        for dst in self.data[start..end].chunks_exact_mut(4) {
            dst.copy_from_slice(&src);
        }
    }

    pub fn ensure_same_size(&self, other: &Canvas, what: &str) -> StoreshotResult<()> {
        if self.dimensions() != other.dimensions() {
            return Err(StoreshotError::render(format!(
                "{what}: canvas size mismatch {}x{} vs {}x{}",
                self.width, self.height, other.width, other.height
            )));
        }
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

fn byte_len(width: u32, height: u32) -> StoreshotResult<usize> {
    if width == 0 || height == 0 {
        return Err(StoreshotError::render(format!(
            "canvas must be non-empty, got {width}x{height}"
        )));
    }
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(StoreshotError::render(format!(
            "canvas too large: {width}x{height} (max {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM})"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StoreshotError::render("canvas buffer size overflow"))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_with_and_without_hash() {
        assert_eq!(Rgb8::from_hex("#00FFAA").unwrap(), Rgb8::new(0, 255, 170));
        assert_eq!(Rgb8::from_hex("ff0080").unwrap(), Rgb8::new(255, 0, 128));
        assert_eq!(Rgb8::from_hex(" #0a0B0c ").unwrap(), Rgb8::new(10, 11, 12));
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(matches!(
            Rgb8::from_hex("#FFF"),
            Err(StoreshotError::Config(_))
        ));
        assert!(Rgb8::from_hex("#GG0000").is_err());
        assert!(Rgb8::from_hex("#00FFAA80").is_err());
    }

    #[test]
    fn rgb_serde_roundtrips_through_hex_string() {
        let c: Rgb8 = serde_json::from_str("\"#00ffaa\"").unwrap();
        assert_eq!(c, Rgb8::new(0, 255, 170));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#00FFAA\"");
        assert!(serde_json::from_str::<Rgb8>("\"nope\"").is_err());
    }

    #[test]
    fn premul_unpremul_is_stable_for_opaque_and_clear() {
        let px = Rgba8Premul::from_straight_rgba(100, 50, 200, 255);
        assert_eq!(px.to_straight_rgba(), [100, 50, 200, 255]);
        let clear = Rgba8Premul::from_straight_rgba(100, 50, 200, 0);
        assert_eq!(clear, Rgba8Premul::transparent());
    }

    #[test]
    fn canvas_rejects_empty_and_oversize() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(10, MAX_CANVAS_DIM + 1).is_err());
        assert!(Canvas::from_premul_bytes(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn fill_span_clips_to_canvas() {
        let mut c = Canvas::new(4, 2).unwrap();
        let red = Rgba8Premul::from_straight_rgba(255, 0, 0, 255);
        c.fill_span(1, -3, 2, red);
        c.fill_span(5, 0, 4, red);
        assert_eq!(c.pixel(0, 1), red);
        assert_eq!(c.pixel(1, 1), red);
        assert_eq!(c.pixel(2, 1), Rgba8Premul::transparent());
        assert_eq!(c.pixel(0, 0), Rgba8Premul::transparent());
    }

    #[test]
    fn rgb_flatten_drops_alpha() {
        let c = Canvas::filled(2, 1, Rgba8Premul::from_straight_rgba(10, 20, 30, 255)).unwrap();
        let rgb = c.to_rgb_image().unwrap();
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn pixel_rect_geometry() {
        let r = PixelRect::new(20, 136, 160, 320);
        assert_eq!(r.right(), 180);
        assert_eq!(r.bottom(), 456);
        assert_eq!(r.center(), Point::new(100.0, 296.0));
        assert!(r.contains(20, 136));
        assert!(!r.contains(180, 136));
    }
}
