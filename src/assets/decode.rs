use std::path::Path;

use crate::foundation::core::{Canvas, MAX_CANVAS_DIM};
use crate::foundation::error::{StoreshotError, StoreshotResult};

/// Read a file, mapping "not found" to [`StoreshotError::MissingAsset`].
pub fn read_asset(path: &Path) -> StoreshotResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreshotError::missing_asset(format!("'{}'", path.display()))
        } else {
            StoreshotError::io(format!("read '{}': {e}", path.display()))
        }
    })
}

pub fn decode_image(bytes: &[u8]) -> StoreshotResult<image::RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| StoreshotError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Err(StoreshotError::decode("image has zero width or height"));
    }
    Ok(rgba)
}

pub fn load_image(path: &Path) -> StoreshotResult<image::RgbaImage> {
    let bytes = read_asset(path)?;
    decode_image(&bytes).map_err(|e| match e {
        StoreshotError::Decode(msg) => {
            StoreshotError::decode(format!("'{}': {msg}", path.display()))
        }
        other => other,
    })
}

pub fn parse_svg(bytes: &[u8]) -> StoreshotResult<usvg::Tree> {
    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();
    usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| StoreshotError::decode(format!("parse svg tree: {e}")))
}

/// Render an SVG tree stretched to exactly `width x height`.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> StoreshotResult<Canvas> {
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(StoreshotError::render(format!(
            "svg raster size too large: {width}x{height} (max {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM})"
        )));
    }
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| StoreshotError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Canvas::from_premul_bytes(width, height, pixmap.take())
}

/// Decode a background asset and fit it to exactly `width x height`.
///
/// Raster images are resampled with Lanczos3; SVGs are rendered directly at the target size.
pub fn load_background(path: &Path, width: u32, height: u32) -> StoreshotResult<Canvas> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        let bytes = read_asset(path)?;
        let tree = parse_svg(&bytes).map_err(|e| match e {
            StoreshotError::Decode(msg) => {
                StoreshotError::decode(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })?;
        return rasterize_svg(&tree, width, height);
    }

    let img = load_image(path)?;
    let img = if img.dimensions() == (width, height) {
        img
    } else {
        image::imageops::resize(&img, width, height, image::imageops::FilterType::Lanczos3)
    };
    Canvas::from_rgba_image(&img)
}
