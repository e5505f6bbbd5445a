pub mod background;
pub mod decode;

use std::path::{Path, PathBuf};

pub use background::{BackgroundKey, BackgroundResolver, gradient};
pub use decode::{decode_image, load_background, load_image, parse_svg, rasterize_svg};

/// Background asset extensions, in lookup order.
pub const BACKGROUND_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];

/// Raw capture extensions, in lookup order.
pub const RAW_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// First existing `{dir}/{stem}.{ext}` for `ext` in `extensions`.
pub fn find_with_extensions(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

/// Stem of the raw capture for a screenshot on a device: `{id}_{device}`.
pub fn raw_stem(screenshot_id: &str, device_key: &str) -> String {
    format!("{screenshot_id}_{device_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_order_is_respected() {
        let dir = std::env::temp_dir().join(format!("storeshot_find_ext_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shot.webp"), b"x").unwrap();
        std::fs::write(dir.join("shot.jpg"), b"x").unwrap();

        let found = find_with_extensions(&dir, "shot", RAW_EXTENSIONS).unwrap();
        assert_eq!(found, dir.join("shot.jpg"));
        assert!(find_with_extensions(&dir, "other", RAW_EXTENSIONS).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn raw_stem_joins_id_and_device() {
        assert_eq!(raw_stem("hack", "ipad"), "hack_ipad");
    }
}
