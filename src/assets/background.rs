use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::assets::{BACKGROUND_EXTENSIONS, find_with_extensions, load_background};
use crate::config::{BackgroundConfig, BackgroundStrategy, ScreenshotEntry};
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{StoreshotError, StoreshotResult};
use crate::foundation::math::lerp_u8_trunc;

/// Cache key for a resolved backdrop.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BackgroundKey {
    /// Asset stem the backdrop was looked up under.
    pub stem: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Default)]
struct CacheState {
    canvases: HashMap<BackgroundKey, Arc<Canvas>>,
    decodes: HashMap<BackgroundKey, u32>,
}

/// Resolves per-device backdrops from disk, falling back to a vertical gradient.
///
/// Resolved canvases are cached for the lifetime of the resolver. Callers always receive their
/// own copy.
pub struct BackgroundResolver {
    dir: PathBuf,
    cfg: BackgroundConfig,
    state: Mutex<CacheState>,
}

impl BackgroundResolver {
    pub fn new(dir: impl Into<PathBuf>, cfg: BackgroundConfig) -> Self {
        Self {
            dir: dir.into(),
            cfg,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Asset stem used for `shot`: its explicit override, else the strategy's name.
    pub fn stem_for(&self, shot: &ScreenshotEntry) -> String {
        if let Some(name) = &shot.background {
            return name.clone();
        }
        match self.cfg.strategy {
            BackgroundStrategy::Shared => self.cfg.shared_name.clone(),
            BackgroundStrategy::PerScreenshot => shot.id.clone(),
        }
    }

    /// Whether `shot` resolves to the backdrop shared by every screenshot.
    pub fn is_shared(&self, shot: &ScreenshotEntry) -> bool {
        shot.background.is_none() && self.cfg.strategy == BackgroundStrategy::Shared
    }

    pub fn resolve(
        &self,
        width: u32,
        height: u32,
        shot: &ScreenshotEntry,
    ) -> StoreshotResult<Canvas> {
        let key = BackgroundKey {
            stem: self.stem_for(shot),
            width,
            height,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreshotError::render("background cache lock poisoned"))?;
        if let Some(hit) = state.canvases.get(&key) {
            tracing::debug!(stem = %key.stem, width, height, "background cache hit");
            return Ok(Canvas::clone(hit));
        }

        let canvas = match find_with_extensions(&self.dir, &key.stem, BACKGROUND_EXTENSIONS) {
            Some(path) => {
                tracing::debug!(path = %path.display(), width, height, "background cache miss, decoding");
                let canvas = load_background(&path, width, height)?;
                *state.decodes.entry(key.clone()).or_insert(0) += 1;
                canvas
            }
            None => {
                tracing::debug!(stem = %key.stem, width, height, "no background asset, using gradient");
                let (top, bottom) = self.cfg.gradient()?;
                gradient(width, height, top, bottom)?
            }
        };

        let canvas = Arc::new(canvas);
        state.canvases.insert(key, Arc::clone(&canvas));
        Ok(Canvas::clone(&canvas))
    }

    /// How many times the asset behind `key` has been decoded.
    pub fn decode_count(&self, key: &BackgroundKey) -> u32 {
        self.state
            .lock()
            .map(|s| s.decodes.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn cached_len(&self) -> usize {
        self.state.lock().map(|s| s.canvases.len()).unwrap_or(0)
    }
}

/// Opaque vertical gradient from `top` (row 0) toward `bottom`, with ratio `y / height`.
pub fn gradient(width: u32, height: u32, top: Rgb8, bottom: Rgb8) -> StoreshotResult<Canvas> {
    let mut canvas = Canvas::new(width, height)?;
    for y in 0..height {
        let t = f64::from(y) / f64::from(height);
        let row = Rgb8::new(
            lerp_u8_trunc(top.r, bottom.r, t),
            lerp_u8_trunc(top.g, bottom.g, t),
            lerp_u8_trunc(top.b, bottom.b, t),
        );
        canvas.fill_row(y, row.with_alpha(255));
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(id: &str) -> ScreenshotEntry {
        ScreenshotEntry {
            id: id.to_string(),
            title: "T".to_string(),
            subtitle: String::new(),
            accent: Rgb8::new(0, 255, 170),
            background: None,
        }
    }

    fn gradient_cfg() -> BackgroundConfig {
        BackgroundConfig {
            gradient_top: Some(Rgb8::new(0, 0, 0)),
            gradient_bottom: Some(Rgb8::new(100, 200, 50)),
            ..BackgroundConfig::default()
        }
    }

    #[test]
    fn gradient_rows_truncate() {
        let c = gradient(2, 10, Rgb8::new(0, 0, 0), Rgb8::new(100, 200, 50)).unwrap();
        let top = c.pixel(0, 0);
        assert_eq!((top.r, top.g, top.b, top.a), (0, 0, 0, 255));
        // y = 3: t = 0.3 -> 30, 60, 15
        let p = c.pixel(1, 3);
        assert_eq!((p.r, p.g, p.b), (30, 60, 15));
        // Last row never reaches the bottom color: t = 0.9.
        let last = c.pixel(0, 9);
        assert_eq!((last.r, last.g, last.b), (90, 180, 45));
    }

    #[test]
    fn falls_back_to_gradient_when_no_asset() {
        let r = BackgroundResolver::new("/nonexistent/backgrounds", gradient_cfg());
        let c = r.resolve(4, 10, &shot("a")).unwrap();
        assert_eq!(c.dimensions(), (4, 10));
        assert_eq!(c.pixel(0, 5).g, 100);
    }

    #[test]
    fn missing_gradient_without_asset_is_a_configuration_error() {
        let r = BackgroundResolver::new("/nonexistent/backgrounds", BackgroundConfig::default());
        let err = r.resolve(4, 4, &shot("a")).unwrap_err();
        assert!(matches!(err, StoreshotError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn stem_follows_strategy_and_override() {
        let shared = BackgroundResolver::new(".", BackgroundConfig::default());
        assert_eq!(shared.stem_for(&shot("hack")), "background");
        assert!(shared.is_shared(&shot("hack")));

        let per = BackgroundResolver::new(
            ".",
            BackgroundConfig {
                strategy: BackgroundStrategy::PerScreenshot,
                ..BackgroundConfig::default()
            },
        );
        assert_eq!(per.stem_for(&shot("hack")), "hack");

        let mut custom = shot("hack");
        custom.background = Some("neon".to_string());
        assert_eq!(shared.stem_for(&custom), "neon");
        assert!(!shared.is_shared(&custom));
    }

    #[test]
    fn returned_copies_do_not_alias_the_cache() {
        let r = BackgroundResolver::new("/nonexistent/backgrounds", gradient_cfg());
        let mut first = r.resolve(3, 3, &shot("a")).unwrap();
        first.fill_row(0, Rgb8::WHITE.with_alpha(255));
        let second = r.resolve(3, 3, &shot("a")).unwrap();
        assert_eq!(second.pixel(0, 0).r, 0);
        assert_eq!(r.cached_len(), 1);
    }
}
