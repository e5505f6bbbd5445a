//! Batch configuration: devices, layout, screenshots and the ambient settings around them.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::core::{MAX_CANVAS_DIM, Rgb8};
use crate::foundation::error::{StoreshotError, StoreshotResult};

/// Top-level configuration for one compositing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output form factors keyed by device key (e.g. `"iphone"`).
    pub devices: BTreeMap<String, DeviceProfile>,
    /// Placement ratios and pixel offsets shared by every screenshot.
    pub layout: LayoutParams,
    /// One entry per marketing screen.
    pub screenshots: Vec<ScreenshotEntry>,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Target canvas size for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Subject width as a fraction of canvas width.
    pub phone_scale: f64,
    /// Corner radius in pixels before scaling by `phone_scale`.
    pub corner_radius: f64,
    pub shadow_offset: u32,
    pub shadow_blur: u32,
    /// Top of the shadowed subject as a fraction of canvas height.
    pub phone_y_offset: f64,
    pub title_y: f64,
    pub subtitle_y: f64,
    /// Title glow radius; the subtitle uses half.
    pub glow_radius: u32,
    /// Title font size as a fraction of canvas width.
    #[serde(default = "default_title_size")]
    pub title_size: f64,
    /// Subtitle font size as a fraction of canvas width.
    #[serde(default = "default_subtitle_size")]
    pub subtitle_size: f64,
}

fn default_title_size() -> f64 {
    0.065
}

fn default_subtitle_size() -> f64 {
    0.035
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub accent: Rgb8,
    /// Background asset stem overriding the strategy's default name.
    #[serde(default)]
    pub background: Option<String>,
}

/// Where background assets come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStrategy {
    /// One backdrop (`shared_name`) reused for every screenshot.
    #[default]
    Shared,
    /// A backdrop named after each screenshot id.
    PerScreenshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub gradient_top: Option<Rgb8>,
    #[serde(default)]
    pub gradient_bottom: Option<Rgb8>,
    #[serde(default)]
    pub strategy: BackgroundStrategy,
    #[serde(default = "default_shared_name")]
    pub shared_name: String,
}

fn default_shared_name() -> String {
    "background".to_string()
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            gradient_top: None,
            gradient_bottom: None,
            strategy: BackgroundStrategy::default(),
            shared_name: default_shared_name(),
        }
    }
}

impl BackgroundConfig {
    /// Both gradient stops, or a configuration error naming the missing one.
    pub fn gradient(&self) -> StoreshotResult<(Rgb8, Rgb8)> {
        let top = self
            .gradient_top
            .ok_or_else(|| StoreshotError::config("background.gradient_top is required"))?;
        let bottom = self
            .gradient_bottom
            .ok_or_else(|| StoreshotError::config("background.gradient_bottom is required"))?;
        Ok((top, bottom))
    }
}

/// Tunables for the effect layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub vignette_opacity: f64,
    pub scan_line_opacity: f64,
    pub scan_line_spacing: u32,
    pub glow_opacity: f64,
    pub glow_steps: u32,
    pub glow_blur: f32,
    /// Alpha of the solid layer behind the subject before blurring.
    pub shadow_alpha: u8,
    /// Alpha of the text drawn into the glow layer.
    pub text_glow_alpha: u8,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            vignette_opacity: 0.18,
            scan_line_opacity: 0.10,
            scan_line_spacing: 4,
            glow_opacity: 0.40,
            glow_steps: 80,
            glow_blur: 60.0,
            shadow_alpha: 120,
            text_glow_alpha: 180,
        }
    }
}

/// Ordered font candidates; the first one that loads wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub candidates: Vec<PathBuf>,
    /// Query the system font database for a monospace face when no candidate loads.
    pub system_fallback: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            candidates: [
                "/System/Library/Fonts/SFMono-Bold.otf",
                "/System/Library/Fonts/Menlo.ttc",
                "/System/Library/Fonts/Courier.dfont",
                "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
                "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
                "C:\\Windows\\Fonts\\consolab.ttf",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            system_fallback: true,
        }
    }
}

/// Input and output directories. Relative paths resolve against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub backgrounds_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw"),
            backgrounds_dir: PathBuf::from("backgrounds"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PathsConfig {
    fn rebase(&mut self, base: &Path) {
        for p in [
            &mut self.raw_dir,
            &mut self.backgrounds_dir,
            &mut self.output_dir,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "storeshot=debug,warn").
    pub level: String,
    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Read, parse and validate a JSON config. Relative paths are rebased onto its directory.
    pub fn from_path(path: impl AsRef<Path>) -> StoreshotResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StoreshotError::config(format!("open config '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        cfg.paths.rebase(base);
        Ok(cfg)
    }

    pub fn from_reader(r: impl Read) -> StoreshotResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| StoreshotError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> StoreshotResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn validate(&self) -> StoreshotResult<()> {
        if self.devices.is_empty() {
            return Err(StoreshotError::config("at least one device is required"));
        }
        for (key, d) in &self.devices {
            if d.width == 0 || d.height == 0 {
                return Err(StoreshotError::config(format!(
                    "device '{key}' must have non-zero width and height"
                )));
            }
            if d.width > MAX_CANVAS_DIM || d.height > MAX_CANVAS_DIM {
                return Err(StoreshotError::config(format!(
                    "device '{key}' exceeds {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM}"
                )));
            }
        }

        let l = &self.layout;
        for (name, v) in [
            ("phone_scale", l.phone_scale),
            ("corner_radius", l.corner_radius),
            ("phone_y_offset", l.phone_y_offset),
            ("title_y", l.title_y),
            ("subtitle_y", l.subtitle_y),
            ("title_size", l.title_size),
            ("subtitle_size", l.subtitle_size),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(StoreshotError::config(format!(
                    "layout.{name} must be finite and >= 0"
                )));
            }
        }
        if l.phone_scale <= 0.0 || l.phone_scale > 1.0 {
            return Err(StoreshotError::config("layout.phone_scale must be in (0, 1]"));
        }

        let e = &self.effects;
        if e.scan_line_spacing == 0 {
            return Err(StoreshotError::config("effects.scan_line_spacing must be > 0"));
        }
        if !e.glow_blur.is_finite() || e.glow_blur < 0.0 {
            return Err(StoreshotError::config("effects.glow_blur must be finite and >= 0"));
        }
        for (name, v) in [
            ("vignette_opacity", e.vignette_opacity),
            ("scan_line_opacity", e.scan_line_opacity),
            ("glow_opacity", e.glow_opacity),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(StoreshotError::config(format!(
                    "effects.{name} must be in [0, 1]"
                )));
            }
        }

        let mut seen = HashSet::new();
        for s in &self.screenshots {
            if s.id.trim().is_empty() {
                return Err(StoreshotError::config("screenshot id must be non-empty"));
            }
            if s.id.contains(['/', '\\']) {
                return Err(StoreshotError::config(format!(
                    "screenshot id '{}' must not contain path separators",
                    s.id
                )));
            }
            if !seen.insert(s.id.as_str()) {
                return Err(StoreshotError::config(format!(
                    "duplicate screenshot id '{}'",
                    s.id
                )));
            }
        }

        Ok(())
    }

    pub fn device(&self, key: &str) -> StoreshotResult<DeviceProfile> {
        self.devices
            .get(key)
            .copied()
            .ok_or_else(|| StoreshotError::config(format!("unknown device '{key}'")))
    }
}
