//! Per-pair pipeline: background, effects, subject, text, export.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::{
    BackgroundResolver, RAW_EXTENSIONS, find_with_extensions, load_image, raw_stem,
};
use crate::config::{Config, DeviceProfile, ScreenshotEntry};
use crate::effects::glow::{GlowParams, apply_accent_glow};
use crate::effects::scanlines::apply_scan_lines;
use crate::effects::vignette::apply_vignette;
use crate::foundation::core::{Canvas, Point, Rgb8};
use crate::foundation::error::{StoreshotError, StoreshotResult};
use crate::subject::{SubjectParams, process_subject};
use crate::text::TextRenderer;

/// Result of compositing one screenshot on one device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairOutcome {
    Composited { output: PathBuf },
    /// The raw capture was not found; nothing was written.
    Skipped { expected: PathBuf },
    /// An asset existed but could not be decoded.
    Failed { error: String },
}

impl fmt::Display for PairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composited { output } => write!(f, "[OK] {}", output.display()),
            Self::Skipped { expected } => write!(f, "[SKIP] {} not found", expected.display()),
            Self::Failed { error } => write!(f, "[FAIL] {error}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairReport {
    pub screenshot: String,
    pub device: String,
    pub outcome: PairOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    pub fn composited(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Composited { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Failed { .. }))
    }

    pub fn outcome(&self, screenshot: &str, device: &str) -> Option<&PairOutcome> {
        self.pairs
            .iter()
            .find(|p| p.screenshot == screenshot && p.device == device)
            .map(|p| &p.outcome)
    }

    fn count(&self, f: impl Fn(&PairOutcome) -> bool) -> usize {
        self.pairs.iter().filter(|p| f(&p.outcome)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} composited, {} skipped, {} failed",
            self.composited(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Runs the fixed compositing order for every screenshot/device pair of a [`Config`].
pub struct Compositor<'a> {
    config: &'a Config,
    backgrounds: &'a BackgroundResolver,
    text: TextRenderer,
}

impl<'a> Compositor<'a> {
    pub fn new(config: &'a Config, backgrounds: &'a BackgroundResolver, text: TextRenderer) -> Self {
        Self {
            config,
            backgrounds,
            text: text.with_glow_alpha(config.effects.text_glow_alpha),
        }
    }

    pub fn text_renderer(&self) -> &TextRenderer {
        &self.text
    }

    /// Composite every screenshot on every device, in device-key order.
    ///
    /// Missing and undecodable inputs are recorded in the report; anything else aborts the run.
    pub fn run(&mut self) -> StoreshotResult<RunReport> {
        let config = self.config;
        let out_dir = &config.paths.output_dir;
        std::fs::create_dir_all(out_dir).map_err(|e| {
            StoreshotError::io(format!("create output dir '{}': {e}", out_dir.display()))
        })?;

        let mut report = RunReport::default();
        for shot in &config.screenshots {
            tracing::info!(screenshot = %shot.id, title = %shot.title, "processing");
            for device_key in config.devices.keys() {
                let outcome = self.compose_pair(shot, device_key)?;
                report.pairs.push(PairReport {
                    screenshot: shot.id.clone(),
                    device: device_key.clone(),
                    outcome,
                });
            }
        }
        tracing::info!(
            composited = report.composited(),
            skipped = report.skipped(),
            failed = report.failed(),
            output = %out_dir.display(),
            "run finished"
        );
        Ok(report)
    }

    /// Composite one pair and write `{output_dir}/{id}_{device}.png`.
    #[tracing::instrument(skip(self, shot), fields(screenshot = %shot.id))]
    pub fn compose_pair(
        &mut self,
        shot: &ScreenshotEntry,
        device_key: &str,
    ) -> StoreshotResult<PairOutcome> {
        let device = self.config.device(device_key)?;
        let stem = raw_stem(&shot.id, device_key);
        let raw_dir = &self.config.paths.raw_dir;

        let Some(raw_path) = find_with_extensions(raw_dir, &stem, RAW_EXTENSIONS) else {
            let expected = raw_dir.join(format!("{stem}.png"));
            tracing::warn!(expected = %expected.display(), "raw capture not found, skipping");
            return Ok(PairOutcome::Skipped { expected });
        };

        let raw = match load_image(&raw_path) {
            Ok(img) => img,
            Err(e) if !e.is_fatal() => return Ok(failed(e)),
            Err(e) => return Err(e),
        };

        let background = match self.backgrounds.resolve(device.width, device.height, shot) {
            Ok(c) => c,
            Err(e) if !e.is_fatal() && !self.backgrounds.is_shared(shot) => return Ok(failed(e)),
            Err(e) => return Err(e),
        };

        let canvas = match self.render_on(background, shot, device, &raw) {
            Ok(c) => c,
            Err(e) if !e.is_fatal() => return Ok(failed(e)),
            Err(e) => return Err(e),
        };

        let output = self.config.paths.output_dir.join(format!("{stem}.png"));
        write_png(&canvas, &output)?;
        tracing::info!(output = %output.display(), "composited");
        Ok(PairOutcome::Composited { output })
    }

    /// Render a pair in memory, resolving its background through the shared resolver.
    pub fn render_pair(
        &mut self,
        shot: &ScreenshotEntry,
        device: DeviceProfile,
        raw: &image::RgbaImage,
    ) -> StoreshotResult<Canvas> {
        let background = self.backgrounds.resolve(device.width, device.height, shot)?;
        self.render_on(background, shot, device, raw)
    }

    fn render_on(
        &mut self,
        background: Canvas,
        shot: &ScreenshotEntry,
        device: DeviceProfile,
        raw: &image::RgbaImage,
    ) -> StoreshotResult<Canvas> {
        let (w, h) = (device.width, device.height);
        if background.dimensions() != (w, h) {
            return Err(StoreshotError::render(format!(
                "background is {}x{}, device is {w}x{h}",
                background.width(),
                background.height()
            )));
        }
        let config = self.config;
        let layout = &config.layout;
        let fx = &config.effects;

        let canvas = apply_vignette(background, shot.accent, fx.vignette_opacity);
        let canvas = apply_scan_lines(canvas, fx.scan_line_opacity, fx.scan_line_spacing)?;

        let subject = process_subject(raw, SubjectParams::from_layout(layout, w, fx.shadow_alpha))?;
        let placement = subject.placement(w, h, layout.phone_y_offset);

        let glow = GlowParams {
            opacity: fx.glow_opacity,
            steps: fx.glow_steps,
            blur: fx.glow_blur,
        };
        let mut canvas = apply_accent_glow(canvas, shot.accent, placement.subject.to_rect(), glow)?;
        subject.paste_onto(&mut canvas, placement);

        let center_x = f64::from(w / 2);
        let title_size = font_size(w, layout.title_size);
        let subtitle_size = font_size(w, layout.subtitle_size);

        self.text.render_glow_text(
            &mut canvas,
            &shot.title,
            Point::new(center_x, row_at(h, layout.title_y)),
            shot.accent,
            title_size,
            layout.glow_radius as f32,
        )?;
        self.text.render_glow_text(
            &mut canvas,
            &shot.subtitle,
            Point::new(center_x, row_at(h, layout.subtitle_y)),
            Rgb8::WHITE,
            subtitle_size,
            (layout.glow_radius / 2) as f32,
        )?;

        Ok(canvas)
    }
}

fn failed(e: StoreshotError) -> PairOutcome {
    tracing::warn!(error = %e, "pair failed");
    PairOutcome::Failed {
        error: e.to_string(),
    }
}

fn font_size(canvas_width: u32, fraction: f64) -> f32 {
    ((f64::from(canvas_width) * fraction).floor() as f32).max(1.0)
}

fn row_at(height: u32, fraction: f64) -> f64 {
    (f64::from(height) * fraction).floor()
}

/// Flatten to opaque RGB and encode as PNG.
pub fn write_png(canvas: &Canvas, path: &Path) -> StoreshotResult<()> {
    let rgb = canvas.to_rgb_image()?;
    rgb.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| StoreshotError::io(format!("write '{}': {e}", path.display())))
}
