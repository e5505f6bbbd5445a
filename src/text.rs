//! Glow text: a blurred translucent pass under a crisp pass, centered on an anchor.

pub mod bitmap;
pub mod font;
pub mod layout;

use crate::config::FontConfig;
use crate::effects::blur::blur_canvas;
use crate::effects::composite::over_in_place;
use crate::effects::raster::render_layer;
use crate::foundation::core::{Canvas, Point, Rgb8};
use crate::foundation::error::StoreshotResult;

pub use font::{FontFace, FontSource, resolve_font};
pub use layout::{TextBrushRgba8, TextLayoutEngine};

pub const DEFAULT_TEXT_GLOW_ALPHA: u8 = 180;

/// Draws glowing single-line text with a face resolved once up front.
pub struct TextRenderer {
    engine: TextLayoutEngine,
    face: FontFace,
    glow_alpha: u8,
}

impl TextRenderer {
    /// Resolve a face through the configured fallback chain.
    pub fn new(cfg: &FontConfig) -> Self {
        let mut engine = TextLayoutEngine::new();
        let face = resolve_font(cfg, &mut engine);
        Self {
            engine,
            face,
            glow_alpha: DEFAULT_TEXT_GLOW_ALPHA,
        }
    }

    /// A renderer that always uses the built-in bitmap font.
    pub fn builtin() -> Self {
        Self {
            engine: TextLayoutEngine::new(),
            face: FontFace::Builtin,
            glow_alpha: DEFAULT_TEXT_GLOW_ALPHA,
        }
    }

    pub fn with_glow_alpha(mut self, alpha: u8) -> Self {
        self.glow_alpha = alpha;
        self
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    pub fn description(&self) -> String {
        self.face.source().to_string()
    }

    /// Draw `text` centered horizontally on `anchor.x`, top edge at `anchor.y`.
    ///
    /// A copy at `glow_alpha` is blurred by `glow_radius` and composited first; the text is then
    /// drawn again fully opaque on top. Empty text leaves the canvas untouched.
    pub fn render_glow_text(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        anchor: Point,
        color: Rgb8,
        size_px: f32,
        glow_radius: f32,
    ) -> StoreshotResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let (w, h) = canvas.dimensions();

        let glow = self.text_layer(w, h, text, anchor, color, self.glow_alpha, size_px)?;
        let glow = blur_canvas(&glow, glow_radius)?;
        over_in_place(canvas.data_mut(), glow.data(), 1.0)?;

        let crisp = self.text_layer(w, h, text, anchor, color, 255, size_px)?;
        over_in_place(canvas.data_mut(), crisp.data(), 1.0)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn text_layer(
        &mut self,
        width: u32,
        height: u32,
        text: &str,
        anchor: Point,
        color: Rgb8,
        alpha: u8,
        size_px: f32,
    ) -> StoreshotResult<Canvas> {
        match &self.face {
            FontFace::Builtin => {
                let mut layer = Canvas::new(width, height)?;
                bitmap::draw_text(&mut layer, text, anchor, color.with_alpha(alpha), size_px);
                Ok(layer)
            }
            FontFace::Outline { family, font, .. } => {
                let brush = TextBrushRgba8 {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                    a: alpha,
                };
                let layout = self.engine.layout_line(text, family, size_px, brush)?;
                let x = anchor.x - f64::from(layout.width()) / 2.0;

                render_layer(width, height, |ctx| {
                    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, anchor.y)));
                    for line in layout.lines() {
                        for item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let brush = run.style().brush;
                            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                                brush.r, brush.g, brush.b, brush.a,
                            ));
                            // Absolute pen position: run offset plus advances, on the run baseline.
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                    Ok(())
                })
            }
        }
    }
}
