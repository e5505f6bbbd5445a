//! Font resolution: configured candidate files, then the system font database, then the built-in
//! bitmap face.

use std::fmt;
use std::path::PathBuf;

use crate::config::FontConfig;
use crate::text::layout::TextLayoutEngine;

/// Monospace families queried when no configured candidate loads, in preference order.
const SYSTEM_MONO_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Menlo",
    "Consolas",
];

/// Where a resolved face came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    System { family: String },
    Builtin,
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) => write!(f, "file '{}'", p.display()),
            Self::System { family } => write!(f, "system font '{family}'"),
            Self::Builtin => f.write_str("built-in bitmap font"),
        }
    }
}

/// A face usable by the text renderer.
#[derive(Clone)]
pub enum FontFace {
    Outline {
        source: FontSource,
        /// Family name registered with the layout engine.
        family: String,
        font: vello_cpu::peniko::FontData,
    },
    Builtin,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline { source, family, .. } => f
                .debug_struct("Outline")
                .field("source", source)
                .field("family", family)
                .finish_non_exhaustive(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontFace {
    pub fn source(&self) -> FontSource {
        match self {
            Self::Outline { source, .. } => source.clone(),
            Self::Builtin => FontSource::Builtin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// Pick the first face in the fallback chain that registers with `engine`.
///
/// Never fails: an environment without usable fonts still gets the built-in face.
pub fn resolve_font(cfg: &FontConfig, engine: &mut TextLayoutEngine) -> FontFace {
    for path in &cfg.candidates {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "font candidate unavailable");
                continue;
            }
        };
        match outline_face(engine, bytes, 0, FontSource::File(path.clone())) {
            Some(face) => return face,
            None => {
                tracing::warn!(path = %path.display(), "font candidate could not be registered");
            }
        }
    }

    if cfg.system_fallback
        && let Some(face) = system_monospace(engine)
    {
        return face;
    }

    tracing::warn!("no outline font available; using built-in bitmap font");
    FontFace::Builtin
}

fn system_monospace(engine: &mut TextLayoutEngine) -> Option<FontFace> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let mut families: Vec<usvg::fontdb::Family<'_>> = SYSTEM_MONO_FAMILIES
        .iter()
        .map(|&name| usvg::fontdb::Family::Name(name))
        .collect();
    families.push(usvg::fontdb::Family::Monospace);

    let id = db.query(&usvg::fontdb::Query {
        families: &families,
        weight: usvg::fontdb::Weight::BOLD,
        ..Default::default()
    })?;
    let family = db
        .face(id)
        .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "monospace".to_string());
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

    let face = outline_face(engine, bytes, index, FontSource::System { family });
    if face.is_none() {
        tracing::warn!("system monospace face could not be registered");
    }
    face
}

fn outline_face(
    engine: &mut TextLayoutEngine,
    bytes: Vec<u8>,
    index: u32,
    source: FontSource,
) -> Option<FontFace> {
    let family = engine.register_font(&bytes).ok()?;
    tracing::debug!(%source, %family, "resolved font");
    Some(FontFace::Outline {
        source,
        family,
        font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), index),
    })
}
