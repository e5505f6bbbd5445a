//! Storeshot composites raw device captures into store-listing screenshots.
//!
//! Each screenshot/device pair goes through a fixed layer order:
//!
//! - background (pre-rendered asset or vertical gradient)
//! - accent vignette, then scan lines
//! - blurred accent glow behind the subject
//! - the subject itself, scaled with rounded corners and a drop shadow
//! - title and subtitle glow-text
//!
//! Load a [`Config`], build a [`BackgroundResolver`] and a [`TextRenderer`], then drive a
//! [`Compositor`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod compositor;
pub mod config;
pub mod effects;
mod foundation;
pub mod logging;
pub mod subject;
pub mod text;

pub use crate::assets::{BackgroundKey, BackgroundResolver};
pub use crate::compositor::{Compositor, PairOutcome, PairReport, RunReport};
pub use crate::config::{
    BackgroundConfig, BackgroundStrategy, Config, DeviceProfile, EffectsConfig, FontConfig,
    LayoutParams, LoggingConfig, PathsConfig, ScreenshotEntry,
};
pub use crate::foundation::core::{Canvas, PixelRect, Point, Rect, Rgb8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{StoreshotError, StoreshotResult};
pub use crate::foundation::math;
pub use crate::subject::{Placement, SubjectLayer, SubjectParams, process_subject};
pub use crate::text::{FontFace, FontSource, TextRenderer};
