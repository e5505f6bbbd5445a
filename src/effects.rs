//! Full-canvas effect layers and the raster primitives they are built from.

pub mod blur;
pub mod composite;
pub mod glow;
pub mod raster;
pub mod scanlines;
pub mod vignette;
