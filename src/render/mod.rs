//! Composite image rendering
//!
//! This module contains rendering functionality including:
//! - The tile image resolution capability boundary
//! - Center-crop tile fitting and placeholder fills
//! - Optional blending of tiles against the target pixels

/// Compositor implementation and rendering options
pub mod compositor;

pub use compositor::{RenderOptions, TileImageResolver, render, render_blended};
