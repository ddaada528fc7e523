//! Spatial data structures for target partitioning
//!
//! This module contains grid-related functionality including:
//! - Cell addressing and pixel bounding boxes
//! - Grid construction with exact pixel coverage
//! - Grid shape fitting for a requested cell count

/// Grid construction and cell management
pub mod grid;

pub use grid::{Cell, CellId, Grid, build_grid, fit_grid};
