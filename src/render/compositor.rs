//! Composite rendering of an assignment into a single image
//!
//! Every assigned cell's tile image is resolved through a caller-supplied
//! capability, center-cropped to the cell's aspect (mosaics tile
//! edge-to-edge, never letterbox), resized to the cell's exact pixel box,
//! and written at the cell's offset. Unassigned cells are filled with a
//! configurable placeholder color. Rendering is pure given its inputs and
//! safe to repeat for intermediate states.

use crate::assignment::engine::Assignment;
use crate::assignment::pool::TileId;
use crate::io::configuration::DEFAULT_PLACEHOLDER;
use crate::io::error::{Result, invalid_image, invalid_parameter};
use crate::spatial::{Cell, Grid};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use num_traits::{FromPrimitive, ToPrimitive};

/// Capability interface for resolving tile pixel data at render time
///
/// The engine never fetches tile bytes itself; the surrounding storage
/// layer supplies this resolver.
pub trait TileImageResolver {
    /// Resolve the image for a tile id
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::UnknownTile` if the id cannot be resolved, or
    /// an image loading error from the underlying storage.
    fn resolve(&self, id: TileId) -> Result<RgbaImage>;
}

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Fill color for unassigned cells
    pub placeholder: Rgba<u8>,
    /// Optional tile opacity against the target pixels (0.0 = pure target,
    /// 1.0 = pure tile); requires rendering with a target image
    pub blend: Option<f32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder: Rgba(DEFAULT_PLACEHOLDER),
            blend: None,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> Result<()> {
        if let Some(blend) = self.blend {
            if !(0.0..=1.0).contains(&blend) {
                return Err(invalid_parameter(
                    "blend",
                    &blend,
                    &"must lie in 0.0..=1.0",
                ));
            }
        }
        Ok(())
    }
}

// Linear interpolation on any primitive channel type
fn lerp<T: ToPrimitive + FromPrimitive>(from: T, to: T, t: f64) -> T {
    let a = from.to_f64().unwrap_or(0.0);
    let b = to.to_f64().unwrap_or(0.0);
    T::from_f64((a + (b - a) * t).round()).unwrap_or(from)
}

// Scale and center-crop a tile image to exactly cell_width x cell_height
fn fit_to_cell(tile: &RgbaImage, cell_width: u32, cell_height: u32) -> Result<RgbaImage> {
    let (tile_width, tile_height) = tile.dimensions();
    if tile_width == 0 || tile_height == 0 {
        return Err(invalid_image(&"zero-area tile image"));
    }

    // Widest crop of the tile that matches the cell aspect ratio
    let (crop_width, crop_height) = if u64::from(tile_width) * u64::from(cell_height)
        > u64::from(tile_height) * u64::from(cell_width)
    {
        let width = (u64::from(tile_height) * u64::from(cell_width) / u64::from(cell_height))
            .max(1) as u32;
        (width.min(tile_width), tile_height)
    } else {
        let height = (u64::from(tile_width) * u64::from(cell_height) / u64::from(cell_width))
            .max(1) as u32;
        (tile_width, height.min(tile_height))
    };

    let x = (tile_width - crop_width) / 2;
    let y = (tile_height - crop_height) / 2;
    let cropped = imageops::crop_imm(tile, x, y, crop_width, crop_height).to_image();

    Ok(imageops::resize(
        &cropped,
        cell_width,
        cell_height,
        FilterType::Triangle,
    ))
}

fn blit_cell(
    output: &mut RgbaImage,
    cell: &Cell,
    fitted: &RgbaImage,
    target: Option<&RgbaImage>,
    blend: Option<f32>,
) {
    match (target, blend) {
        (Some(target), Some(blend)) => {
            let opacity = f64::from(blend);
            for (dx, dy, pixel) in fitted.enumerate_pixels() {
                let (x, y) = (cell.x + dx, cell.y + dy);
                let Some(base) = target.get_pixel_checked(x, y) else {
                    continue;
                };
                let mixed = Rgba([
                    lerp(base.0[0], pixel.0[0], opacity),
                    lerp(base.0[1], pixel.0[1], opacity),
                    lerp(base.0[2], pixel.0[2], opacity),
                    255,
                ]);
                if let Some(out) = output.get_pixel_mut_checked(x, y) {
                    *out = mixed;
                }
            }
        }
        _ => imageops::replace(output, fitted, i64::from(cell.x), i64::from(cell.y)),
    }
}

fn compose(
    grid: &Grid,
    assignment: &Assignment,
    resolver: &dyn TileImageResolver,
    target: Option<&RgbaImage>,
    options: &RenderOptions,
) -> Result<RgbaImage> {
    options.validate()?;

    if assignment.slots().len() != grid.cell_count() {
        return Err(invalid_parameter(
            "assignment",
            &assignment.slots().len(),
            &format!("does not match the grid's {} cells", grid.cell_count()),
        ));
    }

    let mut output = RgbaImage::from_pixel(
        grid.target_width(),
        grid.target_height(),
        options.placeholder,
    );

    for (cell, slot) in grid.cells().iter().zip(assignment.slots().iter()) {
        let Some(id) = slot else {
            continue;
        };
        let tile = resolver.resolve(*id)?;
        let fitted = fit_to_cell(&tile, cell.width, cell.height)?;
        blit_cell(&mut output, cell, &fitted, target, options.blend);
    }

    Ok(output)
}

/// Render the composite for an assignment
///
/// Output dimensions equal the target's full pixel dimensions. Calling
/// twice with unchanged inputs produces identical images.
///
/// # Errors
///
/// Returns an error if the assignment does not match the grid, a tile
/// cannot be resolved, or a resolved tile image has zero area.
pub fn render(
    grid: &Grid,
    assignment: &Assignment,
    resolver: &dyn TileImageResolver,
    options: &RenderOptions,
) -> Result<RgbaImage> {
    compose(grid, assignment, resolver, None, options)
}

/// Render the composite with tiles blended against the target pixels
///
/// Applies `options.blend` as tile opacity over the target image, the
/// classic community-mosaic look where the original shows through each
/// placed photo. The target must match the grid's pixel dimensions.
///
/// # Errors
///
/// As [`render`], plus `MosaicError::InvalidParameter` if the target
/// dimensions disagree with the grid or the blend factor is out of range.
pub fn render_blended(
    grid: &Grid,
    assignment: &Assignment,
    resolver: &dyn TileImageResolver,
    target: &RgbaImage,
    options: &RenderOptions,
) -> Result<RgbaImage> {
    if target.dimensions() != (grid.target_width(), grid.target_height()) {
        return Err(invalid_parameter(
            "target",
            &format!("{}x{}", target.width(), target.height()),
            &format!(
                "does not match the grid's {}x{} target",
                grid.target_width(),
                grid.target_height()
            ),
        ));
    }
    compose(grid, assignment, resolver, Some(target), options)
}
