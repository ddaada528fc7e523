//! Target image partitioning into an addressable cell grid
//!
//! Divides a target image into rows x cols cells that cover every pixel with
//! no gaps or overlaps. Remainder pixels are distributed by rounding each
//! boundary to the nearest pixel instead of accumulating into a border strip.
//! Each cell's signature is computed once at build time and is immutable for
//! the lifetime of the grid geometry.

use crate::io::configuration::{MAX_GRID_DIMENSION, UNUSED_AREA_WEIGHT};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::signature::{Signature, extract};
use image::RgbaImage;
use image::imageops;

/// Grid cell address as (row, col), row-major ordered
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CellId {
    /// Zero-based row index
    pub row: u32,
    /// Zero-based column index
    pub col: u32,
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One grid cell: pixel bounding box within the target plus its signature
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    /// Grid address
    pub id: CellId,
    /// Left edge in target pixels (inclusive)
    pub x: u32,
    /// Top edge in target pixels (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Signature of the target sub-region covered by this cell
    pub signature: Signature,
}

/// Ordered collection of cells covering a target image
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    rows: u32,
    cols: u32,
    target_width: u32,
    target_height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Number of rows
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Width of the target image in pixels
    pub const fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Height of the target image in pixels
    pub const fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Total number of cells (`rows * cols`)
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major index of a cell address, if it lies within the grid
    pub fn index_of(&self, id: CellId) -> Option<usize> {
        (id.row < self.rows && id.col < self.cols)
            .then(|| (id.row * self.cols + id.col) as usize)
    }

    /// Look up a cell by address
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.index_of(id).and_then(|index| self.cells.get(index))
    }
}

// Pixel boundary of partition k out of n over the given extent
fn boundary(k: u32, extent: u32, n: u32) -> u32 {
    ((f64::from(k) * f64::from(extent)) / f64::from(n)).round() as u32
}

/// Partition a target image into a rows x cols grid and compute every
/// cell's signature from its cropped sub-region
///
/// # Errors
///
/// Returns `MosaicError::InvalidGeometry` if rows or cols are zero, exceed
/// the image pixel dimensions, or exceed `MAX_GRID_DIMENSION`. Returns
/// `MosaicError::InvalidImage` if the target has zero area.
pub fn build_grid(target: &RgbaImage, rows: u32, cols: u32) -> Result<Grid> {
    let (width, height) = target.dimensions();

    let geometry_error = |reason: &'static str| MosaicError::InvalidGeometry {
        rows,
        cols,
        width,
        height,
        reason,
    };

    if width == 0 || height == 0 {
        return Err(crate::io::error::invalid_image(&"zero-area target image"));
    }
    if rows == 0 || cols == 0 {
        return Err(geometry_error("rows and cols must be positive"));
    }
    if rows > height || cols > width {
        return Err(geometry_error("more cells than pixels along an axis"));
    }
    if rows > MAX_GRID_DIMENSION || cols > MAX_GRID_DIMENSION {
        return Err(geometry_error("grid dimension exceeds safety limit"));
    }

    let mut cells = Vec::with_capacity((rows as usize) * (cols as usize));
    for row in 0..rows {
        let y0 = boundary(row, height, rows);
        let y1 = boundary(row + 1, height, rows);
        for col in 0..cols {
            let x0 = boundary(col, width, cols);
            let x1 = boundary(col + 1, width, cols);

            let region = imageops::crop_imm(target, x0, y0, x1 - x0, y1 - y0).to_image();
            let signature = extract(&region)?;

            cells.push(Cell {
                id: CellId { row, col },
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
                signature,
            });
        }
    }

    Ok(Grid {
        rows,
        cols,
        target_width: width,
        target_height: height,
        cells,
    })
}

/// Choose a grid shape approximating a requested cell count
///
/// For a target of `width` x `height` pixels and a desired cell aspect ratio,
/// scans integer multiples of the reduced aspect and scores each candidate by
/// its deviation from `target_cells` plus a penalty for the remainder area
/// its ideal cell size would leave uncovered. Returns the best `(rows, cols)`.
///
/// # Errors
///
/// Returns `MosaicError::InvalidParameter` if `target_cells` is zero, the
/// aspect ratio has a zero component, or the image is too small to hold a
/// single cell of the requested aspect.
pub fn fit_grid(
    width: u32,
    height: u32,
    target_cells: u32,
    aspect: (u32, u32),
) -> Result<(u32, u32)> {
    if target_cells == 0 {
        return Err(invalid_parameter(
            "target_cells",
            &target_cells,
            &"must be positive",
        ));
    }
    if aspect.0 == 0 || aspect.1 == 0 {
        return Err(invalid_parameter(
            "aspect",
            &format!("{}:{}", aspect.0, aspect.1),
            &"both components must be positive",
        ));
    }

    let divisor = gcd(aspect.0, aspect.1);
    let (aspect_w, aspect_h) = (aspect.0 / divisor, aspect.1 / divisor);

    let mut best: Option<(f64, u32, u32)> = None;
    let total_area = f64::from(width) * f64::from(height);

    for multiple in 1.. {
        let cell_w = aspect_w * multiple;
        let cell_h = aspect_h * multiple;
        if cell_w > width || cell_h > height {
            break;
        }

        let cols = width / cell_w;
        let rows = height / cell_h;
        let cell_count = rows * cols;

        // Candidates far below the target only get worse as cells grow
        if cell_count < target_cells / 4 && best.is_some() {
            break;
        }

        let unused = f64::from(width % cell_w) * f64::from(height % cell_h);
        let score = f64::from(cell_count.abs_diff(target_cells))
            + UNUSED_AREA_WEIGHT * unused / total_area;

        match best {
            Some((best_score, _, _)) if best_score <= score => {}
            _ => best = Some((score, rows, cols)),
        }
    }

    best.map(|(_, rows, cols)| (rows, cols)).ok_or_else(|| {
        invalid_parameter(
            "target_cells",
            &target_cells,
            &format!("image {width}x{height} cannot hold a {aspect_w}:{aspect_h} cell"),
        )
    })
}

const fn gcd(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
