//! Mosaic project state and lifecycle
//!
//! A `MosaicProject` aggregates the target reference, grid geometry, the
//! project-scoped tile pool, and the current assignment. It exclusively
//! owns its grid and assignment; tile pixel bytes stay with the
//! surrounding storage layer. All mutation goes through the project so
//! usage counters and the version counter can never race within one
//! project — callers serialize concurrent updates per project.

/// Snapshot persistence for projects
pub mod snapshot;

use crate::assignment::{
    Assignment, AssignmentParams, TileId, TilePool, assign, assign_incremental,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::render::{RenderOptions, TileImageResolver, render};
use crate::signature::{Signature, extract};
use crate::spatial::{Grid, build_grid};
use image::RgbaImage;

pub use snapshot::{ProjectSnapshot, load_snapshot, save_snapshot};

/// Lifecycle phase of a mosaic project
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProjectPhase {
    /// Grid built, no cell assigned yet
    Created,
    /// Some cells assigned
    Partial,
    /// Every cell assigned
    Complete,
}

impl std::fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Partial => write!(f, "partial"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// A rendered composite tagged with the assignment version it was produced
/// from, so the surrounding service can detect staleness
#[derive(Debug, Clone)]
pub struct RenderedComposite {
    /// The composite image
    pub image: RgbaImage,
    /// Assignment version the image reflects
    pub version: u64,
}

/// One community mosaic: target reference, grid, pool, and assignment
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicProject {
    id: String,
    target_ref: String,
    grid: Grid,
    pool: TilePool,
    assignment: Assignment,
    params: AssignmentParams,
}

impl MosaicProject {
    /// Create a project by partitioning the target image
    ///
    /// The target image itself is not retained; only the grid (with cell
    /// signatures) and the opaque `target_ref` the caller uses to locate
    /// the image again.
    ///
    /// # Errors
    ///
    /// Propagates grid construction and parameter validation errors.
    pub fn create(
        id: impl Into<String>,
        target_ref: impl Into<String>,
        target: &RgbaImage,
        rows: u32,
        cols: u32,
        params: AssignmentParams,
    ) -> Result<Self> {
        let grid = build_grid(target, rows, cols)?;
        let assignment = Assignment::empty(grid.cell_count());
        Ok(Self {
            id: id.into(),
            target_ref: target_ref.into(),
            grid,
            pool: TilePool::new(),
            assignment,
            params,
        })
    }

    /// Project identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opaque reference to the target image
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// The immutable grid for the current geometry
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The project-scoped tile pool
    pub const fn pool(&self) -> &TilePool {
        &self.pool
    }

    /// The current assignment
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Assignment parameters in effect
    pub const fn params(&self) -> &AssignmentParams {
        &self.params
    }

    /// Current assignment version
    pub const fn version(&self) -> u64 {
        self.assignment.version()
    }

    /// Current lifecycle phase, derived from the assignment
    pub fn phase(&self) -> ProjectPhase {
        let assigned = self.assignment.assigned_count();
        if assigned == 0 {
            ProjectPhase::Created
        } else if assigned == self.grid.cell_count() {
            ProjectPhase::Complete
        } else {
            ProjectPhase::Partial
        }
    }

    /// Add one eligible tile image and incrementally update the assignment
    ///
    /// # Errors
    ///
    /// Propagates signature extraction, duplicate-id, and assignment errors.
    pub fn add_tile(&mut self, id: TileId, tile: &RgbaImage) -> Result<()> {
        let signature = extract(tile)?;
        self.add_tile_signatures(std::iter::once((id, signature)))
            .map(|_| ())
    }

    /// Add a batch of pre-extracted tile signatures and update once
    ///
    /// All tiles enter the pool first, then a single incremental pass runs,
    /// so bulk ingestion costs one recomputation. Returns the number of
    /// tiles added.
    ///
    /// # Errors
    ///
    /// Propagates duplicate-id and assignment errors. On error the pool may
    /// hold some of the batch, but the assignment is left untouched.
    pub fn add_tile_signatures(
        &mut self,
        tiles: impl IntoIterator<Item = (TileId, Signature)>,
    ) -> Result<usize> {
        let mut added = Vec::new();
        for (id, signature) in tiles {
            self.pool.insert(id, signature)?;
            added.push(id);
        }
        if added.is_empty() {
            return Ok(0);
        }

        self.assignment = if self.has_assignment_history() {
            assign_incremental(&self.grid, &mut self.pool, &self.assignment, &added, &self.params)?
        } else {
            assign(&self.grid, &mut self.pool, None, &self.params)?
        };
        Ok(added.len())
    }

    /// Remove a tile from the pool, forcing a full recomputation when it
    /// was present
    ///
    /// Cells that held the removed tile are reassigned by the full pass,
    /// never left dangling on a removed id. Returns whether the tile was
    /// present.
    ///
    /// # Errors
    ///
    /// Propagates assignment errors from the forced full pass.
    pub fn remove_tile(&mut self, id: TileId) -> Result<bool> {
        if !self.pool.remove(id) {
            return Ok(false);
        }
        self.reassign_full()?;
        Ok(true)
    }

    /// Force a complete greedy recomputation from empty state
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::EmptyPool` when the pool is empty and no
    /// assignment history exists.
    pub fn force_reassign(&mut self) -> Result<()> {
        self.reassign_full()
    }

    /// Change the reuse limit, forcing a full recomputation
    ///
    /// # Errors
    ///
    /// Propagates parameter validation and assignment errors.
    pub fn set_max_reuse(&mut self, max_reuse: Option<u32>) -> Result<()> {
        self.params.max_reuse = max_reuse;
        if self.pool.is_empty() && !self.has_assignment_history() {
            return Ok(());
        }
        self.reassign_full()
    }

    /// Rebuild the grid with a new geometry and recompute from empty state
    ///
    /// The target image must be supplied again because the project does not
    /// retain pixel data.
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::InvalidParameter` if the target's dimensions
    /// disagree with the recorded geometry; propagates grid construction
    /// and assignment errors.
    pub fn set_geometry(&mut self, target: &RgbaImage, rows: u32, cols: u32) -> Result<()> {
        if target.dimensions() != (self.grid.target_width(), self.grid.target_height()) {
            return Err(invalid_parameter(
                "target",
                &format!("{}x{}", target.width(), target.height()),
                &format!(
                    "does not match the recorded {}x{} target",
                    self.grid.target_width(),
                    self.grid.target_height()
                ),
            ));
        }
        let previous = self.assignment.clone();
        self.grid = build_grid(target, rows, cols)?;
        if self.pool.is_empty() && !self.has_assignment_history() {
            self.assignment = Assignment::empty(self.grid.cell_count());
            return Ok(());
        }
        // Geometry changed: the old mapping is meaningless, but the version
        // counter keeps climbing so stale renders remain detectable
        self.assignment = assign(&self.grid, &mut self.pool, Some(&previous), &self.params)?;
        Ok(())
    }

    /// Render the current composite, tagged with its assignment version
    ///
    /// # Errors
    ///
    /// Propagates rendering and tile resolution errors.
    pub fn render_current(
        &self,
        resolver: &dyn TileImageResolver,
        options: &RenderOptions,
    ) -> Result<RenderedComposite> {
        let image = render(&self.grid, &self.assignment, resolver, options)?;
        Ok(RenderedComposite {
            image,
            version: self.assignment.version(),
        })
    }

    fn has_assignment_history(&self) -> bool {
        self.assignment.version() > 0
    }

    fn reassign_full(&mut self) -> Result<()> {
        let previous = self.has_assignment_history().then(|| self.assignment.clone());
        if self.pool.is_empty() && previous.is_none() {
            return Err(MosaicError::EmptyPool);
        }
        self.assignment = assign(&self.grid, &mut self.pool, previous.as_ref(), &self.params)?;
        Ok(())
    }
}
