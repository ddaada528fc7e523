//! Greedy tile-to-cell assignment with reuse capping
//!
//! The full pass processes cells in row-major order and gives each cell the
//! eligible tile with minimum signature distance; exact ties break toward
//! the lower tile id so reruns are bit-identical. A tile's usage counter is
//! only incremented once its cell is finalized, so a failed pass can never
//! leave counters inconsistent. Cells with no eligible tile are left
//! unassigned rather than failing the pass; the caller may re-invoke once
//! the pool grows.
//!
//! The incremental path bounds recomputation to O(new tiles x cells): an
//! existing placement is only displaced when a newly added tile beats it by
//! more than the configured improvement threshold, which both caps the work
//! and keeps visually settled regions stable.

use crate::assignment::index::BucketIndex;
use crate::assignment::pool::{TileId, TileMask, TilePool};
use crate::io::configuration::{
    DEFAULT_IMPROVEMENT_THRESHOLD, MIN_SHORTLIST_CANDIDATES, SHORTLIST_POOL_THRESHOLD,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::signature::{DistanceWeights, Signature, distance};
use crate::spatial::Grid;

/// Parameters controlling assignment behavior
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssignmentParams {
    /// Maximum number of cells a single tile may occupy (None = unlimited)
    pub max_reuse: Option<u32>,
    /// Minimum distance gain required before an incremental update displaces
    /// an existing placement
    pub improvement_threshold: f64,
    /// Signature distance weights
    pub weights: DistanceWeights,
}

impl Default for AssignmentParams {
    fn default() -> Self {
        Self {
            max_reuse: None,
            improvement_threshold: DEFAULT_IMPROVEMENT_THRESHOLD,
            weights: DistanceWeights::default(),
        }
    }
}

impl AssignmentParams {
    fn validate(&self) -> Result<()> {
        if self.max_reuse == Some(0) {
            return Err(invalid_parameter(
                "max_reuse",
                &0,
                &"reuse cap must be at least 1 when set",
            ));
        }
        if !self.improvement_threshold.is_finite() || self.improvement_threshold < 0.0 {
            return Err(invalid_parameter(
                "improvement_threshold",
                &self.improvement_threshold,
                &"must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Cell-to-tile mapping for one mosaic at one version
///
/// Slots follow the grid's row-major cell order; `None` is the unassigned
/// sentinel. The aggregate distance sums the signature distances of all
/// assigned cells.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    slots: Vec<Option<TileId>>,
    aggregate_distance: f64,
    version: u64,
}

impl Assignment {
    /// Create an all-unassigned mapping for the given cell count, version 0
    pub fn empty(cell_count: usize) -> Self {
        Self {
            slots: vec![None; cell_count],
            aggregate_distance: 0.0,
            version: 0,
        }
    }

    /// Slots in row-major cell order
    pub fn slots(&self) -> &[Option<TileId>] {
        &self.slots
    }

    /// Assigned tile of the cell at the given row-major index
    pub fn tile_at(&self, index: usize) -> Option<TileId> {
        self.slots.get(index).copied().flatten()
    }

    /// Sum of signature distances over assigned cells
    pub const fn aggregate_distance(&self) -> f64 {
        self.aggregate_distance
    }

    /// Version number, incremented on every recomputation
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of assigned cells
    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Test whether every cell has a tile
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Number of cells assigned to the given tile
    pub fn usage_of(&self, id: TileId) -> usize {
        self.slots
            .iter()
            .filter(|slot| **slot == Some(id))
            .count()
    }
}

// Candidate search order for one cell: shortlist positions when an index is
// available, otherwise every eligible position. Ascending dense index order
// equals ascending id order, which makes the low-id tie-break fall out of a
// plain strict comparison.
fn best_candidate(
    cell_signature: &Signature,
    pool: &TilePool,
    mask: &TileMask,
    index: Option<&BucketIndex>,
    weights: &DistanceWeights,
) -> Option<(usize, f64)> {
    if let Some(index) = index {
        let shortlist = index.shortlist(cell_signature, MIN_SHORTLIST_CANDIDATES);
        let eligible = shortlist.iter().copied().filter(|p| mask.contains(*p));
        let best = best_among(cell_signature, pool, eligible, weights);
        if best.is_some() {
            return best;
        }
        // Shortlist exhausted by the reuse cap; fall through to a full scan
    }
    best_among(cell_signature, pool, mask.iter_ones(), weights)
}

fn best_among(
    cell_signature: &Signature,
    pool: &TilePool,
    positions: impl Iterator<Item = usize>,
    weights: &DistanceWeights,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for position in positions {
        let Some(record) = pool.record_at(position) else {
            continue;
        };
        let dist = distance(cell_signature, &record.signature, weights);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((position, dist)),
        }
    }
    best
}

fn finalize_use(
    pool: &mut TilePool,
    mask: &mut TileMask,
    position: usize,
    cap: Option<u32>,
) -> Result<TileId> {
    let used = pool.record_use(position)?;
    if cap.is_some_and(|cap| used >= cap) {
        mask.clear(position);
    }
    pool.record_at(position)
        .map(|record| record.id)
        .ok_or_else(|| invalid_parameter("position", &position, &"out of pool bounds"))
}

fn build_eligibility(pool: &TilePool, cap: Option<u32>) -> TileMask {
    let mut mask = TileMask::all(pool.len());
    if let Some(cap) = cap {
        for (position, record) in pool.iter().enumerate() {
            if record.usage >= cap {
                mask.clear(position);
            }
        }
    }
    mask
}

fn shortlist_index(pool: &TilePool) -> Option<BucketIndex> {
    (pool.len() > SHORTLIST_POOL_THRESHOLD).then(|| BucketIndex::build(pool))
}

fn aggregate_over(grid: &Grid, slots: &[Option<TileId>], pool: &TilePool, weights: &DistanceWeights) -> f64 {
    grid.cells()
        .iter()
        .zip(slots.iter())
        .filter_map(|(cell, slot)| {
            slot.and_then(|id| pool.get(id))
                .map(|record| distance(&cell.signature, &record.signature, weights))
        })
        .sum()
}

/// Compute a complete greedy assignment from empty state
///
/// `previous` only participates in version chaining and the empty-pool rule;
/// the pass itself always starts from scratch. Use this for the initial
/// assignment and for every forced recomputation (geometry change, tile
/// removal, reuse-limit change).
///
/// # Errors
///
/// Returns `MosaicError::EmptyPool` if the pool is empty and no previous
/// assignment exists, or `MosaicError::InvalidParameter` for bad params.
pub fn assign(
    grid: &Grid,
    pool: &mut TilePool,
    previous: Option<&Assignment>,
    params: &AssignmentParams,
) -> Result<Assignment> {
    params.validate()?;

    if pool.is_empty() && previous.is_none() {
        return Err(MosaicError::EmptyPool);
    }

    pool.reset_usage();
    let mut mask = TileMask::all(pool.len());
    let index = shortlist_index(pool);

    let mut slots = Vec::with_capacity(grid.cell_count());
    let mut aggregate = 0.0;

    for cell in grid.cells() {
        if mask.is_empty() {
            slots.push(None);
            continue;
        }
        match best_candidate(&cell.signature, pool, &mask, index.as_ref(), &params.weights) {
            Some((position, dist)) => {
                let id = finalize_use(pool, &mut mask, position, params.max_reuse)?;
                slots.push(Some(id));
                aggregate += dist;
            }
            None => slots.push(None),
        }
    }

    Ok(Assignment {
        slots,
        aggregate_distance: aggregate,
        version: previous.map_or(1, |p| p.version() + 1),
    })
}

/// Incrementally update an assignment after tiles were added to the pool
///
/// Valid only while geometry is unchanged and no tile was removed. Two
/// deterministic row-major passes: first every cell is tested against the
/// added tiles alone (existing placements are displaced only past the
/// improvement threshold), then still-unassigned cells retry against the
/// whole eligible pool, picking up any capacity freed by displacements.
/// The resulting aggregate distance never exceeds the previous one when the
/// previous assignment was complete.
///
/// # Errors
///
/// Returns `MosaicError::UnknownTile` if an added id or a previously
/// assigned id is missing from the pool (a removal requires a forced full
/// pass instead), or `MosaicError::InvalidParameter` if the previous
/// assignment does not match the grid's cell count.
pub fn assign_incremental(
    grid: &Grid,
    pool: &mut TilePool,
    previous: &Assignment,
    added: &[TileId],
    params: &AssignmentParams,
) -> Result<Assignment> {
    params.validate()?;

    if previous.slots().len() != grid.cell_count() {
        return Err(invalid_parameter(
            "previous_assignment",
            &previous.slots().len(),
            &format!("does not match the grid's {} cells", grid.cell_count()),
        ));
    }

    let mut added_positions = Vec::with_capacity(added.len());
    for id in added {
        let position = pool
            .position(*id)
            .ok_or(MosaicError::UnknownTile { id: id.0 })?;
        added_positions.push(position);
    }
    added_positions.sort_unstable();
    added_positions.dedup();

    // Usage counters derive from the surviving assignment, never carried
    // over blindly from earlier passes
    pool.reset_usage();
    let mut slots = previous.slots().to_vec();
    for slot in &slots {
        if let Some(id) = slot {
            let position = pool
                .position(*id)
                .ok_or(MosaicError::UnknownTile { id: id.0 })?;
            pool.record_use(position)?;
        }
    }

    let mut mask = build_eligibility(pool, params.max_reuse);

    // Pass 1: offer the added tiles to every cell
    for (cell, slot) in grid.cells().iter().zip(slots.iter_mut()) {
        let eligible_added = added_positions.iter().copied().filter(|p| mask.contains(*p));
        let Some((position, dist)) =
            best_among(&cell.signature, pool, eligible_added, &params.weights)
        else {
            continue;
        };

        match *slot {
            None => {
                let id = finalize_use(pool, &mut mask, position, params.max_reuse)?;
                *slot = Some(id);
            }
            Some(current) => {
                let current_position = pool
                    .position(current)
                    .ok_or(MosaicError::UnknownTile { id: current.0 })?;
                let current_dist = pool
                    .record_at(current_position)
                    .map(|record| distance(&cell.signature, &record.signature, &params.weights))
                    .unwrap_or(f64::INFINITY);

                if current_dist - dist > params.improvement_threshold {
                    pool.release_use(current_position)?;
                    mask.set(current_position);
                    let id = finalize_use(pool, &mut mask, position, params.max_reuse)?;
                    *slot = Some(id);
                }
            }
        }
    }

    // Pass 2: still-unassigned cells retry against the whole eligible pool
    let index = shortlist_index(pool);
    for (cell, slot) in grid.cells().iter().zip(slots.iter_mut()) {
        if slot.is_some() || mask.is_empty() {
            continue;
        }
        if let Some((position, _)) =
            best_candidate(&cell.signature, pool, &mask, index.as_ref(), &params.weights)
        {
            let id = finalize_use(pool, &mut mask, position, params.max_reuse)?;
            *slot = Some(id);
        }
    }

    let aggregate = aggregate_over(grid, &slots, pool, &params.weights);

    Ok(Assignment {
        slots,
        aggregate_distance: aggregate,
        version: previous.version() + 1,
    })
}
