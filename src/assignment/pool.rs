//! Tile pool management with usage tracking
//!
//! The pool holds every eligible candidate tile as an id plus signature;
//! tile pixel bytes stay with the surrounding storage layer. Records are
//! kept sorted by id so iteration order (and therefore every downstream
//! computation) is deterministic.

use crate::io::error::{Result, invalid_parameter};
use crate::signature::{BrightnessBand, Signature};
use bitvec::prelude::*;

/// Stable identifier of a candidate tile
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TileId(pub u64);

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pool entry: tile id, signature, and current usage count
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TileRecord {
    /// Stable tile id
    pub id: TileId,
    /// Visual signature of the tile image
    pub signature: Signature,
    /// Number of cells currently assigned to this tile
    pub usage: u32,
}

/// Set of eligible candidate tiles scoped to one mosaic project
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TilePool {
    // Sorted by id; position in this vector is the tile's dense index
    tiles: Vec<TileRecord>,
}

impl TilePool {
    /// Create an empty pool
    pub const fn new() -> Self {
        Self { tiles: Vec::new() }
    }

    /// Number of tiles in the pool
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Test whether the pool holds no tiles
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Insert a tile with the given id and signature
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::InvalidParameter` if the id is already present.
    pub fn insert(&mut self, id: TileId, signature: Signature) -> Result<()> {
        match self.tiles.binary_search_by_key(&id, |record| record.id) {
            Ok(_) => Err(invalid_parameter(
                "tile_id",
                &id,
                &"already present in the pool",
            )),
            Err(position) => {
                self.tiles.insert(
                    position,
                    TileRecord {
                        id,
                        signature,
                        usage: 0,
                    },
                );
                Ok(())
            }
        }
    }

    /// Remove a tile by id, returning whether it was present
    pub fn remove(&mut self, id: TileId) -> bool {
        match self.tiles.binary_search_by_key(&id, |record| record.id) {
            Ok(position) => {
                self.tiles.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Test whether a tile id is present
    pub fn contains(&self, id: TileId) -> bool {
        self.position(id).is_some()
    }

    /// Dense index of a tile id, if present
    pub fn position(&self, id: TileId) -> Option<usize> {
        self.tiles
            .binary_search_by_key(&id, |record| record.id)
            .ok()
    }

    /// Look up a record by id
    pub fn get(&self, id: TileId) -> Option<&TileRecord> {
        self.position(id).and_then(|index| self.tiles.get(index))
    }

    /// Look up a record by dense index
    pub fn record_at(&self, position: usize) -> Option<&TileRecord> {
        self.tiles.get(position)
    }

    /// Records in ascending id order
    pub fn iter(&self) -> std::slice::Iter<'_, TileRecord> {
        self.tiles.iter()
    }

    /// First id strictly greater than every id in the pool
    pub fn next_id(&self) -> TileId {
        TileId(self.tiles.last().map_or(0, |record| record.id.0 + 1))
    }

    /// Reset every usage counter to zero
    pub fn reset_usage(&mut self) {
        for record in &mut self.tiles {
            record.usage = 0;
        }
    }

    /// Increment the usage counter of the tile at the given dense index
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::InvalidParameter` if the index is out of bounds.
    pub fn record_use(&mut self, position: usize) -> Result<u32> {
        self.tiles
            .get_mut(position)
            .map(|record| {
                record.usage += 1;
                record.usage
            })
            .ok_or_else(|| invalid_parameter("position", &position, &"out of pool bounds"))
    }

    /// Decrement the usage counter of the tile at the given dense index
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::InvalidParameter` if the index is out of bounds.
    pub fn release_use(&mut self, position: usize) -> Result<u32> {
        self.tiles
            .get_mut(position)
            .map(|record| {
                record.usage = record.usage.saturating_sub(1);
                record.usage
            })
            .ok_or_else(|| invalid_parameter("position", &position, &"out of pool bounds"))
    }

    /// Count pool tiles per brightness band (low, medium, high)
    pub fn band_counts(&self) -> [usize; 3] {
        let mut counts = [0_usize; 3];
        for record in &self.tiles {
            match record.signature.brightness_band() {
                BrightnessBand::Low => counts[0] += 1,
                BrightnessBand::Medium => counts[1] += 1,
                BrightnessBand::High => counts[2] += 1,
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a TilePool {
    type Item = &'a TileRecord;
    type IntoIter = std::slice::Iter<'a, TileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bitset over dense pool indices tracking which tiles remain eligible
///
/// A tile drops out of the mask once its usage counter reaches the reuse
/// cap. Provides O(1) membership tests during the greedy pass and ordered
/// iteration for deterministic fallback scans.
#[derive(Clone, Debug)]
pub struct TileMask {
    bits: BitVec,
}

impl TileMask {
    /// Create a mask with every tile eligible
    pub fn all(len: usize) -> Self {
        Self {
            bits: bitvec![1; len],
        }
    }

    /// Create a mask with no tile eligible
    pub fn none(len: usize) -> Self {
        Self {
            bits: bitvec![0; len],
        }
    }

    /// Test eligibility of a dense index
    pub fn contains(&self, position: usize) -> bool {
        self.bits.get(position).as_deref() == Some(&true)
    }

    /// Mark a dense index eligible
    pub fn set(&mut self, position: usize) {
        if position < self.bits.len() {
            self.bits.set(position, true);
        }
    }

    /// Mark a dense index ineligible
    pub fn clear(&mut self, position: usize) {
        if position < self.bits.len() {
            self.bits.set(position, false);
        }
    }

    /// Count eligible tiles
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Test whether no tile is eligible
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Eligible dense indices in ascending order
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}
