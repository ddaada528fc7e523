//! Project snapshot serialization
//!
//! A snapshot captures everything needed to resume incremental updates
//! without re-reading the target image: grid geometry with cell signatures,
//! pool ids and signatures, the assignment mapping, and the version. Tile
//! pixel bytes are never serialized; they belong to the surrounding storage
//! layer.

use crate::assignment::{Assignment, AssignmentParams, TilePool};
use crate::io::configuration::SNAPSHOT_FORMAT_VERSION;
use crate::io::error::{MosaicError, Result, snapshot_error};
use crate::project::MosaicProject;
use crate::spatial::Grid;
use std::path::Path;

/// Serializable record of a mosaic project
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectSnapshot {
    /// Snapshot schema version
    pub format_version: u32,
    /// Project identifier
    pub id: String,
    /// Opaque reference to the target image
    pub target_ref: String,
    /// Grid geometry and cell signatures
    pub grid: Grid,
    /// Pool ids, signatures, and usage counters
    pub pool: TilePool,
    /// Current assignment mapping and version
    pub assignment: Assignment,
    /// Assignment parameters in effect
    pub params: AssignmentParams,
}

impl MosaicProject {
    /// Capture the project as a serializable snapshot
    pub fn to_snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            id: self.id.clone(),
            target_ref: self.target_ref.clone(),
            grid: self.grid.clone(),
            pool: self.pool.clone(),
            assignment: self.assignment.clone(),
            params: self.params,
        }
    }

    /// Restore a project from a snapshot
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::InvalidParameter` if the snapshot is internally
    /// inconsistent: unsupported format version, assignment length that
    /// disagrees with the grid, or an assigned tile id missing from the
    /// pool.
    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Result<Self> {
        use crate::io::error::invalid_parameter;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(invalid_parameter(
                "format_version",
                &snapshot.format_version,
                &format!("this build reads version {SNAPSHOT_FORMAT_VERSION}"),
            ));
        }
        if snapshot.assignment.slots().len() != snapshot.grid.cell_count() {
            return Err(invalid_parameter(
                "assignment",
                &snapshot.assignment.slots().len(),
                &format!(
                    "does not match the grid's {} cells",
                    snapshot.grid.cell_count()
                ),
            ));
        }
        for slot in snapshot.assignment.slots() {
            if let Some(id) = slot {
                if !snapshot.pool.contains(*id) {
                    return Err(MosaicError::UnknownTile { id: id.0 });
                }
            }
        }

        Ok(Self {
            id: snapshot.id,
            target_ref: snapshot.target_ref,
            grid: snapshot.grid,
            pool: snapshot.pool,
            assignment: snapshot.assignment,
            params: snapshot.params,
        })
    }
}

/// Write a snapshot to disk as JSON
///
/// # Errors
///
/// Returns `MosaicError::Snapshot` on serialization failure and
/// `MosaicError::FileSystem` on write failure.
pub fn save_snapshot(path: &Path, snapshot: &ProjectSnapshot) -> Result<()> {
    let payload = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| snapshot_error(path, &format!("serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    std::fs::write(path, payload).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "write snapshot",
        source: e,
    })
}

/// Read a snapshot back from disk
///
/// # Errors
///
/// Returns `MosaicError::FileSystem` if the file cannot be read and
/// `MosaicError::Snapshot` if it does not parse as a snapshot.
pub fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let payload = std::fs::read(path).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "read snapshot",
        source: e,
    })?;

    serde_json::from_slice(&payload)
        .map_err(|e| snapshot_error(path, &format!("deserialization failed: {e}")))
}
