//! Error types for mosaic composition operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all mosaic engine operations
#[derive(Debug)]
pub enum MosaicError {
    /// Input image is unusable for signature extraction or partitioning
    InvalidImage {
        /// Description of what's wrong with the image
        reason: String,
    },

    /// Grid parameters don't fit the target image
    InvalidGeometry {
        /// Requested row count
        rows: u32,
        /// Requested column count
        cols: u32,
        /// Target image width in pixels
        width: u32,
        /// Target image height in pixels
        height: u32,
        /// Explanation of why the geometry is invalid
        reason: &'static str,
    },

    /// Assignment requested with no eligible tiles and no prior assignment
    EmptyPool,

    /// Tile id not present in the project's pool
    UnknownTile {
        /// The missing tile id
        id: u64,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a rendered composite to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Project snapshot could not be written or read back
    Snapshot {
        /// Path of the snapshot file
        path: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage { reason } => {
                write!(f, "Invalid image: {reason}")
            }
            Self::InvalidGeometry {
                rows,
                cols,
                width,
                height,
                reason,
            } => {
                write!(
                    f,
                    "Invalid grid geometry {rows}x{cols} for {width}x{height} image: {reason}"
                )
            }
            Self::EmptyPool => {
                write!(f, "Tile pool is empty and no previous assignment exists")
            }
            Self::UnknownTile { id } => {
                write!(f, "Tile {id} is not present in the pool")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::Snapshot { path, reason } => {
                write!(f, "Snapshot error for '{}': {reason}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic engine results
pub type Result<T> = std::result::Result<T, MosaicError>;

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid image error
pub fn invalid_image(reason: &impl ToString) -> MosaicError {
    MosaicError::InvalidImage {
        reason: reason.to_string(),
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a snapshot error for the given path
pub fn snapshot_error(path: &std::path::Path, reason: &impl ToString) -> MosaicError {
    MosaicError::Snapshot {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
