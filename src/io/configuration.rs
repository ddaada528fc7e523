//! Engine constants and runtime configuration defaults

// Signature extraction settings
/// Edge length of the normalized square every image is down-sampled to
/// before signature statistics are computed
pub const SIGNATURE_SAMPLE_SIZE: u32 = 16;
/// Structure descriptor resolution (blocks per axis over the sample)
pub const STRUCTURE_BLOCKS: usize = 2;

// Distance metric defaults
/// Default weight of the Lab color term in signature distance
pub const DEFAULT_COLOR_WEIGHT: f64 = 1.0;
/// Default weight of the block-luminance structure term in signature distance
pub const DEFAULT_STRUCTURE_WEIGHT: f64 = 0.25;

// Brightness banding thresholds on the L* axis (0..100)
/// Upper bound of the low brightness band
pub const BRIGHTNESS_LOW_MAX: f64 = 33.0;
/// Upper bound of the medium brightness band
pub const BRIGHTNESS_MEDIUM_MAX: f64 = 66.0;

// Assignment engine settings
/// Minimum distance gain a newly added tile must offer before it displaces
/// an existing placement during an incremental update
pub const DEFAULT_IMPROVEMENT_THRESHOLD: f64 = 0.5;
/// Pool size above which the bucket index replaces full-pool scans
pub const SHORTLIST_POOL_THRESHOLD: usize = 256;
/// Minimum number of shortlist candidates gathered before the bucket scan stops
pub const MIN_SHORTLIST_CANDIDATES: usize = 32;
/// Number of quantization buckets per Lab axis in the shortlist index
pub const LAB_BUCKETS_PER_AXIS: usize = 4;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed rows or columns in a grid
pub const MAX_GRID_DIMENSION: u32 = 512;

// Grid fitting defaults (when the caller asks for a cell count, not a shape)
/// Default number of cells targeted by grid fitting
pub const DEFAULT_TARGET_CELL_COUNT: u32 = 500;
/// Penalty weight for uncovered remainder area in grid fitting scores
pub const UNUSED_AREA_WEIGHT: f64 = 10.0;

// Rendering settings
/// Fill color for cells without an assigned tile (RGBA)
pub const DEFAULT_PLACEHOLDER: [u8; 4] = [24, 24, 24, 255];

// Output settings
/// Suffix added to composite output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";

// Persistence settings
/// Snapshot schema version written by this build
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;
