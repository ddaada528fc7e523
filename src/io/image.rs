//! Filesystem image loading and composite export

use crate::assignment::TileId;
use crate::io::error::{MosaicError, Result};
use crate::render::TileImageResolver;
use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Load an image from disk as RGBA
///
/// # Errors
///
/// Returns `MosaicError::ImageLoad` carrying the path if decoding fails.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgba8())
}

/// Save a rendered composite as PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns `MosaicError::FileSystem` if the parent directory cannot be
/// created and `MosaicError::ImageExport` if encoding or writing fails.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Tile resolver backed by a tile-id-to-path manifest
///
/// The storage-layer side of the resolution capability: the engine holds
/// ids and signatures, this map knows where the bytes live.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DirectoryResolver {
    paths: BTreeMap<TileId, PathBuf>,
}

impl DirectoryResolver {
    /// Create an empty resolver
    pub const fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
        }
    }

    /// Register the path backing a tile id
    pub fn register(&mut self, id: TileId, path: PathBuf) {
        self.paths.insert(id, path);
    }

    /// Path backing a tile id, if registered
    pub fn path_of(&self, id: TileId) -> Option<&Path> {
        self.paths.get(&id).map(PathBuf::as_path)
    }

    /// Test whether a path is already registered to any tile
    pub fn knows_path(&self, path: &Path) -> bool {
        self.paths.values().any(|known| known == path)
    }

    /// Number of registered tiles
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Test whether no tile is registered
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl TileImageResolver for DirectoryResolver {
    fn resolve(&self, id: TileId) -> Result<RgbaImage> {
        let path = self
            .paths
            .get(&id)
            .ok_or(MosaicError::UnknownTile { id: id.0 })?;
        load_image(path)
    }
}

/// Parse a `RRGGBB` hex string into an opaque RGBA color
///
/// # Errors
///
/// Returns `MosaicError::InvalidParameter` unless the input is exactly six
/// hex digits.
pub fn parse_hex_color(value: &str) -> Result<[u8; 4]> {
    use crate::io::error::invalid_parameter;

    let parse_error = || invalid_parameter("placeholder", &value, &"expected RRGGBB hex digits");

    if value.len() != 6 || !value.is_ascii() {
        return Err(parse_error());
    }
    let channel = |range: std::ops::Range<usize>| {
        value
            .get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Ok([r, g, b, 255]),
        _ => Err(parse_error()),
    }
}
