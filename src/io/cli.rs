//! Command-line interface for composing mosaics from a tile directory

use crate::assignment::{AssignmentParams, TileId};
use crate::io::configuration::{DEFAULT_TARGET_CELL_COUNT, OUTPUT_SUFFIX};
use crate::io::error::{MosaicError, Result, invalid_parameter, snapshot_error};
use crate::io::image::{DirectoryResolver, export_png, load_image, parse_hex_color};
use crate::io::progress::ProgressManager;
use crate::project::{MosaicProject, ProjectSnapshot, RenderedComposite};
use crate::render::{RenderOptions, render_blended};
use crate::signature::extract;
use crate::spatial::fit_grid;
use clap::Parser;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

fn parse_aspect(value: &str) -> std::result::Result<(u32, u32), String> {
    let parts: Vec<&str> = value.split(':').collect();
    if let [w, h] = parts.as_slice() {
        match (w.parse::<u32>(), h.parse::<u32>()) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => return Ok((w, h)),
            _ => {}
        }
    }
    Err(format!("'{value}' is not a W:H aspect ratio"))
}

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Compose a community photo mosaic from a target image and a tile collection"
)]
/// Command-line arguments for the mosaic composition tool
pub struct Cli {
    /// Target image to reconstruct as a mosaic
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directory of candidate tile images
    #[arg(short, long)]
    pub tiles: PathBuf,

    /// Grid rows (use together with --cols)
    #[arg(long, requires = "cols", conflicts_with = "cells")]
    pub rows: Option<u32>,

    /// Grid columns (use together with --rows)
    #[arg(long, requires = "rows", conflicts_with = "cells")]
    pub cols: Option<u32>,

    /// Approximate cell count to fit when rows/cols are not given
    #[arg(short = 'n', long)]
    pub cells: Option<u32>,

    /// Cell aspect ratio as W:H
    #[arg(long, default_value = "3:4", value_parser = parse_aspect)]
    pub aspect: (u32, u32),

    /// Maximum number of cells a single tile may occupy
    #[arg(short = 'r', long)]
    pub max_reuse: Option<u32>,

    /// Blend placed tiles over the target at this opacity (0.0..=1.0)
    #[arg(short, long)]
    pub blend: Option<f32>,

    /// Fill color for unassigned cells as RRGGBB hex
    #[arg(long)]
    pub placeholder: Option<String>,

    /// State file to resume from and update
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Output path (defaults to the target name with a suffix)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Force a full recomputation even when resuming
    #[arg(short, long)]
    pub force: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Output path, derived from the target name when not given explicitly
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .target
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            self.target.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.png"))
        })
    }
}

// Combined CLI state: the engine snapshot plus the id-to-path manifest the
// engine deliberately does not own
#[derive(serde::Serialize, serde::Deserialize)]
struct CliState {
    snapshot: ProjectSnapshot,
    resolver: DirectoryResolver,
}

/// Orchestrates one compose run: open or resume a project, ingest tiles,
/// assign, render, export
pub struct MosaicProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl MosaicProcessor {
    /// Create a new processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Run the compose pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be loaded, geometry is
    /// invalid, resuming fails, or rendering/export fails. Unreadable tile
    /// files are skipped, not fatal.
    pub fn process(&mut self) -> Result<()> {
        let target = load_image(&self.cli.target)?;

        let (mut project, mut resolver) = self.open_project(&target)?;
        let skipped = self.ingest_tiles(&mut project, &mut resolver)?;

        if self.cli.force && (project.version() > 0 || !project.pool().is_empty()) {
            project.force_reassign()?;
        }

        let composite = self.render(&project, &resolver, &target)?;
        export_png(&composite.image, &self.cli.output_path())?;

        if let Some(path) = self.cli.snapshot.clone() {
            save_state(&path, &project, &resolver)?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            let [low, medium, high] = project.pool().band_counts();
            pm.begin_phase("done", 1);
            pm.step();
            pm.finish_phase(format!(
                "v{} {}: {}/{} cells, pool {} ({low}/{medium}/{high} bands), {skipped} skipped",
                composite.version,
                project.phase(),
                project.assignment().assigned_count(),
                project.grid().cell_count(),
                project.pool().len(),
            ));
            pm.finish();
        }

        Ok(())
    }

    // Open a fresh project or resume one from the state file
    fn open_project(&self, target: &RgbaImage) -> Result<(MosaicProject, DirectoryResolver)> {
        if let Some(path) = self.cli.snapshot.as_deref() {
            if path.exists() {
                return self.resume_project(path, target);
            }
        }

        let (rows, cols) = self.resolve_geometry(target)?;
        let params = AssignmentParams {
            max_reuse: self.cli.max_reuse,
            ..AssignmentParams::default()
        };
        let id = self
            .cli
            .target
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let project = MosaicProject::create(
            id,
            self.cli.target.to_string_lossy(),
            target,
            rows,
            cols,
            params,
        )?;
        Ok((project, DirectoryResolver::new()))
    }

    fn resume_project(
        &self,
        path: &Path,
        target: &RgbaImage,
    ) -> Result<(MosaicProject, DirectoryResolver)> {
        let state = load_state(path)?;
        let mut project = MosaicProject::from_snapshot(state.snapshot)?;

        let grid = project.grid();
        if target.dimensions() != (grid.target_width(), grid.target_height()) {
            return Err(invalid_parameter(
                "target",
                &format!("{}x{}", target.width(), target.height()),
                &format!(
                    "snapshot was built for a {}x{} target",
                    grid.target_width(),
                    grid.target_height()
                ),
            ));
        }

        // Explicit geometry on the command line overrides the snapshot
        if let (Some(rows), Some(cols)) = (self.cli.rows, self.cli.cols) {
            if rows != project.grid().rows() || cols != project.grid().cols() {
                project.set_geometry(target, rows, cols)?;
            }
        }
        if let Some(max_reuse) = self.cli.max_reuse {
            if project.params().max_reuse != Some(max_reuse) {
                project.set_max_reuse(Some(max_reuse))?;
            }
        }

        Ok((project, state.resolver))
    }

    fn resolve_geometry(&self, target: &RgbaImage) -> Result<(u32, u32)> {
        if let (Some(rows), Some(cols)) = (self.cli.rows, self.cli.cols) {
            return Ok((rows, cols));
        }
        let cells = self.cli.cells.unwrap_or(DEFAULT_TARGET_CELL_COUNT);
        fit_grid(target.width(), target.height(), cells, self.cli.aspect)
    }

    // Ingest every new readable image under the tiles directory; returns
    // the number of skipped files
    fn ingest_tiles(
        &mut self,
        project: &mut MosaicProject,
        resolver: &mut DirectoryResolver,
    ) -> Result<usize> {
        let files = collect_tile_files(&self.cli.tiles)?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.begin_phase("tiles", files.len());
        }

        let mut batch = Vec::new();
        let mut next_id = project.pool().next_id().0;
        let mut skipped = 0_usize;

        for path in files {
            if let Some(ref pm) = self.progress_manager {
                pm.step();
            }
            if resolver.knows_path(&path) {
                continue;
            }
            let Ok(tile) = load_image(&path) else {
                skipped += 1;
                continue;
            };
            let Ok(signature) = extract(&tile) else {
                skipped += 1;
                continue;
            };
            let id = TileId(next_id);
            next_id += 1;
            resolver.register(id, path);
            batch.push((id, signature));
        }

        let added = batch.len();
        project.add_tile_signatures(batch)?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish_phase(format!("{added} tiles added, {skipped} skipped"));
        }

        Ok(skipped)
    }

    fn render(
        &mut self,
        project: &MosaicProject,
        resolver: &DirectoryResolver,
        target: &RgbaImage,
    ) -> Result<RenderedComposite> {
        let mut options = RenderOptions::default();
        if let Some(ref hex) = self.cli.placeholder {
            options.placeholder = Rgba(parse_hex_color(hex)?);
        }
        options.blend = self.cli.blend;

        if let Some(ref mut pm) = self.progress_manager {
            pm.begin_phase("render", 1);
        }

        let composite = if options.blend.is_some() {
            let image = render_blended(
                project.grid(),
                project.assignment(),
                resolver,
                target,
                &options,
            )?;
            RenderedComposite {
                image,
                version: project.version(),
            }
        } else {
            project.render_current(resolver, &options)?
        };

        if let Some(ref mut pm) = self.progress_manager {
            pm.step();
            pm.finish_phase(format!(
                "rendered {}x{}",
                composite.image.width(),
                composite.image.height()
            ));
        }

        Ok(composite)
    }
}

const TILE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// Candidate files under the tiles directory in deterministic path order
fn collect_tile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MosaicError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read tiles directory",
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| MosaicError::FileSystem {
                path: dir.to_path_buf(),
                operation: "read directory entry",
                source: e,
            })?
            .path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                TILE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            });
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn save_state(path: &Path, project: &MosaicProject, resolver: &DirectoryResolver) -> Result<()> {
    let state = CliState {
        snapshot: project.to_snapshot(),
        resolver: resolver.clone(),
    };
    let payload = serde_json::to_vec_pretty(&state)
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
        operation: "write state",
        source: e,
    })
}

fn load_state(path: &Path) -> Result<CliState> {
    let payload = std::fs::read(path).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "read state",
        source: e,
    })?;
    serde_json::from_slice(&payload)
        .map_err(|e| snapshot_error(path, &format!("deserialization failed: {e}")))
}
