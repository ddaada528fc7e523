//! Validates center-crop fitting, placeholder fills, and blending

use crate::common::{MemoryResolver, gradient, solid};
use photomosaic::MosaicError;
use photomosaic::assignment::{AssignmentParams, TileId, TilePool, assign};
use photomosaic::render::{RenderOptions, render, render_blended};
use photomosaic::signature::extract;
use photomosaic::spatial::build_grid;

#[test]
fn test_composite_matches_target_dimensions_and_tiles_edge_to_edge() {
    let target = gradient(90, 60);
    let grid = build_grid(&target, 3, 3).expect("build");

    let mut pool = TilePool::new();
    let mut resolver = MemoryResolver::new();
    // A deliberately non-square tile forces the center-crop path
    let tile = solid(64, 16, [10, 200, 10]);
    pool.insert(TileId(1), extract(&tile).expect("extract"))
        .expect("insert");
    resolver.insert(TileId(1), tile);

    let assignment = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");
    assert!(assignment.is_complete());

    let composite = render(&grid, &assignment, &resolver, &RenderOptions::default())
        .expect("render");
    assert_eq!(composite.dimensions(), (90, 60));
    // Solid tile, so every pixel survives the crop
    assert!(composite.pixels().all(|pixel| pixel.0 == [10, 200, 10, 255]));
}

#[test]
fn test_center_crop_keeps_the_middle_of_a_wide_tile() {
    let target = solid(40, 40, [128, 128, 128]);
    let grid = build_grid(&target, 1, 1).expect("build");

    // Left third red, middle third green, right third blue; the square
    // cell must sample from the middle
    let tile = image::RgbaImage::from_fn(120, 40, |x, _| {
        if x < 40 {
            image::Rgba([255, 0, 0, 255])
        } else if x < 80 {
            image::Rgba([0, 255, 0, 255])
        } else {
            image::Rgba([0, 0, 255, 255])
        }
    });
    let mut pool = TilePool::new();
    let mut resolver = MemoryResolver::new();
    pool.insert(TileId(1), extract(&tile).expect("extract"))
        .expect("insert");
    resolver.insert(TileId(1), tile);

    let assignment = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");
    let composite = render(&grid, &assignment, &resolver, &RenderOptions::default())
        .expect("render");

    let center = composite.get_pixel(20, 20);
    assert_eq!(center.0, [0, 255, 0, 255], "center-crop missed the middle");
}

#[test]
fn test_blend_zero_reproduces_the_target() {
    let target = gradient(40, 40);
    let grid = build_grid(&target, 2, 2).expect("build");

    let mut pool = TilePool::new();
    let mut resolver = MemoryResolver::new();
    let tile = solid(16, 16, [255, 0, 0]);
    pool.insert(TileId(1), extract(&tile).expect("extract"))
        .expect("insert");
    resolver.insert(TileId(1), tile);

    let assignment = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");

    let options = RenderOptions {
        blend: Some(0.0),
        ..RenderOptions::default()
    };
    let composite =
        render_blended(&grid, &assignment, &resolver, &target, &options).expect("render");
    for (x, y, pixel) in composite.enumerate_pixels() {
        let base = target.get_pixel(x, y);
        assert_eq!(pixel.0[..3], base.0[..3]);
    }
}

#[test]
fn test_blend_factor_is_validated() {
    let target = gradient(40, 40);
    let grid = build_grid(&target, 2, 2).expect("build");
    let assignment = photomosaic::assignment::Assignment::empty(grid.cell_count());
    let resolver = MemoryResolver::new();

    let options = RenderOptions {
        blend: Some(1.5),
        ..RenderOptions::default()
    };
    assert!(matches!(
        render_blended(&grid, &assignment, &resolver, &target, &options),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_blended_render_rejects_a_mismatched_target() {
    let target = gradient(40, 40);
    let grid = build_grid(&target, 2, 2).expect("build");
    let assignment = photomosaic::assignment::Assignment::empty(grid.cell_count());
    let resolver = MemoryResolver::new();

    let wrong_target = gradient(30, 30);
    assert!(matches!(
        render_blended(
            &grid,
            &assignment,
            &resolver,
            &wrong_target,
            &RenderOptions::default()
        ),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_assignment_grid_mismatch_is_rejected() {
    let target = gradient(40, 40);
    let grid = build_grid(&target, 2, 2).expect("build");
    let assignment = photomosaic::assignment::Assignment::empty(9);
    let resolver = MemoryResolver::new();

    assert!(matches!(
        render(&grid, &assignment, &resolver, &RenderOptions::default()),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_unresolvable_tile_surfaces_as_unknown_tile() {
    let target = gradient(40, 40);
    let grid = build_grid(&target, 1, 1).expect("build");

    let mut pool = TilePool::new();
    let tile = solid(16, 16, [0, 0, 0]);
    pool.insert(TileId(1), extract(&tile).expect("extract"))
        .expect("insert");
    let assignment = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");

    // Resolver was never taught about tile 1
    let resolver = MemoryResolver::new();
    assert!(matches!(
        render(&grid, &assignment, &resolver, &RenderOptions::default()),
        Err(MosaicError::UnknownTile { id: 1 })
    ));
}
