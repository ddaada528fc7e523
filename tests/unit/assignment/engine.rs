//! Validates the greedy pass: determinism, tie-breaks, caps, and the
//! incremental update path

use crate::common::solid;
use photomosaic::MosaicError;
use photomosaic::assignment::{
    Assignment, AssignmentParams, TileId, TilePool, assign, assign_incremental,
};
use photomosaic::signature::extract;
use photomosaic::spatial::{Grid, build_grid};

// Horizontal ramp so each column prefers a different gray
fn ramp_target() -> image::RgbaImage {
    image::RgbaImage::from_fn(120, 120, |x, _| {
        let level = (x * 255 / 120) as u8;
        image::Rgba([level, level, level, 255])
    })
}

fn gray_grid(rows: u32, cols: u32) -> Grid {
    build_grid(&ramp_target(), rows, cols).expect("build")
}

fn gray_pool(levels: &[(u64, u8)]) -> TilePool {
    let mut pool = TilePool::new();
    for (id, level) in levels {
        let signature = extract(&solid(8, 8, [*level, *level, *level])).expect("extract");
        pool.insert(TileId(*id), signature).expect("insert");
    }
    pool
}

#[test]
fn test_two_runs_produce_bit_identical_assignments() {
    let grid = gray_grid(4, 4);
    let levels: Vec<(u64, u8)> = (0..12).map(|i| (i, (i * 21) as u8)).collect();
    let params = AssignmentParams {
        max_reuse: Some(3),
        ..AssignmentParams::default()
    };

    let mut pool_a = gray_pool(&levels);
    let mut pool_b = gray_pool(&levels);
    let first = assign(&grid, &mut pool_a, None, &params).expect("assign");
    let second = assign(&grid, &mut pool_b, None, &params).expect("assign");

    assert_eq!(first, second);
}

#[test]
fn test_exact_ties_prefer_the_lower_tile_id() {
    let grid = gray_grid(1, 1);
    // Identical signatures, distinct ids
    let pool_levels = [(7_u64, 128_u8), (3, 128), (11, 128)];
    let mut pool = gray_pool(&pool_levels);

    let assignment = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");
    assert_eq!(assignment.tile_at(0), Some(TileId(3)));
}

#[test]
fn test_empty_pool_without_history_is_an_error() {
    let grid = gray_grid(2, 2);
    let mut pool = TilePool::new();
    assert!(matches!(
        assign(&grid, &mut pool, None, &AssignmentParams::default()),
        Err(MosaicError::EmptyPool)
    ));
}

#[test]
fn test_empty_pool_with_history_degrades_to_all_unassigned() {
    let grid = gray_grid(2, 2);
    let mut pool = gray_pool(&[(1, 128)]);
    let previous = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");

    let mut drained = TilePool::new();
    let rebuilt =
        assign(&grid, &mut drained, Some(&previous), &AssignmentParams::default()).expect("assign");
    assert_eq!(rebuilt.assigned_count(), 0);
    assert_eq!(rebuilt.version(), previous.version() + 1);
}

#[test]
fn test_reuse_cap_limits_every_tile_and_leaves_the_rest_unassigned() {
    let grid = gray_grid(3, 3);
    let mut pool = gray_pool(&[(1, 40), (2, 128), (3, 215)]);
    let params = AssignmentParams {
        max_reuse: Some(2),
        ..AssignmentParams::default()
    };

    let assignment = assign(&grid, &mut pool, None, &params).expect("assign");

    // 9 cells against capacity 3 * 2
    assert_eq!(assignment.assigned_count(), 6);
    for id in [1_u64, 2, 3] {
        assert!(assignment.usage_of(TileId(id)) <= 2);
    }
}

#[test]
fn test_zero_reuse_cap_is_rejected() {
    let grid = gray_grid(1, 1);
    let mut pool = gray_pool(&[(1, 128)]);
    let params = AssignmentParams {
        max_reuse: Some(0),
        ..AssignmentParams::default()
    };
    assert!(matches!(
        assign(&grid, &mut pool, None, &params),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_incremental_fills_unassigned_cells_without_touching_settled_ones() {
    let grid = gray_grid(2, 2);
    let mut pool = gray_pool(&[(1, 60), (2, 180)]);
    let params = AssignmentParams {
        max_reuse: Some(1),
        ..AssignmentParams::default()
    };

    let partial = assign(&grid, &mut pool, None, &params).expect("assign");
    assert_eq!(partial.assigned_count(), 2);
    let settled: Vec<Option<TileId>> = partial.slots().to_vec();

    let extra = extract(&solid(8, 8, [100, 100, 100])).expect("extract");
    pool.insert(TileId(10), extra).expect("insert");
    let extra = extract(&solid(8, 8, [220, 220, 220])).expect("extract");
    pool.insert(TileId(11), extra).expect("insert");

    let updated =
        assign_incremental(&grid, &mut pool, &partial, &[TileId(10), TileId(11)], &params)
            .expect("update");

    assert_eq!(updated.assigned_count(), 4);
    for (index, slot) in settled.iter().enumerate() {
        if slot.is_some() {
            assert_eq!(updated.tile_at(index), *slot, "settled cell {index} moved");
        }
    }
}

#[test]
fn test_incremental_respects_the_improvement_threshold() {
    let grid = gray_grid(1, 1);
    let mut pool = gray_pool(&[(1, 128)]);
    let params = AssignmentParams {
        improvement_threshold: 1_000.0,
        ..AssignmentParams::default()
    };

    let previous = assign(&grid, &mut pool, None, &params).expect("assign");

    // A perfect match for the single cell, yet unable to clear the huge
    // threshold
    let perfect = extract(&ramp_target()).expect("extract");
    pool.insert(TileId(2), perfect).expect("insert");

    let updated =
        assign_incremental(&grid, &mut pool, &previous, &[TileId(2)], &params).expect("update");
    assert_eq!(updated.tile_at(0), Some(TileId(1)));

    // With a permissive threshold the same tile wins the cell
    let params = AssignmentParams {
        improvement_threshold: 0.0,
        ..AssignmentParams::default()
    };
    let updated =
        assign_incremental(&grid, &mut pool, &previous, &[TileId(2)], &params).expect("update");
    assert_eq!(updated.tile_at(0), Some(TileId(2)));
}

#[test]
fn test_incremental_rejects_a_previous_assignment_over_removed_tiles() {
    let grid = gray_grid(1, 1);
    let mut pool = gray_pool(&[(1, 128)]);
    let previous = assign(&grid, &mut pool, None, &AssignmentParams::default()).expect("assign");

    pool.remove(TileId(1));
    let extra = extract(&solid(8, 8, [90, 90, 90])).expect("extract");
    pool.insert(TileId(2), extra).expect("insert");

    assert!(matches!(
        assign_incremental(
            &grid,
            &mut pool,
            &previous,
            &[TileId(2)],
            &AssignmentParams::default()
        ),
        Err(MosaicError::UnknownTile { id: 1 })
    ));
}

#[test]
fn test_incremental_rejects_a_mismatched_cell_count() {
    let grid = gray_grid(2, 2);
    let mut pool = gray_pool(&[(1, 128)]);
    let previous = Assignment::empty(9);
    assert!(matches!(
        assign_incremental(&grid, &mut pool, &previous, &[], &AssignmentParams::default()),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_versions_chain_through_full_and_incremental_passes() {
    let grid = gray_grid(2, 2);
    let mut pool = gray_pool(&[(1, 128)]);
    let params = AssignmentParams::default();

    let first = assign(&grid, &mut pool, None, &params).expect("assign");
    assert_eq!(first.version(), 1);

    let second = assign_incremental(&grid, &mut pool, &first, &[], &params).expect("update");
    assert_eq!(second.version(), 2);

    let third = assign(&grid, &mut pool, Some(&second), &params).expect("assign");
    assert_eq!(third.version(), 3);
}
