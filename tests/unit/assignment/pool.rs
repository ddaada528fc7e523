//! Validates pool ordering, usage counters, and eligibility masks

use crate::common::solid;
use photomosaic::assignment::{TileId, TileMask, TilePool};
use photomosaic::signature::extract;

fn pool_with_levels(levels: &[(u64, u8)]) -> TilePool {
    let mut pool = TilePool::new();
    for (id, level) in levels {
        let signature = extract(&solid(8, 8, [*level, *level, *level])).expect("extract");
        pool.insert(TileId(*id), signature).expect("insert");
    }
    pool
}

#[test]
fn test_iteration_follows_id_order_regardless_of_insertion_order() {
    let pool = pool_with_levels(&[(9, 10), (2, 20), (5, 30)]);
    let ids: Vec<u64> = pool.iter().map(|record| record.id.0).collect();
    assert_eq!(ids, vec![2, 5, 9]);
    assert_eq!(pool.position(TileId(5)), Some(1));
    assert_eq!(pool.next_id(), TileId(10));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let mut pool = pool_with_levels(&[(1, 50)]);
    let signature = extract(&solid(8, 8, [60, 60, 60])).expect("extract");
    assert!(pool.insert(TileId(1), signature).is_err());
    assert_eq!(pool.len(), 1);
}

#[test]
fn test_remove_reports_presence() {
    let mut pool = pool_with_levels(&[(1, 50), (2, 60)]);
    assert!(pool.remove(TileId(1)));
    assert!(!pool.remove(TileId(1)));
    assert_eq!(pool.len(), 1);
    assert!(!pool.contains(TileId(1)));
}

#[test]
fn test_usage_counters_round_trip() {
    let mut pool = pool_with_levels(&[(1, 50)]);
    assert_eq!(pool.record_use(0).expect("use"), 1);
    assert_eq!(pool.record_use(0).expect("use"), 2);
    assert_eq!(pool.release_use(0).expect("release"), 1);

    pool.reset_usage();
    assert_eq!(pool.get(TileId(1)).map(|record| record.usage), Some(0));

    assert!(pool.record_use(5).is_err());
}

#[test]
fn test_band_counts_sum_to_pool_size() {
    let pool = pool_with_levels(&[(1, 10), (2, 120), (3, 240), (4, 250)]);
    let [low, medium, high] = pool.band_counts();
    assert_eq!(low + medium + high, pool.len());
    assert_eq!(low, 1);
    assert_eq!(high, 2);
}

#[test]
fn test_mask_tracks_eligibility() {
    let mut mask = TileMask::all(5);
    assert_eq!(mask.count(), 5);

    mask.clear(2);
    assert!(!mask.contains(2));
    assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0, 1, 3, 4]);

    mask.set(2);
    assert!(mask.contains(2));

    let empty = TileMask::none(3);
    assert!(empty.is_empty());
    assert!(!empty.contains(0));
}
