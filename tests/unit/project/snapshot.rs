//! Validates snapshot round-trips and restore-time consistency checks

use crate::common::{gradient, solid};
use photomosaic::MosaicError;
use photomosaic::assignment::{AssignmentParams, Assignment, TileId, TilePool};
use photomosaic::project::{MosaicProject, load_snapshot, save_snapshot};
use photomosaic::signature::extract;

fn populated_project() -> MosaicProject {
    let target = gradient(60, 60);
    let mut project = MosaicProject::create(
        "snapshot",
        "memory",
        &target,
        3,
        3,
        AssignmentParams::default(),
    )
    .expect("create");

    let mut batch = Vec::new();
    for (id, level) in [(1_u64, 30_u8), (2, 120), (3, 220)] {
        let signature = extract(&solid(8, 8, [level, level, level])).expect("extract");
        batch.push((TileId(id), signature));
    }
    project.add_tile_signatures(batch).expect("ingest");
    project
}

#[test]
fn test_snapshot_round_trips_through_disk() {
    let project = populated_project();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("project.json");
    save_snapshot(&path, &project.to_snapshot()).expect("save");

    let restored =
        MosaicProject::from_snapshot(load_snapshot(&path).expect("load")).expect("restore");
    assert_eq!(project, restored);
}

#[test]
fn test_restored_projects_resume_incremental_updates() {
    let project = populated_project();
    let snapshot = project.to_snapshot();

    let mut restored = MosaicProject::from_snapshot(snapshot).expect("restore");
    let before = restored.assignment().aggregate_distance();
    let version = restored.version();

    let signature = extract(&solid(8, 8, [90, 90, 90])).expect("extract");
    restored
        .add_tile_signatures(vec![(TileId(50), signature)])
        .expect("update");

    assert_eq!(restored.version(), version + 1);
    assert!(restored.assignment().aggregate_distance() <= before);
}

#[test]
fn test_unsupported_format_version_is_rejected() {
    let mut snapshot = populated_project().to_snapshot();
    snapshot.format_version = 99;
    assert!(matches!(
        MosaicProject::from_snapshot(snapshot),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_assignment_length_mismatch_is_rejected() {
    let mut snapshot = populated_project().to_snapshot();
    snapshot.assignment = Assignment::empty(4);
    assert!(matches!(
        MosaicProject::from_snapshot(snapshot),
        Err(MosaicError::InvalidParameter { .. })
    ));
}

#[test]
fn test_assigned_ids_missing_from_the_pool_are_rejected() {
    let mut snapshot = populated_project().to_snapshot();
    snapshot.pool = TilePool::new();
    assert!(matches!(
        MosaicProject::from_snapshot(snapshot),
        Err(MosaicError::UnknownTile { .. })
    ));
}

#[test]
fn test_loading_garbage_reports_a_snapshot_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("garbage.json");
    std::fs::write(&path, b"not json at all").expect("write");
    assert!(matches!(
        load_snapshot(&path),
        Err(MosaicError::Snapshot { .. })
    ));
}
