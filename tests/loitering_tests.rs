use sentinel::analysis::{GeometryHashIdentity, TrackKey, TrackStore};
use sentinel::config::LoiteringConfig;
use sentinel::core::{Attribution, BBox, Detection, IncidentKind, Severity};
use std::time::{Duration, Instant};

fn person_at(track_id: u64, cx: f32, cy: f32) -> Detection {
    Detection::person(BBox::new(cx - 20.0, cy - 40.0, cx + 20.0, cy + 40.0)).with_track_id(track_id)
}

/// One observation per second from `base` for `secs + 1` frames, drifting `dx` per frame
fn walk(store: &mut TrackStore, base: Instant, secs: u32, dx: f32) -> Vec<Vec<IncidentKind>> {
    let attribution = Attribution::new("LOBBY", "ops");
    (0..=secs)
        .map(|s| {
            let det = person_at(7, 100.0 + dx * s as f32, 200.0);
            store
                .observe(&[det], base + Duration::from_secs(s as u64), &attribution)
                .into_iter()
                .map(|i| i.kind)
                .collect()
        })
        .collect()
}

#[test]
fn test_stationary_person_loiters_after_duration() {
    let mut store = TrackStore::default();
    // 11 seconds, 10px total displacement
    let per_frame = walk(&mut store, Instant::now(), 11, 10.0 / 11.0);

    assert!(per_frame[..=10].iter().all(|kinds| kinds.is_empty()));
    assert_eq!(per_frame[11], vec![IncidentKind::Loitering]);
    assert!(store.is_loitering(7));
}

#[test]
fn test_moving_person_does_not_loiter() {
    let mut store = TrackStore::default();
    // 11 seconds, 100px total displacement
    let per_frame = walk(&mut store, Instant::now(), 11, 100.0 / 11.0);

    assert!(per_frame.iter().all(|kinds| kinds.is_empty()));
    assert!(!store.is_loitering(7));
}

#[test]
fn test_loitering_refires_every_frame() {
    let mut store = TrackStore::default();
    let per_frame = walk(&mut store, Instant::now(), 14, 0.0);

    let fired = per_frame.iter().filter(|kinds| !kinds.is_empty()).count();
    assert_eq!(fired, 4);
}

#[test]
fn test_incident_fields() {
    let mut store = TrackStore::default();
    let attribution = Attribution::new("LOBBY", "ops");
    let base = Instant::now();

    store.observe(&[person_at(3, 50.0, 50.0)], base, &attribution);
    let incidents = store.observe(&[person_at(3, 52.0, 50.0)], base + Duration::from_secs(12), &attribution);

    assert_eq!(incidents.len(), 1);
    let incident = &incidents[0];
    assert_eq!(incident.kind, IncidentKind::Loitering);
    assert_eq!(incident.severity, Severity::Medium);
    assert_eq!(incident.camera_id, "LOBBY");
    assert_eq!(incident.owner_id, "ops");
    assert_eq!(incident.confidence, 1.0);
    assert!(incident.description.contains("ID: 3"));
}

#[test]
fn test_absent_track_is_purged() {
    let mut store = TrackStore::default();
    let attribution = Attribution::default();
    let base = Instant::now();

    for s in 0..8u64 {
        store.observe(&[person_at(1, 100.0, 100.0)], base + Duration::from_secs(s), &attribution);
    }
    assert_eq!(store.track(1).unwrap().history.len(), 8);

    // One frame without the subject
    store.observe(&[], base + Duration::from_secs(8), &attribution);
    assert!(store.track(1).is_none());
    assert!(store.is_empty());

    // Reappearance starts from scratch: 9..=15 is only 6s of history
    let mut incidents = Vec::new();
    for s in 9..=15u64 {
        incidents.extend(store.observe(&[person_at(1, 100.0, 100.0)], base + Duration::from_secs(s), &attribution));
    }
    assert!(incidents.is_empty());
    assert_eq!(store.track(1).unwrap().history.len(), 7);
}

#[test]
fn test_tracks_are_independent() {
    let mut store = TrackStore::default();
    let attribution = Attribution::default();
    let base = Instant::now();

    for s in 0..=11u64 {
        let t = base + Duration::from_secs(s);
        let still = person_at(1, 100.0, 100.0);
        let walker = person_at(2, 300.0 + 20.0 * s as f32, 100.0);
        let incidents = store.observe(&[still, walker], t, &attribution);
        if s == 11 {
            assert_eq!(incidents.len(), 1);
            assert!(incidents[0].description.contains("ID: 1"));
        }
    }
    assert_eq!(store.len(), 2);
}

#[test]
fn test_iou_identity_keeps_jittering_box() {
    let mut store = TrackStore::default();
    let attribution = Attribution::default();
    let base = Instant::now();

    let mut last = Vec::new();
    for s in 0..=11u64 {
        let jitter = if s % 2 == 0 { 0.0 } else { 3.0 };
        let det = Detection::person(BBox::new(100.0 + jitter, 100.0, 140.0 + jitter, 180.0));
        last = store.observe(&[det], base + Duration::from_secs(s), &attribution);
    }

    assert_eq!(store.len(), 1);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].kind, IncidentKind::Loitering);
}

#[test]
fn test_geometry_hash_mode_splits_moving_subject() {
    let mut store = TrackStore::with_identity(
        LoiteringConfig::default(),
        Box::new(GeometryHashIdentity::new()),
    );
    let attribution = Attribution::default();
    let base = Instant::now();

    let a = Detection::person(BBox::new(10.0, 10.0, 50.0, 90.0));
    let b = Detection::person(BBox::new(11.0, 10.0, 51.0, 90.0));
    store.observe(&[a.clone()], base, &attribution);
    store.observe(&[b.clone()], base + Duration::from_secs(1), &attribution);

    // A one-pixel shift is a different subject, and the old one is purged
    assert_eq!(store.len(), 1);
    assert!(store.track(TrackKey::Assigned(GeometryHashIdentity::id_for(&a.bbox))).is_none());
    assert!(store.track(TrackKey::Assigned(GeometryHashIdentity::id_for(&b.bbox))).is_some());
}

#[test]
fn test_labeled_and_unlabeled_subjects_stay_separate() {
    let mut store = TrackStore::default();
    let attribution = Attribution::default();
    let base = Instant::now();

    // External id 1 stands still; the unlabeled subject walks away and is
    // assigned id 1 by the IoU matcher on its first frame
    let mut last = Vec::new();
    for s in 0..=11u64 {
        let labeled = person_at(1, 100.0, 100.0);
        let x = 500.0 + 5.0 * s as f32;
        let unlabeled = Detection::person(BBox::new(x - 20.0, 460.0, x + 20.0, 540.0));
        last = store.observe(&[labeled, unlabeled], base + Duration::from_secs(s), &attribution);
    }

    assert_eq!(store.len(), 2);
    let labeled = store.track(1).unwrap();
    assert_eq!(labeled.history.len(), 12);
    assert!(labeled.history.iter().all(|p| p.center_x == 100.0));
    assert_eq!(store.track(TrackKey::Assigned(1)).unwrap().history.len(), 12);

    assert_eq!(last.len(), 1);
    assert!(last[0].description.contains("ID: 1)"));
}

#[test]
fn test_custom_thresholds() {
    let config = LoiteringConfig {
        duration_secs: 3.0,
        movement_px: 5.0,
    };
    let mut store = TrackStore::new(config);
    let per_frame = walk(&mut store, Instant::now(), 4, 1.0);

    assert!(per_frame[..=3].iter().all(|kinds| kinds.is_empty()));
    assert_eq!(per_frame[4], vec![IncidentKind::Loitering]);
}
