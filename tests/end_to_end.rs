use gesture_sup::{
    Config, Decision, GestureAuth, GestureAuthError, HandMode, HandObservation, NeverCancel,
    ScriptedSource, TemplateStore, UserStore,
};
use gesture_sup::core::extract_one;
use tempfile::tempdir;

const FPS: u32 = 30;

/// A fixed pose. `z1` moves landmark 1's depth, which feeds exactly one
/// feature (index 5), so the feature-space distance to `pose(0.0)` is `z1`.
fn pose(z1: f64) -> HandObservation {
    let mut points: Vec<[f64; 3]> = (0..21)
        .map(|i| {
            let i = i as f64;
            [0.35 + 0.012 * i, 0.65 - 0.018 * i, 0.0]
        })
        .collect();
    points[1][2] = z1;
    points.into()
}

fn repeated(hand: HandObservation, count: usize) -> ScriptedSource {
    ScriptedSource::repeat(vec![hand], count, FPS)
}

fn open_auth(dir: &std::path::Path) -> GestureAuth<UserStore> {
    let store = UserStore::open(dir.join("users_db.json")).expect("open store");
    GestureAuth::new(store, Config::default())
}

#[test]
fn enroll_then_verify_once_scores_100() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());

    let template = auth
        .register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");
    assert_eq!(template.vector(), extract_one(&pose(0.0)).unwrap().as_slice());

    let outcome = auth
        .verify_once("alice", 75.0, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("verification");
    assert_eq!(outcome.score, 100.0);
    assert!(outcome.message().contains("100.00%"));
}

#[test]
fn distance_four_scores_twenty_and_fails() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    let err = auth
        .verify_once("alice", 75.0, &mut repeated(pose(4.0), 60), &mut NeverCancel, |_| {})
        .unwrap_err();
    match err {
        GestureAuthError::BelowThreshold { score } => assert!((score - 20.0).abs() < 1e-9),
        other => panic!("expected BelowThreshold, got {:?}", other),
    }
}

#[test]
fn verify_once_needs_minimum_frames() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    // plenty of frames, but only 30 of them show a hand
    let frames = (0..120).map(|i| if i % 4 == 0 { vec![pose(0.0)] } else { Vec::new() });
    let err = auth
        .verify_once("alice", 75.0, &mut ScriptedSource::new(frames, FPS), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::InsufficientSamples { captured: 30, required: 60 }));
}

#[test]
fn live_run_broken_at_fourteen_needs_thirty_frames() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    let frames = std::iter::repeat(vec![pose(0.0)]).take(14)
        .chain(std::iter::once(vec![pose(4.0)]))
        .chain(std::iter::repeat(vec![pose(0.0)]).take(20));
    let mut source = ScriptedSource::new(frames, FPS);

    let mut decisions = Vec::new();
    let outcome = auth
        .verify_live("alice", 75.0, 15, &mut source, &mut NeverCancel, |d| decisions.push(*d))
        .expect("live verification");

    assert_eq!(outcome.score, 100.0);
    assert_eq!(decisions.len(), 30);
    assert!(decisions[..29].iter().all(|d| !d.is_terminal()));
    assert_eq!(decisions[29], Decision::Authenticated { score: 100.0 });
    assert_eq!(source.remaining(), 5);
}

#[test]
fn live_run_without_enough_matches_ends_with_stream() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    let err = auth
        .verify_live("alice", 75.0, 15, &mut repeated(pose(0.0), 14), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::StreamEnded));
}

#[test]
fn live_parameters_cannot_bypass_the_match_gate() {
    let tmp = tempdir().expect("create temp dir");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    let err = auth
        .verify_live("alice", 75.0, 0, &mut repeated(pose(4.9), 30), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::Config(_)), "{:?}", err);

    let err = auth
        .verify_once("alice", -10.0, &mut repeated(pose(30.0), 60), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::Config(_)), "{:?}", err);

    // one required frame still has to clear the threshold
    let err = auth
        .verify_live("alice", 75.0, 1, &mut repeated(pose(4.9), 30), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::StreamEnded));
}

#[test]
fn duplicate_registration_leaves_store_unchanged() {
    let tmp = tempdir().expect("create temp dir");
    let db = tmp.path().join("users_db.json");
    let auth = open_auth(tmp.path());
    auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("registration");

    let before_template = auth.template("alice").unwrap();
    let before_file = std::fs::read(&db).unwrap();

    let err = auth
        .register("alice", HandMode::Two, &mut repeated(pose(1.0), 60), &mut NeverCancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, GestureAuthError::DuplicateUser(_)));

    assert_eq!(auth.template("alice").unwrap(), before_template);
    assert_eq!(std::fs::read(&db).unwrap(), before_file);
}

#[test]
fn registrations_survive_restart() {
    let tmp = tempdir().expect("create temp dir");
    {
        let auth = open_auth(tmp.path());
        auth.register("alice", HandMode::One, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
            .expect("registration");
    }

    let auth = open_auth(tmp.path());
    assert_eq!(auth.list_users().unwrap(), vec!["alice"]);
    let outcome = auth
        .verify_once("alice", 75.0, &mut repeated(pose(0.0), 60), &mut NeverCancel, |_| {})
        .expect("verification after restart");
    assert_eq!(outcome.score, 100.0);

    let store = auth.into_store().unwrap();
    assert!(store.exists("alice"));
}
