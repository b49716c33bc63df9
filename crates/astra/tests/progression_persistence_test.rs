use astra::progression::{ProgressionEngine, SKILLS_KEY, XP_KEY};
use astra::store::{FileStore, KeyValueStore};
use astra::{NotificationKind, arcade::QuizSession, tasks::trivia::simulated_questions};
use std::sync::Arc;
use tempfile::TempDir;

fn open(dir: &TempDir) -> (Arc<FileStore>, ProgressionEngine) {
    let store = Arc::new(FileStore::in_dir(dir.path()).expect("store"));
    let engine = ProgressionEngine::load(store.clone()).expect("engine");
    (store, engine)
}

#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().expect("temp dir");
    {
        let (_store, engine) = open(&temp_dir);
        engine.add_xp(40, "Daily Login").unwrap();
        engine.add_skill_xp("Astrophysics", 75).unwrap();
    }

    let (store, engine) = open(&temp_dir);
    let state = engine.state();
    assert_eq!(state.xp, 115);
    assert_eq!(state.level, 2);
    assert_eq!(state.skills.get("Astrophysics"), Some(&75));

    // stored values keep their textual encodings
    assert_eq!(store.get(XP_KEY).unwrap().as_deref(), Some("115"));
    assert_eq!(
        store.get(SKILLS_KEY).unwrap().as_deref(),
        Some(r#"{"Astrophysics":75}"#)
    );
}

#[test]
fn test_unreadable_values_load_as_defaults() {
    let temp_dir = TempDir::new().expect("temp dir");
    std::fs::write(
        temp_dir.path().join(FileStore::FILE_NAME),
        r#"{"astra_xp":"lots","astra_skills":"[1,2"}"#,
    )
    .unwrap();

    let (_store, engine) = open(&temp_dir);
    let state = engine.state();
    assert_eq!(state.xp, 0);
    assert_eq!(state.level, 1);
    assert!(state.skills.is_empty());

    // the next award overwrites the bad values
    engine.add_xp(10, "Recovery").unwrap();
    let (_store, reopened) = open(&temp_dir);
    assert_eq!(reopened.state().xp, 10);
}

#[test]
fn test_reset_is_persisted() {
    let temp_dir = TempDir::new().expect("temp dir");
    {
        let (_store, engine) = open(&temp_dir);
        engine.add_skill_xp("Coding", 300).unwrap();
        engine.reset().unwrap();
    }
    let (_store, engine) = open(&temp_dir);
    assert_eq!(engine.state().xp, 0);
    assert!(engine.state().skills.is_empty());
}

#[test]
fn test_arcade_round_feeds_skill_xp() {
    let temp_dir = TempDir::new().expect("temp dir");
    let (_store, engine) = open(&temp_dir);
    let engine = Arc::new(engine);

    let mut session =
        QuizSession::new("Science & Tech", simulated_questions(), engine.clone()).unwrap();
    let first = session.answer(Some(0), 15).unwrap();
    assert_eq!(first.points, 250);
    // 0 -> 250 crosses two levels at once
    assert_eq!(
        first.notification.map(|n| n.kind),
        Some(NotificationKind::LevelUp)
    );
    session.answer(Some(1), 0).unwrap();

    let (_store, reopened) = open(&temp_dir);
    let state = reopened.state();
    assert_eq!(state.xp, 250 + 150);
    assert_eq!(state.skills.get("Science & Tech"), Some(&400));
    assert_eq!(state.level, 5);
}
