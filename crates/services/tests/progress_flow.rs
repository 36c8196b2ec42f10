use std::sync::Arc;

use cyberlearn_core::model::{LessonId, LessonMap, ProgressPatch, ProgressState, QuizAccess, clamp_percent};
use cyberlearn_core::time::{term_start_clock, term_start};
use proptest::prelude::*;
use services::ProgressService;
use storage::{InMemoryStore, KeyValueStore, keys};

fn signed_in_store() -> InMemoryStore {
    InMemoryStore::with_entries([
        (keys::CURRENT_USER_EMAIL, "Learner@Example.com"),
        (keys::CURRENT_USER_NAME, "Learner"),
    ])
}

fn service(store: &InMemoryStore) -> ProgressService {
    ProgressService::new(term_start_clock(), Arc::new(store.clone()))
}

#[test]
fn clamps_out_of_range_reports() {
    let store = signed_in_store();
    let progress = service(&store);

    let state = progress.mark_lesson_progress("lesson-1", 150.0).unwrap();
    assert_eq!(state.percent(&LessonId::new("lesson-1").unwrap()), 100);

    let state = progress.mark_lesson_progress("lesson-2", -20.0).unwrap();
    assert_eq!(state.percent(&LessonId::new("lesson-2").unwrap()), 0);
}

#[test]
fn quiz_unlocks_only_when_all_five_complete() {
    let store = signed_in_store();
    let progress = service(&store);

    for id in ["lesson-1", "lesson-2", "lesson-3", "lesson-4"] {
        progress.mark_lesson_progress(id, 100.0).unwrap();
    }
    let state = progress.mark_lesson_progress("lesson-5", 99.0).unwrap();
    assert!(!state.quiz_unlocked());
    assert_eq!(
        progress.check_quiz_access(),
        QuizAccess::Locked {
            missing: vec![LessonId::new("lesson-5").unwrap()]
        }
    );

    let state = progress.mark_lesson_progress("lesson-5", 100.0).unwrap();
    assert!(state.quiz_unlocked());
    assert!(progress.load_progress().quiz_unlocked());
    assert!(progress.check_quiz_access().is_allowed());
}

#[test]
fn anonymous_session_never_touches_storage() {
    let store = InMemoryStore::new();
    let progress = service(&store);

    assert!(progress.active_user().is_none());
    let state = progress.mark_lesson_progress("lesson-1", 60.0).unwrap();
    assert_eq!(state.percent(&LessonId::new("lesson-1").unwrap()), 60);
    assert_eq!(store.get(keys::PROGRESS).unwrap(), None);
    assert_eq!(progress.load_progress(), ProgressState::template(term_start()));
}

#[test]
fn logout_keeps_history_for_next_login() {
    let store = signed_in_store();
    let progress = service(&store);
    progress.mark_lesson_progress("lesson-3", 70.0).unwrap();

    progress.logout().unwrap();
    assert!(progress.active_user().is_none());
    assert_eq!(store.get(keys::CURRENT_USER_NAME).unwrap(), None);
    assert!(progress.lessons_progress().is_empty());

    store
        .set(keys::CURRENT_USER_EMAIL, "learner@example.com")
        .unwrap();
    assert_eq!(
        progress.lessons_progress().get(&LessonId::new("lesson-3").unwrap()),
        Some(&70)
    );
}

#[test]
fn patch_replaces_lessons_wholesale() {
    let store = signed_in_store();
    let progress = service(&store);
    progress.mark_lesson_progress("lesson-1", 100.0).unwrap();

    let mut lessons = LessonMap::new();
    lessons.insert(LessonId::new("lesson-4").unwrap(), 40);
    let state = progress.merge_patch(ProgressPatch::lessons(lessons)).unwrap();

    assert_eq!(state.lessons().len(), 1);
    assert_eq!(progress.lessons_progress(), state.lessons().clone());
}

#[test]
fn active_user_view_for_navigation() {
    let store = signed_in_store();
    let user = service(&store).active_user().unwrap();
    assert_eq!(user.email, "Learner@Example.com");
    assert_eq!(user.name, "Learner");
    assert_eq!(user.initials(), "L");
}

proptest! {
    #[test]
    fn stored_value_is_max_of_reports_in_any_order(p1 in -50.0_f64..200.0, p2 in -50.0_f64..200.0) {
        let expected = clamp_percent(p1).max(clamp_percent(p2));
        let lesson = LessonId::new("lesson-2").unwrap();

        let forward = signed_in_store();
        let svc = service(&forward);
        svc.mark_lesson_progress("lesson-2", p1).unwrap();
        let a = svc.mark_lesson_progress("lesson-2", p2).unwrap();

        let backward = signed_in_store();
        let svc = service(&backward);
        svc.mark_lesson_progress("lesson-2", p2).unwrap();
        let b = svc.mark_lesson_progress("lesson-2", p1).unwrap();

        prop_assert_eq!(a.percent(&lesson), expected);
        prop_assert_eq!(b.percent(&lesson), expected);
    }
}
