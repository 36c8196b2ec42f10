use std::sync::Arc;

use cyberlearn_core::model::{
    ActiveUser, LESSON_IDS, LessonId, LessonMap, ProgressPatch, ProgressState, QuizAccess, UserKey,
};
use serde_json::{Map, Value};
use storage::records::{parse_record, read_raw, write_record};
use storage::{KeyValueStore, StorageError, keys};

use crate::Clock;
use crate::error::ProgressError;
use crate::identity_service::IdentityService;

/// Per-learner lesson progress and the quiz gate derived from it.
///
/// The whole collection is read-modify-written on every save. Two tabs saving
/// at once is last-writer-wins.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    identity: IdentityService,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        let identity = IdentityService::new(Arc::clone(&store));
        Self {
            clock,
            store,
            identity,
        }
    }

    /// The fixed lessons gating the quiz.
    #[must_use]
    pub fn lesson_ids(&self) -> &'static [&'static str] {
        &LESSON_IDS
    }

    #[must_use]
    pub fn active_user_key(&self) -> Option<UserKey> {
        self.identity.active_user_key()
    }

    #[must_use]
    pub fn active_user(&self) -> Option<ActiveUser> {
        self.identity.active_user()
    }

    /// Current learner's progress, normalized.
    ///
    /// Without an identity this is a fresh template that is never persisted.
    #[must_use]
    pub fn load_progress(&self) -> ProgressState {
        let now = self.clock.now();
        match self.active_user_key() {
            Some(key) => {
                let collection = self.load_collection();
                ProgressState::normalize(collection.get(key.as_str()), now)
            }
            None => ProgressState::template(now),
        }
    }

    #[must_use]
    pub fn lessons_progress(&self) -> LessonMap {
        self.load_progress().lessons().clone()
    }

    #[must_use]
    pub fn check_quiz_access(&self) -> QuizAccess {
        self.load_progress().quiz_access()
    }

    /// Persist `state` for the signed-in learner. Silently skipped when
    /// nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the collection cannot be written.
    pub fn save_progress(&self, state: &ProgressState) -> Result<(), ProgressError> {
        let Some(key) = self.active_user_key() else {
            tracing::debug!("no active user; progress not persisted");
            return Ok(());
        };

        let mut collection = self.load_collection();
        let value = state
            .to_value()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        collection.insert(key.as_str().to_owned(), value);
        write_record(self.store.as_ref(), keys::PROGRESS, &collection)?;
        Ok(())
    }

    /// Record a completion report for one lesson.
    ///
    /// The stored value only ever rises, so replayed or out-of-order reports
    /// are harmless. An empty `lesson_id` changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the collection cannot be written.
    pub fn mark_lesson_progress(
        &self,
        lesson_id: &str,
        percent: f64,
    ) -> Result<ProgressState, ProgressError> {
        let mut state = self.load_progress();
        let Ok(lesson) = LessonId::new(lesson_id) else {
            return Ok(state);
        };

        let stored = state.record(lesson, percent);
        self.stamp(&mut state);
        self.save_progress(&state)?;
        tracing::debug!(lesson_id, stored, unlocked = state.quiz_unlocked(), "lesson progress recorded");
        Ok(state)
    }

    /// Overwrite the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the collection cannot be written.
    pub fn merge_patch(&self, patch: ProgressPatch) -> Result<ProgressState, ProgressError> {
        let mut state = self.load_progress();
        state.apply_patch(patch);
        self.stamp(&mut state);
        self.save_progress(&state)?;
        Ok(state)
    }

    /// Apply a pure function to a copy of the current state.
    ///
    /// The result is re-normalized before it is stamped and saved.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the collection cannot be written.
    pub fn transform(
        &self,
        update: impl FnOnce(ProgressState) -> ProgressState,
    ) -> Result<ProgressState, ProgressError> {
        let current = self.load_progress();
        let previous = current.updated_at();
        let mut state = update(current);
        state.renormalize();
        state.stamp(self.clock.stamp_after(previous.max(state.updated_at())));
        self.save_progress(&state)?;
        Ok(state)
    }

    /// Sign out. Progress stays stored under the email.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a marker cannot be removed.
    pub fn logout(&self) -> Result<(), ProgressError> {
        self.identity.logout()
    }

    fn stamp(&self, state: &mut ProgressState) {
        let at = self.clock.stamp_after(state.updated_at());
        state.stamp(at);
    }

    // Entries of other learners are kept as stored, valid or not.
    fn load_collection(&self) -> Map<String, Value> {
        let Some(raw) = read_raw(self.store.as_ref(), keys::PROGRESS) else {
            return Map::new();
        };
        match parse_record::<Value>(&raw) {
            Ok(Value::Object(collection)) => collection,
            Ok(_) => {
                tracing::warn!("progress collection is not an object; starting fresh");
                Map::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "progress reset (parse error)");
                Map::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberlearn_core::time::{term_start_clock, term_start};
    use storage::InMemoryStore;

    fn signed_in(email: &str) -> (InMemoryStore, ProgressService) {
        let store = InMemoryStore::with_entries([(keys::CURRENT_USER_EMAIL, email)]);
        let service = ProgressService::new(term_start_clock(), Arc::new(store.clone()));
        (store, service)
    }

    #[test]
    fn first_read_is_template() {
        let (_, service) = signed_in("ada@example.com");
        assert_eq!(service.load_progress(), ProgressState::template(term_start()));
    }

    #[test]
    fn progress_is_keyed_by_lowercased_email() {
        let (store, service) = signed_in("Ada@Example.COM");
        service.mark_lesson_progress("lesson-1", 50.0).unwrap();

        let raw = store.get(keys::PROGRESS).unwrap().unwrap();
        let collection: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(collection["ada@example.com"]["lessons"]["lesson-1"], 50);
    }

    #[test]
    fn empty_lesson_id_is_ignored() {
        let (store, service) = signed_in("ada@example.com");
        let state = service.mark_lesson_progress("", 100.0).unwrap();
        assert!(state.lessons().is_empty());
        assert_eq!(store.get(keys::PROGRESS).unwrap(), None);
    }

    #[test]
    fn corrupt_collection_degrades_to_template() {
        let store = InMemoryStore::with_entries([
            (keys::CURRENT_USER_EMAIL, "ada@example.com"),
            (keys::PROGRESS, "{{{ definitely not json"),
        ]);
        let service = ProgressService::new(term_start_clock(), Arc::new(store));
        assert_eq!(service.load_progress(), ProgressState::template(term_start()));
        let state = service.mark_lesson_progress("lesson-2", 20.0).unwrap();
        assert_eq!(state.lessons().len(), 1);
    }

    #[test]
    fn other_learners_entries_survive_a_save() {
        let store = InMemoryStore::with_entries([
            (keys::CURRENT_USER_EMAIL, "ada@example.com"),
            (keys::PROGRESS, r#"{"grace@example.com":"legacy-blob"}"#),
        ]);
        let service = ProgressService::new(term_start_clock(), Arc::new(store.clone()));
        service.mark_lesson_progress("lesson-1", 10.0).unwrap();

        let raw = store.get(keys::PROGRESS).unwrap().unwrap();
        let collection: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(collection["grace@example.com"], "legacy-blob");
        assert_eq!(collection["ada@example.com"]["lessons"]["lesson-1"], 10);
    }

    #[test]
    fn updated_at_does_not_go_backwards() {
        let (store, service) = signed_in("ada@example.com");
        let later = term_start() + chrono::Duration::hours(1);
        let ahead = ProgressService::new(Clock::fixed(later), Arc::new(store.clone()));
        ahead.mark_lesson_progress("lesson-1", 10.0).unwrap();

        let state = service.mark_lesson_progress("lesson-1", 20.0).unwrap();
        assert_eq!(state.updated_at(), later);
    }

    #[test]
    fn transform_is_renormalized() {
        let (_, service) = signed_in("ada@example.com");
        let state = service
            .transform(|mut draft| {
                for id in LessonId::course() {
                    draft.lessons_mut().insert(id, 250);
                }
                draft
            })
            .unwrap();
        assert!(state.lessons().values().all(|v| *v == 100));
        assert!(state.quiz_unlocked());
        assert!(service.load_progress().quiz_unlocked());
    }

    #[test]
    fn lesson_ids_exposes_course() {
        let (_, service) = signed_in("ada@example.com");
        assert_eq!(service.lesson_ids().len(), 5);
    }
}
