use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::ids::{LESSON_IDS, LessonId};

/// Completion percentage per lesson, always within `0..=100`.
pub type LessonMap = BTreeMap<LessonId, u8>;

/// Highest recordable completion.
pub const COMPLETE: u8 = 100;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// One learner's lesson progress plus the derived quiz gate.
///
/// Invariants held by every constructor and mutator:
/// - every lesson value is within `0..=100`
/// - `quiz_unlocked` is true iff every id in [`LESSON_IDS`] is at 100
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    lessons: LessonMap,
    quiz_unlocked: bool,
    updated_at: DateTime<Utc>,
}

impl ProgressState {
    /// The empty record given to a learner with no history.
    #[must_use]
    pub fn template(now: DateTime<Utc>) -> Self {
        Self {
            lessons: LessonMap::new(),
            quiz_unlocked: false,
            updated_at: now,
        }
    }

    /// Rebuilds a state from whatever was persisted.
    ///
    /// Missing or ill-typed fields fall back to template defaults: a non-object
    /// record becomes the template, non-numeric lesson values are dropped,
    /// numeric ones are rounded and clamped, and an unreadable `updatedAt`
    /// becomes `now`. The quiz gate is always recomputed.
    #[must_use]
    pub fn normalize(raw: Option<&Value>, now: DateTime<Utc>) -> Self {
        let Some(Value::Object(fields)) = raw else {
            return Self::template(now);
        };

        let lessons = match fields.get("lessons") {
            Some(Value::Object(entries)) => entries
                .iter()
                .filter_map(|(id, value)| {
                    let id = LessonId::new(id.as_str()).ok()?;
                    let percent = value.as_f64()?;
                    Some((id, clamp_percent(percent)))
                })
                .collect(),
            _ => LessonMap::new(),
        };

        let updated_at = fields
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or(now, |t| t.with_timezone(&Utc));

        let mut state = Self {
            lessons,
            quiz_unlocked: false,
            updated_at,
        };
        state.refresh_gate();
        state
    }

    #[must_use]
    pub fn lessons(&self) -> &LessonMap {
        &self.lessons
    }

    #[must_use]
    pub fn quiz_unlocked(&self) -> bool {
        self.quiz_unlocked
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Recorded completion for `lesson`, 0 when never reported.
    #[must_use]
    pub fn percent(&self, lesson: &LessonId) -> u8 {
        self.lessons.get(lesson).copied().unwrap_or(0)
    }

    /// Records a completion report without ever lowering the stored value.
    ///
    /// Returns the value now stored for the lesson.
    pub fn record(&mut self, lesson: LessonId, percent: f64) -> u8 {
        let reported = clamp_percent(percent);
        let stored = self.lessons.entry(lesson).or_insert(0);
        *stored = (*stored).max(reported);
        let value = *stored;
        self.refresh_gate();
        value
    }

    /// Shallow top-level overwrite; present fields replace current ones.
    pub fn apply_patch(&mut self, patch: ProgressPatch) {
        if let Some(lessons) = patch.lessons {
            self.lessons = lessons;
        }
        self.renormalize();
    }

    /// Mutable access for bespoke edits. Call [`Self::renormalize`] afterwards.
    pub fn lessons_mut(&mut self) -> &mut LessonMap {
        &mut self.lessons
    }

    /// Re-clamps lesson values and recomputes the quiz gate.
    pub fn renormalize(&mut self) {
        for value in self.lessons.values_mut() {
            *value = (*value).min(COMPLETE);
        }
        self.refresh_gate();
    }

    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// Lessons of the course still short of 100%, in course order.
    #[must_use]
    pub fn missing_lessons(&self) -> Vec<LessonId> {
        LessonId::course()
            .into_iter()
            .filter(|id| self.percent(id) < COMPLETE)
            .collect()
    }

    #[must_use]
    pub fn quiz_access(&self) -> QuizAccess {
        let missing = self.missing_lessons();
        if missing.is_empty() {
            QuizAccess::Allowed
        } else {
            QuizAccess::Locked { missing }
        }
    }

    /// Wire form stored under the learner's key.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn refresh_gate(&mut self) {
        self.quiz_unlocked = LESSON_IDS.iter().all(|id| {
            self.lessons
                .iter()
                .any(|(lesson, value)| lesson.as_str() == *id && *value >= COMPLETE)
        });
    }
}

/// Partial overwrite for [`ProgressState::apply_patch`].
///
/// The quiz gate is derived and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub lessons: Option<LessonMap>,
}

impl ProgressPatch {
    #[must_use]
    pub fn lessons(lessons: LessonMap) -> Self {
        Self {
            lessons: Some(lessons),
        }
    }
}

/// Outcome of the quiz gate check performed before navigating to the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAccess {
    Allowed,
    Locked { missing: Vec<LessonId> },
}

impl QuizAccess {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuizAccess::Allowed)
    }
}

/// Rounds and clamps a reported percentage. Non-finite input counts as 0,
/// except +inf which saturates to 100.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_percent(percent: f64) -> u8 {
    if percent.is_nan() {
        return 0;
    }
    percent.round().clamp(0.0, f64::from(COMPLETE)) as u8
}
