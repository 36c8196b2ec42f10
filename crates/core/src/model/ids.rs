use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed, ordered set of lessons that make up the course.
///
/// The quiz unlocks only when every one of these reaches 100%.
pub const LESSON_IDS: [&str; 5] = ["lesson-1", "lesson-2", "lesson-3", "lesson-4", "lesson-5"];

/// Identifier of a course unit, e.g. `lesson-3`.
///
/// Progress may be recorded for ids outside [`LESSON_IDS`]; they are kept but
/// never count toward the quiz gate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonIdError {
    #[error("lesson id cannot be empty")]
    Empty,
}

impl LessonId {
    /// Creates a `LessonId`, rejecting the empty string.
    ///
    /// # Errors
    ///
    /// Returns `LessonIdError::Empty` for `""`.
    pub fn new(id: impl Into<String>) -> Result<Self, LessonIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(LessonIdError::Empty);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The course lessons in order, as typed ids.
    #[must_use]
    pub fn course() -> Vec<LessonId> {
        LESSON_IDS.iter().map(|id| Self((*id).to_owned())).collect()
    }

    /// Whether this id is one of the quiz-gating lessons.
    #[must_use]
    pub fn is_course_lesson(&self) -> bool {
        LESSON_IDS.contains(&self.0.as_str())
    }
}

/// Identity under which progress is stored: the signed-in email, lower-cased.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    /// Derives the key from a raw email marker. An empty marker means no identity.
    #[must_use]
    pub fn from_email(email: &str) -> Option<Self> {
        if email.is_empty() {
            None
        } else {
            Some(Self(email.to_lowercase()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LessonId {
    type Err = LessonIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lesson_id_is_rejected() {
        assert_eq!(LessonId::new(""), Err(LessonIdError::Empty));
        assert!("".parse::<LessonId>().is_err());
    }

    #[test]
    fn course_lists_five_lessons_in_order() {
        let course = LessonId::course();
        assert_eq!(course.len(), 5);
        assert_eq!(course[0].as_str(), "lesson-1");
        assert_eq!(course[4].as_str(), "lesson-5");
        assert!(course.iter().all(LessonId::is_course_lesson));
    }

    #[test]
    fn bonus_lesson_is_not_course_lesson() {
        let id: LessonId = "bonus".parse().unwrap();
        assert!(!id.is_course_lesson());
        assert_eq!(id.to_string(), "bonus");
    }

    #[test]
    fn user_key_lowercases_email() {
        let key = UserKey::from_email("Ada@Example.COM").unwrap();
        assert_eq!(key.as_str(), "ada@example.com");
    }

    #[test]
    fn empty_email_has_no_key() {
        assert!(UserKey::from_email("").is_none());
    }
}
