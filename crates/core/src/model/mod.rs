mod account;
mod ids;
mod progress;
mod settings;
mod user;

pub use ids::{LESSON_IDS, LessonId, LessonIdError, UserKey};

pub use account::{Account, AccountCollection, EncryptionStats, MigrationReport, is_marked_encrypted};
pub use progress::{
    COMPLETE, LessonMap, ProgressPatch, ProgressState, QuizAccess, clamp_percent,
};
pub use settings::{
    CoreSettings, CoreSettingsDraft, CredentialSettings, DEFAULT_LOGOUT_AFTER_SECS,
    DEFAULT_OBFUSCATION_KEY, DEFAULT_SIGN_IN_PATH, DEFAULT_WARNING_AFTER_SECS, MAX_THRESHOLD_SECS,
    SessionSettings,
    SessionSettingsDraft, SettingsError,
};
pub use user::ActiveUser;
