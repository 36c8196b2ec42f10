use thiserror::Error;

use crate::model::{LessonIdError, SettingsError};
use crate::obfuscation::ObfuscationError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    LessonId(#[from] LessonIdError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Obfuscation(#[from] ObfuscationError),
}
