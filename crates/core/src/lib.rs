#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod obfuscation;
pub mod session;
pub mod time;

pub use error::Error;
pub use obfuscation::{ObfuscationError, Obfuscator};
pub use session::{ActivityEvent, IdleTimeout, SessionEffect, SessionState, SessionTimerState};
pub use time::Clock;
