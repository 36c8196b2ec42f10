#![forbid(unsafe_code)]

pub mod app_services;
pub mod credential_service;
pub mod error;
pub mod identity_service;
pub mod progress_service;
pub mod session_service;

pub use cyberlearn_core::Clock;

pub use app_services::AppServices;
pub use credential_service::CredentialService;
pub use error::{AppServicesError, ProgressError};
pub use identity_service::IdentityService;
pub use progress_service::ProgressService;
pub use session_service::SessionTimeoutService;
