use chrono::{DateTime, Utc};
use cyberlearn_core::model::SessionSettings;
use cyberlearn_core::{ActivityEvent, IdleTimeout, SessionEffect, SessionState};

use crate::identity_service::IdentityService;

/// Idle-timeout controller for one page.
///
/// Owns the timer state and consults the persisted identity on every
/// transition. `now` is passed in by the host, which also owns the actual
/// timer and wakes [`Self::tick`] at [`Self::next_deadline`].
pub struct SessionTimeoutService {
    identity: IdentityService,
    machine: IdleTimeout,
}

impl SessionTimeoutService {
    #[must_use]
    pub fn new(identity: IdentityService, settings: SessionSettings) -> Self {
        Self {
            identity,
            machine: IdleTimeout::new(settings),
        }
    }

    /// Page-load initialization: arm if someone is signed in.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<SessionEffect> {
        self.reset(now)
    }

    /// Qualifying activity: re-arm both deadlines from `now`.
    pub fn record_activity(
        &mut self,
        event: ActivityEvent,
        now: DateTime<Utc>,
    ) -> Option<SessionEffect> {
        tracing::trace!(event = event.dom_name(), "activity");
        self.reset(now)
    }

    /// Forwards a raw DOM event; non-qualifying names are ignored.
    pub fn record_dom_event(&mut self, name: &str, now: DateTime<Utc>) -> Option<SessionEffect> {
        let event = ActivityEvent::from_dom_name(name)?;
        self.record_activity(event, now)
    }

    /// The warning's "Stay signed in" button or its close control.
    pub fn stay_signed_in(&mut self, now: DateTime<Utc>) -> Option<SessionEffect> {
        self.reset(now)
    }

    /// Fire any deadline that has passed.
    ///
    /// On expiry the identity markers are cleared before the effect is
    /// returned; a failing clear is logged and the logout still proceeds.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<SessionEffect> {
        let user = self.identity.active_user();
        let effect = self.machine.tick(user.as_ref(), now);

        match &effect {
            Some(SessionEffect::ForceLogout { redirect_to, .. }) => {
                if let Err(err) = self.identity.logout() {
                    tracing::warn!(error = %err, "session timeout: error during logout");
                }
                tracing::info!(redirect_to = redirect_to.as_str(), "session expired after inactivity");
            }
            Some(SessionEffect::ShowWarning) => tracing::debug!("session idle warning shown"),
            _ => {}
        }
        effect
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.machine.next_deadline()
    }

    #[must_use]
    pub fn machine(&self) -> &IdleTimeout {
        &self.machine
    }

    fn reset(&mut self, now: DateTime<Utc>) -> Option<SessionEffect> {
        let user = self.identity.active_user();
        self.machine.reset(user.as_ref(), now)
    }
}
