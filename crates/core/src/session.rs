//! Idle-timeout state machine for a signed-in page.
//!
//! The machine owns two absolute deadlines, both armed on every reset: one to
//! surface the "are you still there?" warning and one to force a logout. The
//! host drives it by forwarding activity and calling [`IdleTimeout::tick`]
//! when its timer fires; [`IdleTimeout::next_deadline`] says when that is.

use chrono::{DateTime, Utc};

use crate::model::{ActiveUser, SessionSettings, UserKey};

/// DOM events that count as the learner being present.
pub const QUALIFYING_EVENTS: [&str; 5] = ["click", "keydown", "mousemove", "scroll", "touchstart"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No identity; nothing armed.
    Inactive,
    /// Counting toward the warning.
    Armed,
    /// Warning shown; counting toward the forced logout.
    Warning,
    /// Logout forced. Terminal until the next reset.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityEvent {
    Click,
    KeyDown,
    MouseMove,
    Scroll,
    TouchStart,
}

impl ActivityEvent {
    /// Maps a DOM event name; anything else is not qualifying activity.
    #[must_use]
    pub fn from_dom_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(Self::Click),
            "keydown" => Some(Self::KeyDown),
            "mousemove" => Some(Self::MouseMove),
            "scroll" => Some(Self::Scroll),
            "touchstart" => Some(Self::TouchStart),
            _ => None,
        }
    }

    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::MouseMove => "mousemove",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
        }
    }
}

/// What the host has to render after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    ShowWarning,
    HideWarning,
    /// Hide any warning, show `notice`, navigate to `redirect_to`.
    ForceLogout { notice: String, redirect_to: String },
}

//
// ─── TIMERS ────────────────────────────────────────────────────────────────────
//

/// The two pending deadlines plus the identity they were armed for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTimerState {
    warning_at: Option<DateTime<Utc>>,
    logout_at: Option<DateTime<Utc>>,
    active_user_key: Option<UserKey>,
}

impl SessionTimerState {
    /// Arms both deadlines from `now`, replacing anything pending.
    ///
    /// A deadline past the end of representable time is left unset.
    pub fn arm(&mut self, user: &ActiveUser, now: DateTime<Utc>, settings: &SessionSettings) {
        self.warning_at = now.checked_add_signed(settings.warning_after());
        self.logout_at = now.checked_add_signed(settings.logout_after());
        self.active_user_key = user.key();
    }

    /// Clears both deadlines.
    pub fn cancel(&mut self) {
        self.warning_at = None;
        self.logout_at = None;
        self.active_user_key = None;
    }

    #[must_use]
    pub fn warning_at(&self) -> Option<DateTime<Utc>> {
        self.warning_at
    }

    #[must_use]
    pub fn logout_at(&self) -> Option<DateTime<Utc>> {
        self.logout_at
    }

    #[must_use]
    pub fn active_user_key(&self) -> Option<&UserKey> {
        self.active_user_key.as_ref()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.warning_at.is_some() || self.logout_at.is_some()
    }

    fn logout_due(&self, now: DateTime<Utc>) -> bool {
        self.logout_at.is_some_and(|at| now >= at)
    }

    // One-shot: a fired warning deadline is consumed.
    fn take_due_warning(&mut self, now: DateTime<Utc>) -> bool {
        if self.warning_at.is_some_and(|at| now >= at) {
            self.warning_at = None;
            true
        } else {
            false
        }
    }
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

/// Single-instance idle-timeout controller state.
#[derive(Debug, Clone)]
pub struct IdleTimeout {
    settings: SessionSettings,
    timers: SessionTimerState,
    state: SessionState,
}

impl IdleTimeout {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            timers: SessionTimerState::default(),
            state: SessionState::Inactive,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn timers(&self) -> &SessionTimerState {
        &self.timers
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Earliest pending deadline, for scheduling the next [`Self::tick`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.timers.warning_at, self.timers.logout_at) {
            (Some(w), Some(l)) => Some(w.min(l)),
            (w, l) => w.or(l),
        }
    }

    /// Qualifying activity or an explicit "stay signed in".
    ///
    /// Cancels both deadlines, hides a visible warning and re-arms from `now`
    /// when an identity is present; otherwise settles in `Inactive`.
    pub fn reset(
        &mut self,
        identity: Option<&ActiveUser>,
        now: DateTime<Utc>,
    ) -> Option<SessionEffect> {
        let was_warning = self.state == SessionState::Warning;
        self.timers.cancel();

        match identity {
            Some(user) => {
                self.timers.arm(user, now, &self.settings);
                self.state = SessionState::Armed;
            }
            None => self.state = SessionState::Inactive,
        }

        was_warning.then_some(SessionEffect::HideWarning)
    }

    /// Evaluates pending deadlines at `now`.
    ///
    /// The caller performs the logout itself when `ForceLogout` is returned.
    pub fn tick(
        &mut self,
        identity: Option<&ActiveUser>,
        now: DateTime<Utc>,
    ) -> Option<SessionEffect> {
        if identity.is_none() {
            let was_warning = self.state == SessionState::Warning;
            self.timers.cancel();
            self.state = SessionState::Inactive;
            return was_warning.then_some(SessionEffect::HideWarning);
        }

        if self.timers.logout_due(now) {
            self.timers.cancel();
            self.state = SessionState::Expired;
            return Some(SessionEffect::ForceLogout {
                notice: self.settings.logout_notice().to_owned(),
                redirect_to: self.settings.sign_in_path().to_owned(),
            });
        }

        if self.state == SessionState::Armed && self.timers.take_due_warning(now) {
            self.state = SessionState::Warning;
            return Some(SessionEffect::ShowWarning);
        }

        None
    }
}
