use serde::Serialize;

use crate::model::ids::UserKey;

/// The signed-in learner as seen by navigation and session glue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveUser {
    pub email: String,
    pub name: String,
}

impl ActiveUser {
    /// Builds the view from the persisted identity markers.
    ///
    /// Either marker is enough; empty markers count as absent. The name falls
    /// back to the local part of the email, then to `Guest`.
    #[must_use]
    pub fn from_markers(email: Option<&str>, name: Option<&str>) -> Option<Self> {
        let email = email.filter(|e| !e.is_empty());
        let name = name.filter(|n| !n.is_empty());
        if email.is_none() && name.is_none() {
            return None;
        }

        let name = match (name, email) {
            (Some(name), _) => name.to_owned(),
            (None, Some(email)) => email.split('@').next().unwrap_or_default().to_owned(),
            (None, None) => "Guest".to_owned(),
        };

        Some(Self {
            email: email.unwrap_or_default().to_owned(),
            name,
        })
    }

    #[must_use]
    pub fn key(&self) -> Option<UserKey> {
        UserKey::from_email(&self.email)
    }

    /// Up to two upper-case initials for the avatar button.
    #[must_use]
    pub fn initials(&self) -> String {
        let source = if self.name.trim().is_empty() {
            self.email.as_str()
        } else {
            self.name.as_str()
        };

        let cleaned: String = source
            .chars()
            .map(|c| if c.is_ascii_alphabetic() || c == ' ' { c } else { ' ' })
            .collect();
        let words: Vec<&str> = cleaned.split_whitespace().collect();

        if words.is_empty() && !self.email.is_empty() {
            return self.email.chars().take(2).collect::<String>().to_uppercase();
        }

        let initials: String = words
            .iter()
            .take(2)
            .filter_map(|word| word.chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if initials.is_empty() {
            "CL".to_owned()
        } else {
            initials
        }
    }
}
