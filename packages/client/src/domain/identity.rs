//! The authenticated user as the client knows it.

/// Identity fields available to the client after sign-in.
///
/// Any of the optional fields may be missing depending on how the user
/// signed up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: Option<String>,
    /// Free-form display name
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Part of the email before `@` (the whole address if there is no `@`)
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
    }

    /// Best name to show for this identity
    pub fn display_label(&self) -> &str {
        self.username
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email_local_part())
            .unwrap_or(self.id.as_str())
    }
}
