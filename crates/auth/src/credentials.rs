//! Presented credentials (identifier + secret).

/// A presented secret (password or equivalent).
///
/// `Debug` never prints the value.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Credentials as submitted by a login form or API client.
///
/// Clients send either a username-shaped `identifier`, an explicit `email`,
/// or both. The explicit email wins when both are present.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub identifier: Option<String>,
    pub email: Option<String>,
    pub secret: Option<Secret>,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            email: None,
            secret: Some(secret.into()),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// The identifier to look up: explicit email first, then the generic
    /// identifier. Blank values count as absent.
    pub fn lookup_identifier(&self) -> Option<&str> {
        non_blank(self.email.as_deref()).or_else(|| non_blank(self.identifier.as_deref()))
    }

    /// The secret, unless absent or empty.
    pub fn presented_secret(&self) -> Option<&Secret> {
        self.secret.as_ref().filter(|s| !s.is_empty())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
