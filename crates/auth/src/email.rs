use serde::{Deserialize, Serialize};

use bizauth_core::{DomainError, ValueObject};

/// An email address with case-insensitive identity.
///
/// The address is kept as supplied (trimmed) for display, while equality,
/// hashing and store lookups go through the lowercase [`normalized`] form.
///
/// [`normalized`]: EmailAddress::normalized
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress {
    raw: String,
    normalized: String,
}

impl EmailAddress {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return Err(DomainError::validation("email address cannot be empty"));
        }
        Ok(Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        })
    }

    /// The address as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercase lookup key.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.normalized == normalize(candidate)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl PartialEq for EmailAddress {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for EmailAddress {}

impl core::hash::Hash for EmailAddress {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl ValueObject for EmailAddress {}

impl core::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.raw
    }
}
