use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest accepted tenant slug. Keeps `<prefix><slug>` under the 63-byte
/// PostgreSQL identifier limit with the default prefix.
pub const MAX_SLUG_LEN: usize = 40;

/// Tenant for hosts that do not name one
pub const DEV_SLUG: &str = "dev";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("Tenant slug must not be empty")]
    Empty,

    #[error("Tenant slug must be at most {MAX_SLUG_LEN} characters")]
    TooLong,

    #[error("Tenant slug can only contain lowercase letters, numbers and hyphens, starting with a letter or number")]
    InvalidCharacters,
}

/// URL-safe tenant identifier, e.g. the `acme` in `acme.example.com`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn parse(raw: &str) -> Result<Self, SlugError> {
        if raw.is_empty() {
            return Err(SlugError::Empty);
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }

        let mut chars = raw.chars();
        let first_ok = chars
            .next()
            .map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .unwrap_or(false);
        let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !first_ok || !rest_ok {
            return Err(SlugError::InvalidCharacters);
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn dev() -> Self {
        Self(DEV_SLUG.to_string())
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}

impl AsRef<str> for TenantSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
