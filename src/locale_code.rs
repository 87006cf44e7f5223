//! Locale code types and tag normalization.
//!
//! A [`LocaleCode`] is a validated identifier such as `en` or `de-AT`. Raw
//! preferences reported by the environment stay plain strings until the
//! resolver turns them into a code.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use ortho_config::LanguageIdentifier;
use serde::{Deserialize, Serialize};

use crate::error::LocaleCodeError;

/// Locale used when nothing else is configured.
pub const DEFAULT_FALLBACK_LOCALE: &str = "en";

/// A validated locale identifier.
///
/// The original spelling is preserved so registry keys match what callers
/// registered; validation only checks the tag is a well-formed language
/// identifier.
///
/// # Examples
///
/// ```rust
/// use localekit::LocaleCode;
///
/// let code: LocaleCode = "de-AT".parse().expect("valid code");
/// assert_eq!(code.as_str(), "de-AT");
/// assert_eq!(code.primary_subtag(), "de");
/// assert!("".parse::<LocaleCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleCode(String);

impl LocaleCode {
    /// Validate and wrap `code`.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleCodeError`] when `code` is empty or not a valid
    /// language identifier.
    pub fn new(code: impl Into<String>) -> Result<Self, LocaleCodeError> {
        let raw = code.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LocaleCodeError::Empty);
        }
        if LanguageIdentifier::from_str(trimmed).is_err() {
            return Err(LocaleCodeError::Invalid { code: raw });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language subtag, i.e. everything before the first `-`.
    #[must_use]
    pub fn primary_subtag(&self) -> &str {
        primary_subtag(&self.0)
    }
}

/// The default fallback locale, `en`.
impl Default for LocaleCode {
    fn default() -> Self {
        Self(DEFAULT_FALLBACK_LOCALE.to_owned())
    }
}

impl FromStr for LocaleCode {
    type Err = LocaleCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LocaleCode {
    type Error = LocaleCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LocaleCode {
    type Error = LocaleCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocaleCode> for String {
    fn from(code: LocaleCode) -> Self {
        code.0
    }
}

impl Deref for LocaleCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LocaleCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn primary_subtag(tag: &str) -> &str {
    tag.split_once('-').map_or(tag, |(primary, _)| primary)
}

/// Normalize a raw locale string into a valid BCP 47 language tag.
///
/// This strips encoding suffixes (for example `.UTF-8`), removes variant
/// sections (for example `@latin`), replaces underscores with hyphens, and
/// validates the result using `LanguageIdentifier`.
///
/// # Examples
///
/// ```rust
/// use localekit::locale_code::normalize_tag;
///
/// assert_eq!(normalize_tag("en_US.UTF-8"), Some("en-US".to_owned()));
/// assert_eq!(normalize_tag("es-ES"), Some("es-ES".to_owned()));
/// assert_eq!(normalize_tag("C"), None);
/// ```
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let stripped = trimmed.split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() {
        return None;
    }
    let candidate = stripped.replace('_', "-");
    LanguageIdentifier::from_str(&candidate)
        .ok()
        .map(|lang| lang.to_string())
}
