//! Region alias table mapping raw locale tags to canonical codes.
//!
//! The table is plain data: adding a region means adding an entry, either to
//! [`BUILTIN_ALIASES`] or to an `aliases.json` document loaded at startup.
//! Lookup is pure and total; the caller supplies the set of registered
//! canonical codes for the primary-subtag step.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::locale_code::{LocaleCode, primary_subtag};

/// Region tags shipped with the crate and the canonical code each maps to.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("en-US", "en"),
    ("en-GB", "en"),
    ("en-CA", "en"),
    ("en-AU", "en"),
    ("de-DE", "de"),
    ("de-AT", "de"),
    ("de-CH", "de"),
    ("nl-NL", "nl"),
    ("nl-BE", "nl"),
    ("es-ES", "es"),
    ("es-MX", "es"),
    ("es-AR", "es"),
    ("en", "en"),
    ("de", "de"),
    ("nl", "nl"),
];

/// Immutable mapping from raw locale tags to canonical locale codes.
///
/// # Examples
///
/// ```rust
/// use localekit::RegionAliasTable;
///
/// let table = RegionAliasTable::builtin();
/// let registered = |code: &str| matches!(code, "en" | "de" | "nl" | "es");
/// assert_eq!(table.resolve_alias("de-AT", registered).as_deref(), Some("de"));
/// assert_eq!(table.resolve_alias("EN-us", registered).as_deref(), Some("en"));
/// assert_eq!(table.resolve_alias("es-CO", registered).as_deref(), Some("es"));
/// assert_eq!(table.resolve_alias("fr-FR", registered), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionAliasTable {
    exact: BTreeMap<String, LocaleCode>,
    folded: BTreeMap<String, LocaleCode>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct AliasDocument(BTreeMap<String, LocaleCode>);

impl RegionAliasTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table populated from [`BUILTIN_ALIASES`].
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_ALIASES
            .iter()
            .filter_map(|(raw, canonical)| {
                LocaleCode::new(*canonical)
                    .ok()
                    .map(|code| ((*raw).to_owned(), code))
            })
            .collect()
    }

    /// Parse a JSON object of `"raw-tag": "canonical"` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AliasTable`] when the document is not an object
    /// of strings or a value is not a valid locale code.
    pub fn from_json(origin: &str, document: &str) -> Result<Self, ConfigError> {
        let AliasDocument(entries) =
            serde_json::from_str(document).map_err(|source| ConfigError::AliasTable {
                origin: origin.to_owned(),
                source,
            })?;
        Ok(entries.into_iter().collect())
    }

    /// Return a copy of this table with `raw` mapped to `canonical`.
    #[must_use]
    pub fn with_alias(mut self, raw: impl Into<String>, canonical: LocaleCode) -> Self {
        self.insert(raw.into(), canonical);
        self
    }

    /// Return a copy of this table with every entry of `other` applied on top.
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        for (raw, canonical) in other.exact {
            self.insert(raw, canonical);
        }
        self
    }

    fn insert(&mut self, raw: String, canonical: LocaleCode) {
        self.folded.insert(raw.to_lowercase(), canonical.clone());
        self.exact.insert(raw, canonical);
    }

    /// Resolve `raw_tag` to a canonical code.
    ///
    /// Lookup order, each step tried only when the previous one misses:
    /// exact key match, lower-cased key match, then the primary subtag when
    /// `is_registered` accepts it. Returns `None` when nothing matches.
    pub fn resolve_alias(
        &self,
        raw_tag: &str,
        is_registered: impl Fn(&str) -> bool,
    ) -> Option<LocaleCode> {
        if let Some(code) = self.exact.get(raw_tag) {
            return Some(code.clone());
        }
        let folded = raw_tag.to_lowercase();
        if let Some(code) = self.folded.get(&folded) {
            return Some(code.clone());
        }
        let primary = primary_subtag(&folded);
        if primary.is_empty() || !is_registered(primary) {
            return None;
        }
        LocaleCode::new(primary).ok()
    }

    /// Iterate over `(raw tag, canonical code)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocaleCode)> {
        self.exact.iter().map(|(raw, code)| (raw.as_str(), code))
    }

    /// Number of aliases in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Whether the table holds no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

impl FromIterator<(String, LocaleCode)> for RegionAliasTable {
    fn from_iter<I: IntoIterator<Item = (String, LocaleCode)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (raw, canonical) in iter {
            table.insert(raw, canonical);
        }
        table
    }
}
