//! Translation bundles and template interpolation.
//!
//! A bundle is a flat map from translation key to template string. Bundle
//! documents may nest objects to group keys; nesting is flattened into dotted
//! keys when the document is parsed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BundleError;
use crate::locale_code::LocaleCode;
use crate::sanitize::escape;

/// Loaded translation templates for one locale.
///
/// # Examples
///
/// ```rust
/// use localekit::{Bundle, LocaleCode};
///
/// let locale = LocaleCode::new("en").expect("valid code");
/// let bundle = Bundle::from_json(locale, r#"{"app": {"greeting": "Hello, {name}!"}}"#)
///     .expect("bundle should parse");
/// assert_eq!(
///     bundle.format("app.greeting", &[("name", "<Ann>")]).as_deref(),
///     Some("Hello, &lt;Ann&gt;!")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    locale: LocaleCode,
    messages: BTreeMap<String, String>,
}

impl Bundle {
    /// Build a bundle from already flattened key/template pairs.
    #[must_use]
    pub fn new<K, V>(locale: LocaleCode, messages: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            locale,
            messages: messages
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Parse a JSON bundle document.
    ///
    /// Leaves must be strings; nested objects contribute dotted keys.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Parse`] for invalid JSON and
    /// [`BundleError::UnsupportedValue`] for non-string leaves or a top-level
    /// value that is not an object.
    pub fn from_json(locale: LocaleCode, document: &str) -> Result<Self, BundleError> {
        let value: Value = serde_json::from_str(document).map_err(|err| BundleError::Parse {
            locale: locale.clone(),
            source: Arc::new(err),
        })?;
        let mut messages = BTreeMap::new();
        flatten_into(&locale, String::new(), value, &mut messages)?;
        Ok(Self { locale, messages })
    }

    /// Locale the bundle was loaded for.
    #[must_use]
    pub const fn locale(&self) -> &LocaleCode {
        &self.locale
    }

    /// Raw template for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Whether the bundle defines `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Render the template for `key`, escaping every substituted value.
    ///
    /// Placeholders take the form `{name}`. Placeholders without a matching
    /// argument are left untouched.
    #[must_use]
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        self.get(key).map(|template| interpolate(template, args))
    }

    /// Iterate over translation keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Number of templates in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the bundle is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn flatten_into(
    locale: &LocaleCode,
    prefix: String,
    value: Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), BundleError> {
    match value {
        Value::String(text) if !prefix.is_empty() => {
            out.insert(prefix, text);
            Ok(())
        }
        Value::Object(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(locale, path, child, out)?;
            }
            Ok(())
        }
        _ => Err(BundleError::UnsupportedValue {
            locale: locale.clone(),
            key: prefix,
        }),
    }
}

/// Substitute `{name}` placeholders in a single pass.
///
/// Substituted values are escaped; the template text itself is trusted and
/// copied verbatim. Substitutions are never rescanned.
pub(crate) fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            result.push(ch);
            continue;
        }
        let mut token = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            token.push(c);
        }
        match (closed, args.iter().find(|(name, _)| *name == token)) {
            (true, Some((_, value))) => result.push_str(&escape(value)),
            (true, None) => {
                result.push('{');
                result.push_str(&token);
                result.push('}');
            }
            (false, _) => {
                result.push('{');
                result.push_str(&token);
            }
        }
    }

    result
}
