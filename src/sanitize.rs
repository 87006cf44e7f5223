//! HTML-significant character escaping for interpolated values.

/// Escape `&`, `<`, `>`, `"` and `'` as named character references.
///
/// The input is scanned once and every replacement is taken from the
/// original text, so an `&` produced by one replacement is never escaped
/// again within the same call. Escaping is not idempotent: passing an
/// already escaped string escapes its `&` a second time.
///
/// # Examples
///
/// ```rust
/// use localekit::escape;
///
/// assert_eq!(
///     escape("<script>&\"'</script>"),
///     "&lt;script&gt;&amp;&quot;&#039;&lt;/script&gt;"
/// );
/// assert_eq!(escape("&amp;"), "&amp;amp;");
/// assert_eq!(escape(""), "");
/// ```
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
