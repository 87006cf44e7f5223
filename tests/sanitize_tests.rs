//! Integration tests for HTML escaping of interpolated values.

use anyhow::{Result, ensure};
use localekit::{Bundle, escape};
use proptest::prelude::*;
use rstest::rstest;
use test_support::code;

#[rstest]
#[case("", "")]
#[case("plain text", "plain text")]
#[case("<script>alert('x')</script>", "&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;")]
#[case("<script>&\"'</script>", "&lt;script&gt;&amp;&quot;&#039;&lt;/script&gt;")]
#[case("Tom & \"Jerry\"", "Tom &amp; &quot;Jerry&quot;")]
#[case("&amp;", "&amp;amp;")]
#[case("naïve – 日本", "naïve – 日本")]
fn escapes_the_five_significant_characters(
    #[case] raw: &str,
    #[case] expected: &str,
) -> Result<()> {
    let escaped = escape(raw);
    ensure!(escaped == expected, "escape({raw:?}) gave {escaped:?}");
    Ok(())
}

#[test]
fn escaped_output_contains_no_markup_characters() -> Result<()> {
    let hostile = "<img src=x onerror=\"alert('pwn')\"> & more <>\"'";
    let escaped = escape(hostile);
    ensure!(!escaped.contains(['<', '>', '"', '\'']));
    ensure!(
        escaped.matches('&').count() == escaped.matches(';').count(),
        "every ampersand starts an entity: {escaped}"
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2048))]

    /// No markup character survives escaping, whatever the input.
    #[test]
    fn escaping_never_leaves_markup_characters(raw in "\\PC{0,32}") {
        let escaped = escape(&raw);
        prop_assert!(
            !escaped.contains(['<', '>', '"', '\'']),
            "{:?} escaped to {:?}",
            raw,
            escaped
        );
        prop_assert!(escaped.len() >= raw.len());
    }
}

#[test]
fn bundle_formatting_escapes_values_but_not_templates() -> Result<()> {
    let bundle = Bundle::new(
        code("en"),
        [("profile.card", "<b>{user}</b> sent {count} {missing}")],
    );
    let rendered = bundle.format("profile.card", &[("user", "<i>Eve</i>"), ("count", "{user}")]);
    ensure!(
        rendered.as_deref() == Some("<b>&lt;i&gt;Eve&lt;/i&gt;</b> sent {user} {missing}"),
        "unexpected rendering {rendered:?}"
    );
    Ok(())
}
