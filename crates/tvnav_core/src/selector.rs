//! CSS selector parsing.
//!
//! The browser evaluates configured selectors natively. Here they are parsed
//! with `scraper` so that configuration can be checked up front and so that
//! the in-memory document answers `query_all` / `closest` / `matches` with the
//! same selector strings the page uses.

pub use scraper::Selector;

use crate::error::{NavError, Result};

/// Parse a selector list such as `"a, button, .file-actions a"`.
pub fn parse(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| NavError::invalid_selector(source, e.to_string()))
}

/// Check that `source` is well-formed CSS.
///
/// State pseudo-classes (`:hover`, `:enabled`, `:checked`, ...) depend on the
/// live page. They are accepted here and left to the browser.
pub fn validate(source: &str) -> Result<()> {
    match Selector::parse(source) {
        Ok(_) => Ok(()),
        Err(e) if format!("{:?}", e).contains("UnsupportedPseudoClassOrElement") => {
            log::debug!("selector '{}' relies on page state: {}", source, e);
            Ok(())
        }
        Err(e) => Err(NavError::invalid_selector(source, e.to_string())),
    }
}

/// Join selectors into a single comma-separated list.
pub fn join<S: AsRef<str>>(selectors: &[S]) -> String {
    selectors
        .iter()
        .map(|s| s.as_ref().trim())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_full_css() {
        for source in [
            "a, button, .menu-item, #close-preview",
            "[style*=\"display: none\"]",
            "[role=\"button\"], [tabindex]",
            "a:not(.disabled)",
            ".toolbar + .btn-sm",
            ".toolbar ~ button",
            "li:first-child a",
            ".file-actions > a",
        ] {
            assert!(parse(source).is_ok(), "{}", source);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for source in ["", "a,,b", "a[href", ".modal >", "[style*=\"display: none]"] {
            let err = parse(source).unwrap_err();
            assert!(
                matches!(err, NavError::InvalidSelector { ref selector, .. } if selector == source),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_validate_leaves_state_pseudo_classes_to_the_page() {
        validate("button:enabled").unwrap();
        validate("a:hover, a:focus-visible").unwrap();
        assert!(validate("a[").is_err());
    }

    #[test]
    fn test_join_trims() {
        assert_eq!(join(&["a", " .btn-sm "]), "a, .btn-sm");
    }
}
