//! Ordered field-extraction strategies
//!
//! The upstream site serves several listing templates and changes them
//! without notice. Instead of nested "try this selector, else that one"
//! conditionals, each field is described by an ordered list of strategies
//! tried until one produces a value.

use crate::text::normalize_text;
use scraper::{ElementRef, Selector};

/// An ordered list of CSS selectors, most specific first
#[derive(Debug)]
pub struct SelectorChain {
    selectors: Vec<(&'static str, Selector)>,
}

impl SelectorChain {
    /// Compiles the chain; patterns that fail to parse are skipped
    pub fn new(patterns: &[&'static str]) -> Self {
        let selectors = patterns
            .iter()
            .filter_map(|&pattern| match Selector::parse(pattern) {
                Ok(selector) => Some((pattern, selector)),
                Err(e) => {
                    tracing::warn!("Skipping unparsable selector '{}': {:?}", pattern, e);
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    /// Name of the first selector matching `element`, if any
    pub fn matching(&self, element: &ElementRef<'_>) -> Option<&'static str> {
        self.selectors
            .iter()
            .find(|(_, selector)| selector.matches(element))
            .map(|(pattern, _)| *pattern)
    }

    /// Normalized text of the first match that has any text
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|(_, selector)| {
            scope
                .select(selector)
                .map(|element| element_text(&element))
                .find(|text| !text.is_empty())
        })
    }
}

/// A named way of producing one field from some input
pub struct Strategy<I: ?Sized> {
    pub name: &'static str,
    pub run: fn(&I) -> Option<String>,
}

/// Runs `strategies` in order and returns the first non-empty value
/// together with the name of the strategy that produced it
pub fn first_success<I: ?Sized>(
    input: &I,
    strategies: &[Strategy<I>],
) -> Option<(&'static str, String)> {
    strategies.iter().find_map(|strategy| {
        (strategy.run)(input)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (strategy.name, value))
    })
}

/// Whitespace-normalized text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_first_text_respects_priority() {
        let doc = parse(
            r#"<div><span class="generic-price">1 Kč</span><b class="cena">99 000 Kč</b></div>"#,
        );
        let chain = SelectorChain::new(&[".cena", "[class*='price']"]);
        assert_eq!(
            chain.first_text(doc.root_element()),
            Some("99 000 Kč".to_string())
        );
    }

    #[test]
    fn test_first_text_skips_empty_matches() {
        let doc = parse(r#"<div><p class="popis"> </p><p class="popis">Text</p></div>"#);
        let chain = SelectorChain::new(&[".popis"]);
        assert_eq!(chain.first_text(doc.root_element()), Some("Text".to_string()));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let doc = parse(r#"<div class="x">ok</div>"#);
        let chain = SelectorChain::new(&["div[[[", ".x"]);
        assert_eq!(chain.first_text(doc.root_element()), Some("ok".to_string()));
    }

    #[test]
    fn test_first_success_order() {
        let strategies: [Strategy<str>; 3] = [
            Strategy {
                name: "none",
                run: |_| None,
            },
            Strategy {
                name: "blank",
                run: |_| Some("  ".to_string()),
            },
            Strategy {
                name: "echo",
                run: |input| Some(input.to_string()),
            },
        ];
        assert_eq!(
            first_success("value", &strategies),
            Some(("echo", "value".to_string()))
        );
    }
}
