//! Data-driven cell lookup.
//!
//! "Find a cell" is expressed as a value ([`CellSpec`]) instead of ad hoc
//! conditionals: tag name, optional class token, and whether the interesting
//! text sits inside a nested anchor. Lookups are total — a missing element
//! resolves to the [`NO_INFORMATION`] sentinel so row processing keeps going
//! even when a row has fewer cells than expected.

use scraper::ElementRef;

use crate::parsing::normalize::NO_INFORMATION;

/// Where to find one piece of text below a row element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpec {
    pub tag: &'static str,
    /// Exact class token the element must carry (`None` = first tag match).
    pub class: Option<&'static str>,
    /// Take the text of the first `<a>` inside the cell instead of the
    /// cell's own text.
    pub link_text: bool,
}

impl CellSpec {
    pub const fn td(class: &'static str) -> Self {
        Self {
            tag: "td",
            class: Some(class),
            link_text: false,
        }
    }

    pub const fn linked_td(class: &'static str) -> Self {
        Self {
            tag: "td",
            class: Some(class),
            link_text: true,
        }
    }
}

/// Collect the text of an element and all its descendants with whitespace
/// runs collapsed to single spaces and the ends trimmed.
pub fn collect_text(element: ElementRef<'_>) -> String {
    let mut output = String::new();
    let mut prev_space = false;
    for piece in element.text() {
        for ch in piece.chars() {
            if ch.is_whitespace() {
                if !prev_space {
                    output.push(' ');
                }
                prev_space = true;
            } else {
                output.push(ch);
                prev_space = false;
            }
        }
    }
    output.trim().to_string()
}

/// Whether the element carries `name` as one of its class tokens.
pub fn has_class(element: ElementRef<'_>, name: &str) -> bool {
    element.value().classes().any(|class| class == name)
}

/// Whether the element's class attribute contains `needle` as a substring,
/// case-insensitively. Looser than [`has_class`]; used by heuristics that
/// hunt for "title"-ish or "content"-ish containers.
pub fn class_contains(element: ElementRef<'_>, needle: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|attr| attr.to_lowercase().contains(needle))
}

/// First descendant matching the tag and (optionally) class token.
pub fn find_descendant<'a>(
    scope: ElementRef<'a>,
    tag: &str,
    class: Option<&str>,
) -> Option<ElementRef<'a>> {
    for node in scope.descendants() {
        if node.id() == scope.id() {
            continue;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == tag
                && class.is_none_or(|name| has_class(element, name))
            {
                return Some(element);
            }
        }
    }
    None
}

/// Resolve a [`CellSpec`] below a row element to text, defaulting to the
/// sentinel when the cell (or its expected inner link) is absent.
pub fn cell_text(row: ElementRef<'_>, spec: &CellSpec) -> String {
    let Some(cell) = find_descendant(row, spec.tag, spec.class) else {
        return NO_INFORMATION.to_string();
    };
    if spec.link_text {
        match find_descendant(cell, "a", None) {
            Some(link) => collect_text(link),
            None => NO_INFORMATION.to_string(),
        }
    } else {
        collect_text(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first_row(html: &Html) -> ElementRef<'_> {
        let selector = Selector::parse("tr").unwrap();
        html.select(&selector).next().unwrap()
    }

    #[test]
    fn cell_text_reads_cell_by_class_token() {
        let html = Html::parse_document(
            "<table><tr><td class=\"price\"> 123,45 </td><td class=\"name\">X</td></tr></table>",
        );
        let row = first_row(&html);
        assert_eq!(cell_text(row, &CellSpec::td("price")), "123,45");
    }

    #[test]
    fn missing_cell_resolves_to_sentinel() {
        let html = Html::parse_document("<table><tr><td class=\"price\">1</td></tr></table>");
        let row = first_row(&html);
        assert_eq!(cell_text(row, &CellSpec::td("volume")), NO_INFORMATION);
    }

    #[test]
    fn link_text_prefers_anchor_over_cell_text() {
        let html = Html::parse_document(
            "<table><tr><td class=\"name\">noise <a href=\"/x\">Сбербанк</a></td></tr></table>",
        );
        let row = first_row(&html);
        assert_eq!(cell_text(row, &CellSpec::linked_td("name")), "Сбербанк");
    }

    #[test]
    fn link_text_without_anchor_is_sentinel() {
        let html =
            Html::parse_document("<table><tr><td class=\"name\">Сбербанк</td></tr></table>");
        let row = first_row(&html);
        assert_eq!(cell_text(row, &CellSpec::linked_td("name")), NO_INFORMATION);
    }

    #[test]
    fn collect_text_collapses_whitespace() {
        let html = Html::parse_document("<p>  a\n\t b   c </p>");
        let selector = Selector::parse("p").unwrap();
        let p = html.select(&selector).next().unwrap();
        assert_eq!(collect_text(p), "a b c");
    }

    #[test]
    fn class_matching_modes_differ() {
        let html = Html::parse_document("<div class=\"article__title big\">x</div>");
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();
        assert!(has_class(div, "big"));
        assert!(!has_class(div, "title"));
        assert!(class_contains(div, "title"));
    }
}
