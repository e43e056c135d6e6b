use super::node_text;
use crate::document::Document;

mod selectors {
    pub const CARD: &str = "div.card.m-0.rounded";
    pub const RULES_HEADING: &str = "h5.text-primary.mt-0.mb-0";
    pub const RULE: &str = "div.rule";
}

/// Server rules from the About page, in document order. Only cards carrying
/// the rules heading contribute; other cards on the page are ignored.
pub fn rules(document: &Document) -> Vec<String> {
    document
        .find(selectors::CARD)
        .iter()
        .filter(|card| !card.find(selectors::RULES_HEADING).is_empty())
        .flat_map(|card| card.find(selectors::RULE))
        .map(node_text)
        .collect()
}
