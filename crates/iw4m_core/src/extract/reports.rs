use serde::Serialize;

use super::{nodes_text, nth_text, zip_with_default};
use crate::document::Document;

mod selectors {
    pub const TIMESTAMP_BLOCK: &str = "div.rounded.bg-very-dark-dm.bg-light-ex-lm.mt-10.mb-10.p-10";
    pub const TIMESTAMP: &str = "div.font-weight-bold";
    pub const ENTRY: &str = "div.font-size-12";
    pub const ORIGIN: &str = "a";
    pub const REASON: &str = "span.text-white-dm.text-black-lm colorcode";
    pub const TARGET: &str = "span.text-highlight a";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub origin: String,
    pub reason: String,
    pub target: String,
    pub timestamp: String,
}

/// Recent reports. Report bodies and their timestamps render in separate
/// containers, so they are paired by position; bodies beyond the last
/// timestamp get an empty one. The reporter is the entry's first link, never
/// the nested target link.
pub fn reports(document: &Document) -> Vec<Report> {
    let timestamps: Vec<String> = document
        .find(selectors::TIMESTAMP_BLOCK)
        .iter()
        .map(|block| nodes_text(&block.find(selectors::TIMESTAMP)))
        .collect();

    zip_with_default(document.find(selectors::ENTRY), timestamps)
        .map(|(entry, timestamp)| Report {
            origin: nth_text(&entry.find(selectors::ORIGIN), 0),
            reason: nodes_text(&entry.find(selectors::REASON)),
            target: nodes_text(&entry.find(selectors::TARGET)),
            timestamp,
        })
        .collect()
}
