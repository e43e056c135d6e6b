//! Small single-value extractions: current map and mode, console version,
//! logged-in identity, server selector and permission role lists.

use serde::Serialize;

use super::{node_text, nodes_text, nth_text};
use crate::document::Document;

mod selectors {
    pub const SERVER_HEADER: &str =
        "div.col-12.align-self-center.text-center.text-lg-left.col-lg-4";
    pub const HEADER_SPAN: &str = "span";
    pub const SIDEBAR_LINK: &str = "a.sidebar-link";
    pub const VERSION_TEXT: &str = "span.text-primary";
    pub const IDENTITY: &str = "div.sidebar-link.font-size-12.font-weight-light";
    pub const COLORCODE: &str = "colorcode";
    pub const SERVER_OPTION: &str = "select#console_server_select option";
    pub const LEVEL_OPTION: &str = r#"select[name="level"] option"#;
    pub const ANY_OPTION: &str = "select option";
}

const MAP_SPAN: usize = 0;
const MODE_SPAN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerIdentity {
    pub label: String,
    pub id: String,
}

/// Map name from the server header. With several headers the last one that
/// has any span wins; `None` when nothing non-empty was found.
pub fn map_name(document: &Document) -> Option<String> {
    let mut map = String::new();
    for header in document.find(selectors::SERVER_HEADER) {
        let spans = header.find(selectors::HEADER_SPAN);
        if !spans.is_empty() {
            map = nth_text(&spans, MAP_SPAN);
        }
    }
    (!map.is_empty()).then_some(map)
}

/// Game mode is the third header span; empty when no header has one.
pub fn game_mode(document: &Document) -> String {
    let mut mode = String::new();
    for header in document.find(selectors::SERVER_HEADER) {
        let spans = header.find(selectors::HEADER_SPAN);
        if spans.len() > MODE_SPAN {
            mode = nth_text(&spans, MODE_SPAN);
        }
    }
    mode
}

pub fn version(document: &Document) -> String {
    let mut version = String::new();
    for link in document.find(selectors::SIDEBAR_LINK) {
        let marked = link.find(selectors::VERSION_TEXT);
        if !marked.is_empty() {
            version = nodes_text(&marked);
        }
    }
    version
}

pub fn logged_in_as(document: &Document) -> String {
    document
        .find(selectors::IDENTITY)
        .first()
        .map(|identity| nodes_text(&identity.find(selectors::COLORCODE)))
        .unwrap_or_default()
}

/// Options of the console's server selector; options without a `value`
/// attribute are not servers and are skipped.
pub fn server_ids(document: &Document) -> Vec<ServerIdentity> {
    document
        .find(selectors::SERVER_OPTION)
        .iter()
        .filter_map(|option| {
            let id = option.attr("value")?;
            Some(ServerIdentity {
                label: node_text(option),
                id: id.to_string(),
            })
        })
        .collect()
}

/// Raw `value` attributes of the permission level selector.
pub fn admin_roles(document: &Document) -> Vec<String> {
    document
        .find(selectors::LEVEL_OPTION)
        .iter()
        .filter_map(|option| option.attr("value"))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display names of every selector option, preferring the colour-coded
/// label when the option carries one.
pub fn roles(document: &Document) -> Vec<String> {
    document
        .find(selectors::ANY_OPTION)
        .iter()
        .map(|option| {
            let colored = option.find(selectors::COLORCODE);
            if colored.is_empty() {
                node_text(option)
            } else {
                nodes_text(&colored)
            }
        })
        .filter(|name| !name.is_empty())
        .collect()
}
