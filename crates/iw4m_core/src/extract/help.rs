//! Command documentation from `/Home/Help`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::{nodes_text, nth_text};
use crate::document::Document;

mod selectors {
    pub const CATEGORY: &str = "div.command-assembly-container";
    pub const CATEGORY_TITLE: &str = "h2.content-title.mb-lg-20.mt-20";
    pub const COMMAND_ROW: &str = "tr.d-none.d-lg-table-row.bg-dark-dm.bg-light-lm";
    pub const CELL: &str = "td";
    pub const MIN_LEVEL: &str = "td.text-right";
}

const MIN_COMMAND_CELLS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandHelp {
    pub alias: String,
    pub description: String,
    pub requires_target: String,
    pub syntax: String,
    pub min_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandCategory {
    pub commands: BTreeMap<String, CommandHelp>,
}

/// Categories keyed by their display title.
pub type CommandCatalog = BTreeMap<String, CommandCategory>;

/// Categories sharing a title are merged; a command repeated within a
/// category keeps its last definition. A titled category without usable
/// rows still appears, empty.
pub fn command_catalog(document: &Document) -> CommandCatalog {
    let mut catalog = CommandCatalog::new();
    for container in document.find(selectors::CATEGORY) {
        let title = nodes_text(&container.find(selectors::CATEGORY_TITLE));
        if title.is_empty() {
            continue;
        }
        let category = catalog.entry(title).or_default();

        for row in container.find(selectors::COMMAND_ROW) {
            let cells = row.find(selectors::CELL);
            if cells.len() < MIN_COMMAND_CELLS {
                debug!(cells = cells.len(), "skipping short command row");
                continue;
            }
            category.commands.insert(
                nth_text(&cells, 0),
                CommandHelp {
                    alias: nth_text(&cells, 1),
                    description: nth_text(&cells, 2),
                    requires_target: nth_text(&cells, 3),
                    syntax: nth_text(&cells, 4),
                    min_level: nodes_text(&row.find(selectors::MIN_LEVEL)),
                },
            );
        }
    }
    catalog
}
