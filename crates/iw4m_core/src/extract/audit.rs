use serde::Serialize;
use tracing::debug;

use super::{node_text, nth_text};
use crate::document::{Document, Node};

mod selectors {
    pub const TABLE_BODY: &str = "#audit_log_table_body";
    pub const ROW: &str = "tr.d-none.d-lg-table-row.bg-dark-dm.bg-light-lm";
    pub const CELL: &str = "td";
    pub const LINK: &str = "a";
}

const MIN_AUDIT_CELLS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub origin: String,
    pub origin_link: String,
    pub target: String,
    pub data: String,
    pub time: String,
}

/// Audit rows in document order, at most `count` of them. Rows with fewer
/// than six cells are skipped and do not count towards the limit.
pub fn audit_log(document: &Document, count: usize) -> Vec<AuditLogEntry> {
    entries(document).take(count).collect()
}

/// The newest (first) qualifying audit row.
pub fn latest_audit_entry(document: &Document) -> Option<AuditLogEntry> {
    entries(document).next()
}

fn entries(document: &Document) -> impl Iterator<Item = AuditLogEntry> + '_ {
    document
        .find(selectors::TABLE_BODY)
        .find(selectors::ROW)
        .into_iter()
        .filter_map(entry_from_row)
}

fn entry_from_row(row: Node<'_>) -> Option<AuditLogEntry> {
    let cells = row.find(selectors::CELL);
    if cells.len() < MIN_AUDIT_CELLS {
        debug!(cells = cells.len(), "skipping short audit row");
        return None;
    }
    let origin_link = cells.nth(1).and_then(|cell| cell.find(selectors::LINK).first());
    let target_cell = cells.nth(2);
    let target = match target_cell.and_then(|cell| cell.find(selectors::LINK).first()) {
        Some(link) => node_text(link),
        None => target_cell.map(node_text).unwrap_or_default(),
    };

    Some(AuditLogEntry {
        kind: nth_text(&cells, 0),
        origin: origin_link.map(node_text).unwrap_or_default(),
        origin_link: origin_link
            .and_then(|link| link.attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_default(),
        target,
        data: nth_text(&cells, 4),
        time: nth_text(&cells, 5),
    })
}
