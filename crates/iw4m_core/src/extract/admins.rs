use serde::Serialize;

use super::node_text;
use crate::document::{Document, Node};

mod selectors {
    pub const ROLE_TABLE: &str = "table.table.mb-20";
    pub const ROLE_HEADER: &str = "thead tr th";
    pub const BODY: &str = "tbody";
    pub const ROW: &str = "tr";
    pub const NAME: &str = "a.text-force-break";
    pub const GAME_BADGE: &str = "div.badge";
    pub const CELL: &str = "td";
}

/// Role filter matching every privileged table.
pub const ALL_ROLES: &str = "all";
const UNKNOWN: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminEntry {
    pub name: String,
    pub role: String,
    pub game: String,
    pub last_connected: String,
}

/// Privileged clients from tables whose header matches `role`
/// (case-insensitive, blank meaning [`ALL_ROLES`]). Each entry carries the
/// requested role, not the table header. A `count` of zero means no limit.
pub fn admins(document: &Document, role: &str, count: usize) -> Vec<AdminEntry> {
    let role = match role.trim() {
        "" => ALL_ROLES,
        trimmed => trimmed,
    };
    let limit = if count == 0 { usize::MAX } else { count };

    document
        .find(selectors::ROLE_TABLE)
        .iter()
        .filter(|table| table_matches(*table, role))
        .flat_map(|table| table.find(selectors::BODY).find(selectors::ROW))
        .filter_map(|row| admin_from_row(row, role))
        .take(limit)
        .collect()
}

fn table_matches(table: Node<'_>, role: &str) -> bool {
    let Some(header) = table.find(selectors::ROLE_HEADER).first() else {
        return false;
    };
    role.eq_ignore_ascii_case(ALL_ROLES) || node_text(header).eq_ignore_ascii_case(role)
}

fn admin_from_row(row: Node<'_>, role: &str) -> Option<AdminEntry> {
    let name = row.find(selectors::NAME).first()?;
    let game = row
        .find(selectors::GAME_BADGE)
        .first()
        .map(node_text)
        .unwrap_or_else(|| UNKNOWN.to_string());
    let last_connected = row
        .find(selectors::CELL)
        .last()
        .map(node_text)
        .unwrap_or_else(|| UNKNOWN.to_string());

    Some(AdminEntry {
        name: node_text(name),
        role: role.to_string(),
        game,
        last_connected,
    })
}
