//! Extractors turning fetched console pages into typed records.
//!
//! Every extractor is a pure function over a parsed [`Document`]. Absent or
//! partial markup never fails an extraction: the affected field falls back to
//! an empty value, or the whole record is skipped when a required field is
//! missing.
//!
//! [`Document`]: crate::document::Document

pub mod admins;
pub mod advanced_stats;
pub mod audit;
pub mod chat;
pub mod clients;
pub mod help;
pub mod leaderboard;
pub mod metadata;
pub mod reports;
pub mod roster;
pub mod rules;

use serde::Serialize;

use crate::document::{Node, Nodes, normalize_text};

/// Label/value pair shown on stat cards and leaderboard rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatEntry {
    pub key: String,
    pub value: String,
}

/// Pair every item of `driver` with the item at the same position in
/// `other`. Output length always equals the driver's; positions `other`
/// cannot fill get `B::default()`, and surplus `other` items are ignored.
pub fn zip_with_default<A, B, I, J>(driver: I, other: J) -> impl Iterator<Item = (A, B)>
where
    I: IntoIterator<Item = A>,
    J: IntoIterator<Item = B>,
    B: Default,
{
    let mut other = other.into_iter();
    driver
        .into_iter()
        .map(move |item| (item, other.next().unwrap_or_default()))
}

/// Insert or replace `key`, keeping first-seen order.
pub(crate) fn upsert_stat(stats: &mut Vec<StatEntry>, key: String, value: String) {
    match stats.iter_mut().find(|entry| entry.key == key) {
        Some(entry) => entry.value = value,
        None => stats.push(StatEntry { key, value }),
    }
}

pub(crate) fn node_text(node: Node<'_>) -> String {
    normalize_text(&node.text())
}

pub(crate) fn nodes_text(nodes: &Nodes<'_>) -> String {
    normalize_text(&nodes.text())
}

/// Normalized text of the `index`-th match, empty when out of range.
pub(crate) fn nth_text(nodes: &Nodes<'_>, index: usize) -> String {
    nodes.nth(index).map(node_text).unwrap_or_default()
}

pub(crate) fn attr_or_empty(nodes: &Nodes<'_>, name: &str) -> String {
    nodes
        .attr(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_with_default_follows_driver_length() {
        let pairs: Vec<(u8, String)> =
            zip_with_default([1, 2, 3], vec!["a".to_string()]).collect();
        assert_eq!(
            pairs,
            vec![
                (1, "a".to_string()),
                (2, String::new()),
                (3, String::new())
            ]
        );

        let pairs: Vec<(u8, u8)> = zip_with_default([1], [10, 20, 30]).collect();
        assert_eq!(pairs, vec![(1, 10)]);

        let pairs: Vec<(u8, u8)> = zip_with_default(Vec::<u8>::new(), [1]).collect();
        assert!(pairs.is_empty());
    }

    #[test]
    fn upsert_stat_replaces_in_place() {
        let mut stats = Vec::new();
        upsert_stat(&mut stats, "Kills".to_string(), "1".to_string());
        upsert_stat(&mut stats, "Deaths".to_string(), "2".to_string());
        upsert_stat(&mut stats, "Kills".to_string(), "3".to_string());
        assert_eq!(
            stats,
            vec![
                StatEntry {
                    key: "Kills".to_string(),
                    value: "3".to_string()
                },
                StatEntry {
                    key: "Deaths".to_string(),
                    value: "2".to_string()
                },
            ]
        );
    }
}
