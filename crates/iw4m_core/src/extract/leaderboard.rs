use serde::Serialize;

use super::{StatEntry, attr_or_empty, nodes_text, upsert_stat};
use crate::document::{Document, Node};

mod selectors {
    pub const CARD: &str =
        "div.card.m-0.mt-15.p-20.d-flex.flex-column.flex-md-row.justify-content-between";
    pub const RANK_COLUMN: &str = "div.d-flex.flex-column.w-full.w-md-quarter";
    pub const RANK: &str = "div.d-flex.text-muted > div";
    pub const NAME: &str = "div.d-flex.flex-row colorcode";
    pub const PROFILE_LINK: &str = "div.d-flex.flex-row a";
    pub const RATING: &str = "div.font-size-14 span";
    pub const STAT: &str = "div.d-flex.flex-column.font-size-12.text-right.text-md-left div";
    pub const STAT_VALUE: &str = "span.text-primary";
    pub const STAT_LABEL: &str = "span.text-muted";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: String,
    pub name: String,
    pub link: String,
    pub rating: String,
    pub stats: Vec<StatEntry>,
}

/// Leaderboard cards in page order. Cards without the rank column are not
/// player entries and are skipped.
pub fn top_players(document: &Document) -> Vec<LeaderboardEntry> {
    document
        .find(selectors::CARD)
        .iter()
        .filter_map(|card| {
            let column = card.find(selectors::RANK_COLUMN);
            if column.is_empty() {
                return None;
            }
            let stats = column
                .find(selectors::STAT)
                .iter()
                .fold(Vec::new(), |mut stats, stat| {
                    if let Some((label, value)) = stat_pair(stat) {
                        upsert_stat(&mut stats, label, value);
                    }
                    stats
                });

            Some(LeaderboardEntry {
                rank: format!("#{}", nodes_text(&column.find(selectors::RANK))),
                name: nodes_text(&column.find(selectors::NAME)),
                link: attr_or_empty(&column.find(selectors::PROFILE_LINK), "href"),
                rating: nodes_text(&column.find(selectors::RATING)),
                stats,
            })
        })
        .collect()
}

/// Label and value of one stat line; both must be present.
fn stat_pair(stat: Node<'_>) -> Option<(String, String)> {
    let value = nodes_text(&stat.find(selectors::STAT_VALUE));
    let label = nodes_text(&stat.find(selectors::STAT_LABEL));
    if value.is_empty() || label.is_empty() {
        return None;
    }
    Some((label, value))
}
