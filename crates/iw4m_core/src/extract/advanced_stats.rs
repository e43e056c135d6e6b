//! Per-player advanced statistics page.
//!
//! The lower half of the page holds two families of tables (hit locations
//! and weapon usage) whose containers overlap in class names. Rows are
//! therefore classified by shape rather than by container: exactly four
//! span cells make a hit-location row, six or more a weapon-usage row, and
//! anything else belongs to neither.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{StatEntry, attr_or_empty, nodes_text, nth_text};
use crate::document::{Document, Node};

mod selectors {
    pub const TOP_CARD: &str = "div.align-self-center.d-flex.flex-column.flex-lg-row.flex-fill.mb-15";
    pub const PROFILE_LINK: &str = "a.no-decoration";
    pub const ICON: &str = "img.img-fluid.align-self-center.w-75";
    pub const SUMMARY: &str = "div#client_stats_summary";
    pub const MAIN_CARD: &str = "div.flex-fill.flex-xl-grow-1";
    pub const STAT_CARD: &str = "div.stat-card";
    pub const STAT_KEY: &str = "div.font-size-12.text-muted";
    pub const STAT_VALUE: &str = "div.m-0.font-size-16.text-primary";
    pub const BOTTOM: &str = "div.d-flex.flex-wrap.flex-column-reverse.flex-xl-row";
    pub const HIT_SECTION: &str = "div.mr-0.mr-xl-20.flex-fill.flex-xl-grow-1";
    pub const WEAPON_SECTION: &str = "div.flex-fill.flex-xl-grow-1";
    pub const SECTION_TITLE: &str = "h4.colorcode";
    pub const ROW: &str = "tbody tr.bg-dark-dm.bg-light-lm.d-none.d-lg-table-row";
    pub const CELL: &str = "span";
}

const HIT_LOCATION_CELLS: usize = 4;
const WEAPON_USAGE_MIN_CELLS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HitLocation {
    pub location: String,
    pub hits: String,
    pub percentage: String,
    pub damage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeaponUsage {
    pub weapon: String,
    pub favorite_attachments: String,
    pub kills: String,
    pub hits: String,
    pub damage: String,
    pub usage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvancedStats {
    pub name: String,
    pub link: String,
    pub icon_url: String,
    pub summary: String,
    pub player_stats: Vec<StatEntry>,
    pub hit_locations: BTreeMap<String, Vec<HitLocation>>,
    pub weapon_usages: BTreeMap<String, Vec<WeaponUsage>>,
}

/// `base_url` is prefixed to the rank icon's relative `src`.
pub fn advanced_stats(document: &Document, base_url: &str) -> AdvancedStats {
    let mut stats = AdvancedStats::default();

    let top = document.find(selectors::TOP_CARD);
    if !top.is_empty() {
        let profile = top.find(selectors::PROFILE_LINK);
        stats.name = nodes_text(&profile);
        stats.link = attr_or_empty(&profile, "href");
        let icon = attr_or_empty(&top.find(selectors::ICON), "src");
        if !icon.is_empty() {
            stats.icon_url = format!("{}{icon}", base_url.trim_end_matches('/'));
        }
        stats.summary = nodes_text(&top.find(selectors::SUMMARY));
    }

    for card in document
        .find(selectors::MAIN_CARD)
        .find(selectors::STAT_CARD)
    {
        let key = nodes_text(&card.find(selectors::STAT_KEY));
        let value = nodes_text(&card.find(selectors::STAT_VALUE));
        if !key.is_empty() && !value.is_empty() {
            stats.player_stats.push(StatEntry { key, value });
        }
    }

    let bottom = document.find(selectors::BOTTOM);
    for section in bottom.find(selectors::HIT_SECTION) {
        let rows = section_rows(section, hit_location);
        if !rows.is_empty() {
            stats.hit_locations.insert(section_title(section), rows);
        }
    }
    for section in bottom.find(selectors::WEAPON_SECTION) {
        let rows = section_rows(section, weapon_usage);
        if !rows.is_empty() {
            stats.weapon_usages.insert(section_title(section), rows);
        }
    }

    stats
}

fn section_title(section: Node<'_>) -> String {
    nodes_text(&section.find(selectors::SECTION_TITLE))
}

fn section_rows<T>(section: Node<'_>, parse: fn(&[String]) -> Option<T>) -> Vec<T> {
    section
        .find(selectors::ROW)
        .iter()
        .filter_map(|row| {
            let spans = row.find(selectors::CELL);
            let cells: Vec<String> = (0..spans.len()).map(|index| nth_text(&spans, index)).collect();
            parse(&cells)
        })
        .collect()
}

fn hit_location(cells: &[String]) -> Option<HitLocation> {
    if cells.len() != HIT_LOCATION_CELLS {
        return None;
    }
    Some(HitLocation {
        location: cells[0].clone(),
        hits: cells[1].clone(),
        percentage: cells[2].clone(),
        damage: cells[3].clone(),
    })
}

fn weapon_usage(cells: &[String]) -> Option<WeaponUsage> {
    if cells.len() < WEAPON_USAGE_MIN_CELLS {
        return None;
    }
    Some(WeaponUsage {
        weapon: cells[0].clone(),
        favorite_attachments: cells[1].clone(),
        kills: cells[2].clone(),
        hits: cells[3].clone(),
        damage: cells[4].clone(),
        usage: cells[5].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let spans: String = cells
            .iter()
            .map(|cell| format!("<td><span>{cell}</span></td>"))
            .collect();
        format!(r#"<tr class="bg-dark-dm bg-light-lm d-none d-lg-table-row">{spans}</tr>"#)
    }

    fn section(class: &str, title: &str, rows: &[String]) -> String {
        format!(
            r#"<div class="{class}">
                 <h4 class="colorcode">{title}</h4>
                 <table><tbody>{}</tbody></table>
               </div>"#,
            rows.concat()
        )
    }

    fn page() -> String {
        let hits = section(
            "mr-0 mr-xl-20 flex-fill flex-xl-grow-1",
            "Hit Locations",
            &[
                row(&["Head", "120", "35%", "12000"]),
                row(&["Torso", "80", "25%", "6400", "extra"]),
                row(&["Legs", "40"]),
            ],
        );
        let weapons = section(
            "flex-fill flex-xl-grow-1",
            "Weapon Usage",
            &[
                row(&["M4A1", "Red Dot", "300", "900", "45000", "40%"]),
                row(&["AK-47", "Silencer", "120", "400", "20000", "20%", "bonus"]),
                row(&["Knife", "None", "10", "10", "1000"]),
            ],
        );
        format!(
            r#"<html><body>
<div class="align-self-center d-flex flex-column flex-lg-row flex-fill mb-15">
  <img class="img-fluid align-self-center w-75" src=" /images/stats/ranks/rank_5.png ">
  <a class="no-decoration" href="/Client/Profile/77">Sniper^7Wolf</a>
  <div id="client_stats_summary">Ranked #4 of 1,200 players</div>
</div>
<div class="flex-fill flex-xl-grow-1">
  <div class="stat-card"><div class="m-0 font-size-16 text-primary">2.50</div><div class="font-size-12 text-muted">KDR</div></div>
  <div class="stat-card"><div class="m-0 font-size-16 text-primary"></div><div class="font-size-12 text-muted">Empty</div></div>
  <div class="stat-card"><div class="m-0 font-size-16 text-primary">1,000</div><div class="font-size-12 text-muted">Kills</div></div>
</div>
<div class="d-flex flex-wrap flex-column-reverse flex-xl-row">{hits}{weapons}</div>
</body></html>"#
        )
    }

    #[test]
    fn reads_profile_header_and_stat_cards() {
        let document = Document::parse(&page()).expect("parse");
        let stats = advanced_stats(&document, "http://127.0.0.1:1624/");
        assert_eq!(stats.name, "Sniper^7Wolf");
        assert_eq!(stats.link, "/Client/Profile/77");
        assert_eq!(
            stats.icon_url,
            "http://127.0.0.1:1624/images/stats/ranks/rank_5.png"
        );
        assert_eq!(stats.summary, "Ranked #4 of 1,200 players");
        assert_eq!(
            stats.player_stats,
            vec![
                StatEntry {
                    key: "KDR".to_string(),
                    value: "2.50".to_string()
                },
                StatEntry {
                    key: "Kills".to_string(),
                    value: "1,000".to_string()
                },
            ]
        );
    }

    #[test]
    fn classifies_rows_by_span_count() {
        let document = Document::parse(&page()).expect("parse");
        let stats = advanced_stats(&document, "http://host");

        assert_eq!(stats.hit_locations.len(), 1);
        let hits = &stats.hit_locations["Hit Locations"];
        assert_eq!(
            hits,
            &vec![HitLocation {
                location: "Head".to_string(),
                hits: "120".to_string(),
                percentage: "35%".to_string(),
                damage: "12000".to_string(),
            }]
        );

        assert_eq!(stats.weapon_usages.len(), 1);
        let weapons = &stats.weapon_usages["Weapon Usage"];
        let names: Vec<&str> = weapons.iter().map(|usage| usage.weapon.as_str()).collect();
        assert_eq!(names, vec!["M4A1", "AK-47"]);
        assert_eq!(weapons[1].usage, "20%");
        assert_eq!(weapons[0].favorite_attachments, "Red Dot");
    }

    #[test]
    fn missing_regions_leave_defaults() {
        let document = Document::parse("<html><body><p>private profile</p></body></html>")
            .expect("parse");
        let stats = advanced_stats(&document, "http://host");
        assert_eq!(stats, AdvancedStats::default());
    }

    #[test]
    fn extraction_is_repeatable() {
        let document = Document::parse(&page()).expect("parse");
        assert_eq!(
            advanced_stats(&document, "http://host"),
            advanced_stats(&document, "http://host")
        );
    }
}
