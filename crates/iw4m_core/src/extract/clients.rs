use serde::Serialize;

use super::{attr_or_empty, nodes_text};
use crate::document::Document;

mod selectors {
    pub const ENTRY: &str = "div.bg-very-dark-dm.bg-light-ex-lm.p-15.rounded.mb-10";
    pub const HEADER: &str = "div.d-flex.flex-row";
    pub const PROFILE_LINK: &str = "a.h4.mr-auto";
    pub const NAME: &str = "colorcode";
    pub const COUNTRY: &str = "div[data-toggle='tooltip']";
    pub const IP_ADDRESS: &str = "div.align-self-center.mr-auto";
    pub const LAST_SEEN: &str = "div.align-self-center.text-muted.font-size-12";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentClient {
    pub name: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub ip_address: String,
    pub last_seen: String,
}

/// One page of recently connected clients. Entries without a display name
/// are dropped.
pub fn recent_clients(document: &Document) -> Vec<RecentClient> {
    let mut clients = Vec::new();
    for entry in document.find(selectors::ENTRY) {
        let mut client = RecentClient::default();

        if let Some(header) = entry.find(selectors::HEADER).first() {
            let profile = header.find(selectors::PROFILE_LINK);
            client.name = nodes_text(&profile.find(selectors::NAME));
            client.link = attr_or_empty(&profile, "href");
            client.country = header
                .find(selectors::COUNTRY)
                .attr("data-title")
                .map(|country| country.trim().to_string());
        }
        client.ip_address = nodes_text(&entry.find(selectors::IP_ADDRESS));
        client.last_seen = nodes_text(&entry.find(selectors::LAST_SEEN));

        if !client.name.is_empty() {
            clients.push(client);
        }
    }
    clients
}
