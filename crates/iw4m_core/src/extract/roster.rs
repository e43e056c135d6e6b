//! Online player roster from the home page.
//!
//! Each permission level renders its players with a distinct link class, so
//! the roster is built by running one selector per [`Role`] in priority
//! order. A player whose link matches several role selectors is listed once
//! per match.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::nodes_text;
use crate::document::Document;

mod selectors {
    pub const CREATOR: &str = "a.level-color-7.no-decoration.text-truncate.ml-5.mr-5";
    pub const OWNER: &str = "a.level-color-6.no-decoration.text-truncate.ml-5.mr-5";
    pub const MODERATOR: &str = "a.level-color-5.no-decoration.text-truncate.ml-5.mr-5";
    pub const SENIOR: &str = "a.level-color-4.no-decoration.text-truncate.ml-5.mr-5";
    pub const ADMIN: &str = "a.level-color-3.no-decoration.text-truncate.ml-5.mr-5";
    pub const TRUSTED: &str = "a.level-color-2.no-decoration.text-truncate.ml-5.mr-5";
    pub const USER: &str = "a.text-light-dm.text-dark-lm.no-decoration.text-truncate.ml-5.mr-5";
    pub const FLAGGED: &str = "a.level-color-1.no-decoration.text-truncate.ml-5.mr-5";
    pub const BANNED: &str = "a.level-color--1.no-decoration.text-truncate.ml-5.mr-5";
    pub const NAME: &str = "colorcode";
}

/// Profile links look like `/Client/Profile/<id>`; the identifier starts at
/// this byte offset.
pub const PROFILE_ID_OFFSET: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    Owner,
    Moderator,
    Senior,
    Admin,
    Trusted,
    User,
    Flagged,
    Banned,
}

impl Role {
    /// Every role, highest priority first.
    pub const ALL: [Role; 9] = [
        Role::Creator,
        Role::Owner,
        Role::Moderator,
        Role::Senior,
        Role::Admin,
        Role::Trusted,
        Role::User,
        Role::Flagged,
        Role::Banned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Owner => "owner",
            Role::Moderator => "moderator",
            Role::Senior => "senior",
            Role::Admin => "admin",
            Role::Trusted => "trusted",
            Role::User => "user",
            Role::Flagged => "flagged",
            Role::Banned => "banned",
        }
    }

    fn selector(self) -> &'static str {
        match self {
            Role::Creator => selectors::CREATOR,
            Role::Owner => selectors::OWNER,
            Role::Moderator => selectors::MODERATOR,
            Role::Senior => selectors::SENIOR,
            Role::Admin => selectors::ADMIN,
            Role::Trusted => selectors::TRUSTED,
            Role::User => selectors::USER,
            Role::Flagged => selectors::FLAGGED,
            Role::Banned => selectors::BANNED,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub role: Role,
    pub name: String,
    pub identifier: String,
    pub url: String,
}

pub fn roster(document: &Document) -> Vec<RosterEntry> {
    let mut entries = Vec::new();
    for role in Role::ALL {
        for link in document.find(role.selector()) {
            let names = link.find(selectors::NAME);
            if names.is_empty() {
                continue;
            }
            let Some(href) = link.attr("href") else {
                continue;
            };
            let Some(identifier) = profile_identifier(href) else {
                debug!(role = %role, href, "skipping roster link with short profile URL");
                continue;
            };
            entries.push(RosterEntry {
                role,
                name: nodes_text(&names),
                identifier: identifier.to_string(),
                url: href.trim().to_string(),
            });
        }
    }
    entries
}

/// Bytes of `href` past [`PROFILE_ID_OFFSET`], or `None` when nothing
/// follows the offset.
fn profile_identifier(href: &str) -> Option<&str> {
    if href.len() <= PROFILE_ID_OFFSET {
        return None;
    }
    href.get(PROFILE_ID_OFFSET..)
}
