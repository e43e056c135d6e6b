//! Public console operations.
//!
//! Every operation is a stateless fetch-parse-extract round trip through the
//! owned [`SessionGateway`]. Nothing is cached between calls.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ConsoleSettings;
use crate::document::Document;
use crate::error::{ConsoleError, Result};
use crate::extract::admins::{self, AdminEntry};
use crate::extract::advanced_stats::{self, AdvancedStats};
use crate::extract::audit::{self, AuditLogEntry};
use crate::extract::chat::{self, ChatLine};
use crate::extract::clients::{self, RecentClient};
use crate::extract::help::{self, CommandCatalog};
use crate::extract::leaderboard::{self, LeaderboardEntry};
use crate::extract::metadata::{self, ServerIdentity};
use crate::extract::reports::{self, Report};
use crate::extract::roster::{self, RosterEntry};
use crate::extract::rules;
use crate::gateway::{ConsoleClient, FetchControl, SessionGateway};
use crate::request::{self, ConsoleRequest, FindPlayerQuery, GLOBAL_LEADERBOARD_SERVER_ID};

const UPTIME_COMMAND: &str = "!uptime";

/// Everything the home page yields, extracted from a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleSummary {
    pub map_name: Option<String>,
    pub game_mode: String,
    pub version: String,
    pub logged_in_as: String,
    pub chat: Vec<ChatLine>,
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLookup {
    #[serde(default)]
    pub clients: Vec<FoundClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundClient {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub xuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

pub struct Console<G> {
    gateway: G,
    server_id: String,
    control: FetchControl,
}

impl Console<ConsoleClient> {
    /// Build a console over the HTTP gateway described by `settings`.
    pub fn connect(settings: ConsoleSettings) -> Result<Self> {
        let server_id = settings.server_id.clone();
        Ok(Self::new(ConsoleClient::new(settings)?, server_id))
    }
}

impl<G: SessionGateway> Console<G> {
    pub fn new(gateway: G, server_id: impl Into<String>) -> Self {
        Self {
            gateway,
            server_id: server_id.into(),
            control: FetchControl::default(),
        }
    }

    /// Timeout and cancellation applied to every subsequent fetch.
    pub fn with_control(mut self, control: FetchControl) -> Self {
        self.control = control;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    fn fetch(&self, request: &ConsoleRequest) -> Result<String> {
        self.gateway.fetch(request, &self.control)
    }

    fn fetch_document(&self, request: &ConsoleRequest) -> Result<Document> {
        Document::parse(&self.fetch(request)?)
    }

    /// Fetch a body that must not be blank.
    fn fetch_nonempty(&self, request: &ConsoleRequest) -> Result<String> {
        let body = self.fetch(request)?;
        if body.trim().is_empty() {
            return Err(ConsoleError::EmptyResponse {
                path: request.path.clone(),
            });
        }
        Ok(body)
    }

    // Pass-through calls.

    /// Run a console command on the configured server and return the raw
    /// response. Never retried.
    pub fn send_command(&self, command: &str) -> Result<String> {
        let server_id = self.server_id.trim();
        if server_id.is_empty() {
            return Err(ConsoleError::Config(
                "a server id is required to execute commands".to_string(),
            ));
        }
        self.fetch(&request::execute_command(server_id, command))
    }

    pub fn server_uptime(&self) -> Result<String> {
        self.send_command(UPTIME_COMMAND)
    }

    pub fn login_token(&self) -> Result<String> {
        self.fetch(&request::login_token())
    }

    pub fn status(&self) -> Result<String> {
        self.fetch(&request::api_status())
    }

    pub fn info(&self) -> Result<String> {
        self.fetch(&request::api_info())
    }

    // Home page.

    pub fn map_name(&self) -> Result<String> {
        let document = self.fetch_document(&request::home_page())?;
        metadata::map_name(&document).ok_or(ConsoleError::MissingContainer("server header map"))
    }

    pub fn game_mode(&self) -> Result<String> {
        let document = self.fetch_document(&request::home_page())?;
        Ok(metadata::game_mode(&document))
    }

    pub fn version(&self) -> Result<String> {
        let document = self.fetch_document(&request::home_page())?;
        Ok(metadata::version(&document))
    }

    pub fn logged_in_as(&self) -> Result<String> {
        let document = self.fetch_document(&request::home_page())?;
        Ok(metadata::logged_in_as(&document))
    }

    pub fn read_chat(&self) -> Result<Vec<ChatLine>> {
        let document = self.fetch_document(&request::home_page())?;
        Ok(chat::chat_lines(&document))
    }

    pub fn players(&self) -> Result<Vec<RosterEntry>> {
        let document = self.fetch_document(&request::home_page())?;
        Ok(roster::roster(&document))
    }

    /// Map, mode, version, identity, chat and roster from one fetch of the
    /// home page.
    pub fn summary(&self) -> Result<ConsoleSummary> {
        let document = self.fetch_document(&request::home_page())?;
        let summary = ConsoleSummary {
            map_name: metadata::map_name(&document),
            game_mode: metadata::game_mode(&document),
            version: metadata::version(&document),
            logged_in_as: metadata::logged_in_as(&document),
            chat: chat::chat_lines(&document),
            roster: roster::roster(&document),
        };
        debug!(
            chat = summary.chat.len(),
            roster = summary.roster.len(),
            "extracted console summary"
        );
        Ok(summary)
    }

    // Other server pages.

    pub fn help(&self) -> Result<CommandCatalog> {
        let document = self.fetch_document(&request::help_page())?;
        Ok(help::command_catalog(&document))
    }

    pub fn rules(&self) -> Result<Vec<String>> {
        let document = self.fetch_document(&request::about_page())?;
        Ok(rules::rules(&document))
    }

    pub fn reports(&self) -> Result<Vec<Report>> {
        let document = self.fetch_document(&request::recent_reports())?;
        Ok(reports::reports(&document))
    }

    pub fn server_ids(&self) -> Result<Vec<ServerIdentity>> {
        let document = self.fetch_document(&request::console_page())?;
        Ok(metadata::server_ids(&document))
    }

    pub fn admin_roles(&self) -> Result<Vec<String>> {
        let document = self.fetch_document(&request::role_form())?;
        Ok(metadata::admin_roles(&document))
    }

    pub fn roles(&self) -> Result<Vec<String>> {
        let document = self.fetch_document(&request::role_form())?;
        Ok(metadata::roles(&document))
    }

    pub fn recent_clients(&self, offset: u32) -> Result<Vec<RecentClient>> {
        let document = self.fetch_document(&request::recent_clients(offset))?;
        Ok(clients::recent_clients(&document))
    }

    pub fn recent_audit_log(&self) -> Result<Option<AuditLogEntry>> {
        let document = self.fetch_document(&request::audit_log())?;
        Ok(audit::latest_audit_entry(&document))
    }

    pub fn audit_logs(&self, count: usize) -> Result<Vec<AuditLogEntry>> {
        let document = self.fetch_document(&request::audit_log())?;
        Ok(audit::audit_log(&document, count))
    }

    /// `role` filters by table header (blank for all); `count` of zero
    /// means unlimited.
    pub fn admins(&self, role: &str, count: usize) -> Result<Vec<AdminEntry>> {
        let document = self.fetch_document(&request::privileged_clients())?;
        Ok(admins::admins(&document, role, count))
    }

    pub fn top_players(&self, offset: u32, count: u32) -> Result<Vec<LeaderboardEntry>> {
        let document = self.fetch_document(&request::top_players(
            offset,
            count,
            GLOBAL_LEADERBOARD_SERVER_ID,
        ))?;
        Ok(leaderboard::top_players(&document))
    }

    /// Player search. A blank name returns an empty lookup without
    /// contacting the console.
    pub fn find_player(&self, query: &FindPlayerQuery) -> Result<ClientLookup> {
        let Some(request) = request::find_player(query) else {
            return Ok(ClientLookup::default());
        };
        let body = self.fetch_nonempty(&request)?;
        Ok(serde_json::from_str(&body)?)
    }

    // Player operations.

    pub fn player_stats(&self, client_id: &str) -> Result<String> {
        self.fetch_nonempty(&request::player_stats(client_id))
    }

    pub fn advanced_stats(&self, client_id: &str) -> Result<AdvancedStats> {
        let body = self.fetch_nonempty(&request::advanced_stats(client_id))?;
        let document = Document::parse(&body)?;
        Ok(advanced_stats::advanced_stats(
            &document,
            self.gateway.base_url(),
        ))
    }

    pub fn client_info(&self, client_id: &str) -> Result<Map<String, Value>> {
        let body = self.fetch_nonempty(&request::client_info(client_id))?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn xuid_from_name(&self, name: &str) -> Result<String> {
        self.find_player(&FindPlayerQuery::by_name(name))?
            .clients
            .into_iter()
            .next()
            .and_then(|client| client.xuid)
            .ok_or_else(|| ConsoleError::NotFound(format!("player {name:?}")))
    }

    pub fn name_from_client_id(&self, client_id: &str) -> Result<String> {
        self.client_info(client_id)?
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ConsoleError::NotFound(format!("name for client {client_id}")))
    }
}
