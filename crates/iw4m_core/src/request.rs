//! Path builders for every console endpoint.
//!
//! Builders are pure: they never touch the network and never see the base
//! URL. The gateway joins the returned relative path with its base URL.

use url::form_urlencoded;

/// Number of recent clients the console returns per page.
pub const RECENT_CLIENTS_PAGE_SIZE: u32 = 20;

/// Server id the console uses for its global leaderboard.
pub const GLOBAL_LEADERBOARD_SERVER_ID: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleRequest {
    pub path: String,
    /// Whether the gateway may transparently retry this request.
    pub retry_safe: bool,
}

impl ConsoleRequest {
    fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            retry_safe: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindPlayerQuery {
    pub name: String,
    pub client_id: String,
    pub xuid: String,
    pub count: Option<i64>,
    pub offset: Option<i64>,
    pub direction: Option<i64>,
}

impl FindPlayerQuery {
    pub fn by_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Form-encode a single query value (`!` becomes `%21`, space becomes `+`).
pub fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn encode_query(pairs: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Unset numeric parameters go out as `0`, matching the console's defaults.
fn number(value: Option<i64>) -> String {
    value.unwrap_or(0).to_string()
}

/// Console command execution. Never retry-safe: the console does not
/// guarantee commands are idempotent.
pub fn execute_command(server_id: &str, command: &str) -> ConsoleRequest {
    ConsoleRequest {
        path: format!(
            "/Console/Execute?serverId={}&command={}",
            encode_query_value(server_id),
            encode_query_value(command)
        ),
        retry_safe: false,
    }
}

pub fn login_token() -> ConsoleRequest {
    ConsoleRequest::get("/Action/GenerateLoginTokenAsync/")
}

pub fn api_status() -> ConsoleRequest {
    ConsoleRequest::get("/api/status")
}

pub fn api_info() -> ConsoleRequest {
    ConsoleRequest::get("/api/info")
}

pub fn help_page() -> ConsoleRequest {
    ConsoleRequest::get("/Home/Help")
}

/// Root page, source of map, mode, version, identity, chat and roster.
pub fn home_page() -> ConsoleRequest {
    ConsoleRequest::get("/")
}

pub fn about_page() -> ConsoleRequest {
    ConsoleRequest::get("/About")
}

pub fn recent_reports() -> ConsoleRequest {
    ConsoleRequest::get("/Action/RecentReportsForm/")
}

pub fn console_page() -> ConsoleRequest {
    ConsoleRequest::get("/Console")
}

/// Player search. Returns `None` when the name is blank; callers treat that
/// as an empty result without issuing a request.
pub fn find_player(query: &FindPlayerQuery) -> Option<ConsoleRequest> {
    if query.name.trim().is_empty() {
        return None;
    }
    let mut pairs = vec![
        ("name", query.name.clone()),
        ("xuid", query.xuid.clone()),
        ("count", number(query.count)),
        ("offset", number(query.offset)),
        ("direction", number(query.direction)),
    ];
    if !query.client_id.trim().is_empty() {
        pairs.push(("clientId", query.client_id.clone()));
    }
    Some(ConsoleRequest::get(format!(
        "/api/client/find?{}",
        encode_query(&pairs)
    )))
}

/// Edit form whose level selector lists every permission role.
pub fn role_form() -> ConsoleRequest {
    ConsoleRequest::get("/Action/editForm/?id=2&meta=\"\"")
}

pub fn recent_clients(offset: u32) -> ConsoleRequest {
    ConsoleRequest::get(format!(
        "/Action/RecentClientsForm?offset={offset}&count={RECENT_CLIENTS_PAGE_SIZE}"
    ))
}

pub fn audit_log() -> ConsoleRequest {
    ConsoleRequest::get("/Admin/AuditLog")
}

pub fn privileged_clients() -> ConsoleRequest {
    ConsoleRequest::get("/Client/Privileged")
}

pub fn top_players(offset: u32, count: u32, server_id: &str) -> ConsoleRequest {
    ConsoleRequest::get(format!(
        "/Stats/GetTopPlayersAsync?offset={offset}&count={count}&serverId={}",
        encode_query_value(server_id)
    ))
}

pub fn player_stats(client_id: &str) -> ConsoleRequest {
    ConsoleRequest::get(format!("/api/stats/{}", encode_path_segment(client_id)))
}

pub fn advanced_stats(client_id: &str) -> ConsoleRequest {
    ConsoleRequest::get(format!(
        "/clientstatistics/{}/advanced",
        encode_path_segment(client_id)
    ))
}

pub fn client_info(client_id: &str) -> ConsoleRequest {
    ConsoleRequest::get(format!("/api/client/{}", encode_path_segment(client_id)))
}

fn encode_path_segment(value: &str) -> String {
    encode_query_value(value.trim()).replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_command_percent_encodes_text() {
        let request = execute_command("12345", "!uptime");
        assert_eq!(
            request.path,
            "/Console/Execute?serverId=12345&command=%21uptime"
        );
        assert!(!request.retry_safe);

        let request = execute_command("1", "!say \"hello world\"");
        assert_eq!(
            request.path,
            "/Console/Execute?serverId=1&command=%21say+%22hello+world%22"
        );
    }

    #[test]
    fn fixed_paths_match_console_routes() {
        assert_eq!(login_token().path, "/Action/GenerateLoginTokenAsync/");
        assert_eq!(api_status().path, "/api/status");
        assert_eq!(api_info().path, "/api/info");
        assert_eq!(help_page().path, "/Home/Help");
        assert_eq!(home_page().path, "/");
        assert_eq!(about_page().path, "/About");
        assert_eq!(recent_reports().path, "/Action/RecentReportsForm/");
        assert_eq!(console_page().path, "/Console");
        assert_eq!(role_form().path, "/Action/editForm/?id=2&meta=\"\"");
        assert_eq!(audit_log().path, "/Admin/AuditLog");
        assert_eq!(privileged_clients().path, "/Client/Privileged");
        assert!(home_page().retry_safe);
    }

    #[test]
    fn paged_paths_serialize_integers() {
        assert_eq!(
            recent_clients(40).path,
            "/Action/RecentClientsForm?offset=40&count=20"
        );
        assert_eq!(
            top_players(0, 10, GLOBAL_LEADERBOARD_SERVER_ID).path,
            "/Stats/GetTopPlayersAsync?offset=0&count=10&serverId=0"
        );
    }

    #[test]
    fn client_paths_embed_identifier() {
        assert_eq!(player_stats("42").path, "/api/stats/42");
        assert_eq!(advanced_stats("42").path, "/clientstatistics/42/advanced");
        assert_eq!(client_info(" 42 ").path, "/api/client/42");
    }

    #[test]
    fn find_player_skips_blank_name() {
        assert_eq!(find_player(&FindPlayerQuery::default()), None);
        assert_eq!(find_player(&FindPlayerQuery::by_name("   ")), None);
    }

    #[test]
    fn find_player_defaults_unset_numbers_to_zero() {
        let request = find_player(&FindPlayerQuery::by_name("John Doe")).expect("request");
        assert_eq!(
            request.path,
            "/api/client/find?name=John+Doe&xuid=&count=0&offset=0&direction=0"
        );

        let request = find_player(&FindPlayerQuery {
            name: "a&b".to_string(),
            client_id: "7".to_string(),
            xuid: "110000100000001".to_string(),
            count: Some(5),
            offset: Some(10),
            direction: Some(-1),
        })
        .expect("request");
        assert_eq!(
            request.path,
            "/api/client/find?name=a%26b&xuid=110000100000001&count=5&offset=10&direction=-1&clientId=7"
        );
    }
}
