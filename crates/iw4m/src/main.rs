use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use iw4m_core::config::{
    ConsoleConfig, ConsoleConfigPatch, DEFAULT_CONFIG_PATH, ENV_SERVER_ID, ENV_TIMEOUT_MS,
    ENV_URL, load_config, patch_console_config,
};
use iw4m_core::{Console, ConsoleClient, ConsoleError, FindPlayerQuery};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "IW4M_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "iw4m",
    version,
    about = "Query an IW4MAdmin web console from the command line",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Console base URL")]
    url: Option<String>,
    #[arg(long, global = true, value_name = "ID", help = "Server id used for commands")]
    server_id: Option<String>,
    #[arg(long, global = true, value_name = "MS", help = "Per-request timeout")]
    timeout_ms: Option<u64>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Raise log verbosity")]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Raw /api/status response")]
    Status,
    #[command(about = "Raw /api/info response")]
    Info,
    #[command(about = "Run !uptime on the configured server")]
    Uptime,
    #[command(name = "login-token")]
    LoginToken,
    #[command(about = "Command documentation grouped by category")]
    Help,
    Map,
    Mode,
    Version,
    #[command(about = "Identity of the session cookie's account")]
    Whoami,
    #[command(about = "Map, mode, version, identity, chat and roster in one request")]
    Summary,
    Rules,
    Reports,
    Servers,
    #[command(about = "Execute a console command")]
    Exec(ExecArgs),
    Chat,
    Find(FindArgs),
    Players,
    Roles(RolesArgs),
    #[command(name = "recent-clients")]
    RecentClients(RecentClientsArgs),
    #[command(name = "audit-log")]
    AuditLog(AuditLogArgs),
    Admins(AdminsArgs),
    Top(TopArgs),
    Stats(ClientArgs),
    #[command(name = "advanced-stats")]
    AdvancedStats(ClientArgs),
    Client(ClientArgs),
    Xuid(XuidArgs),
    Name(ClientArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ExecArgs {
    command: String,
}

#[derive(Debug, Args)]
struct FindArgs {
    name: String,
    #[arg(long, default_value = "")]
    client_id: String,
    #[arg(long, default_value = "")]
    xuid: String,
    #[arg(long)]
    count: Option<i64>,
    #[arg(long)]
    offset: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    direction: Option<i64>,
}

#[derive(Debug, Args)]
struct RolesArgs {
    #[arg(long, help = "List raw permission level values instead of display names")]
    levels: bool,
}

#[derive(Debug, Args)]
struct RecentClientsArgs {
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Debug, Args)]
struct AuditLogArgs {
    #[arg(long, default_value_t = 10)]
    count: usize,
    #[arg(long, help = "Only the most recent entry")]
    latest: bool,
}

#[derive(Debug, Args)]
struct AdminsArgs {
    #[arg(long, default_value = "", help = "Role table to read (default: all)")]
    role: String,
    #[arg(long, default_value_t = 0, help = "Maximum entries, 0 for no limit")]
    count: usize,
}

#[derive(Debug, Args)]
struct TopArgs {
    #[arg(long, default_value_t = 0)]
    offset: u32,
    #[arg(long, default_value_t = 10)]
    count: u32,
}

#[derive(Debug, Args)]
struct ClientArgs {
    client_id: String,
}

#[derive(Debug, Args)]
struct XuidArgs {
    name: String,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    #[command(about = "Print the config file contents (cookie redacted)")]
    Show,
    #[command(about = "Update [console] keys in the config file")]
    Set {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        server_id: Option<String>,
        #[arg(long)]
        cookie: Option<String>,
    },
}

struct ConnectionFlags {
    url: Option<String>,
    server_id: Option<String>,
    timeout_ms: Option<u64>,
}

fn main() -> Result<()> {
    let Cli {
        config,
        url,
        server_id,
        timeout_ms,
        verbose,
        command,
    } = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(verbose);

    let Some(command) = command else {
        let mut command = Cli::command();
        command.print_help()?;
        println!();
        return Ok(());
    };
    let config_path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let command = match command {
        Commands::Config(ConfigArgs { command }) => return run_config(&config_path, command),
        other => other,
    };

    let flags = ConnectionFlags {
        url,
        server_id,
        timeout_ms,
    };
    let console = connect(&flags, &config_path)?;
    run_command(&console, command)
        .map_err(|error| annotate_transport_error(error, &console.gateway().settings().base_url))
}

/// Name the console in transport failures so a wrong `--url` is obvious.
fn annotate_transport_error(error: anyhow::Error, base_url: &str) -> anyhow::Error {
    let transport_failure = error
        .downcast_ref::<ConsoleError>()
        .is_some_and(ConsoleError::is_transport);
    if transport_failure {
        error.context(format!("console at {base_url} could not serve the request"))
    } else {
        error
    }
}

fn run_command(console: &Console<ConsoleClient>, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_body(console.status()?),
        Commands::Info => print_body(console.info()?),
        Commands::Uptime => print_body(console.server_uptime()?),
        Commands::LoginToken => print_body(console.login_token()?),
        Commands::Help => print_json(&console.help()?),
        Commands::Map => print_json(&console.map_name()?),
        Commands::Mode => print_json(&console.game_mode()?),
        Commands::Version => print_json(&console.version()?),
        Commands::Whoami => print_json(&console.logged_in_as()?),
        Commands::Summary => print_json(&console.summary()?),
        Commands::Rules => print_json(&console.rules()?),
        Commands::Reports => print_json(&console.reports()?),
        Commands::Servers => print_json(&console.server_ids()?),
        Commands::Exec(ExecArgs { command }) => print_body(
            console
                .send_command(&command)
                .with_context(|| format!("failed to execute {command:?}"))?,
        ),
        Commands::Chat => print_json(&console.read_chat()?),
        Commands::Find(args) => print_json(&console.find_player(&FindPlayerQuery {
            name: args.name,
            client_id: args.client_id,
            xuid: args.xuid,
            count: args.count,
            offset: args.offset,
            direction: args.direction,
        })?),
        Commands::Players => print_json(&console.players()?),
        Commands::Roles(RolesArgs { levels }) => {
            if levels {
                print_json(&console.admin_roles()?)
            } else {
                print_json(&console.roles()?)
            }
        }
        Commands::RecentClients(RecentClientsArgs { offset }) => {
            print_json(&console.recent_clients(offset)?)
        }
        Commands::AuditLog(AuditLogArgs { count, latest }) => {
            if latest {
                print_json(&console.recent_audit_log()?)
            } else {
                print_json(&console.audit_logs(count)?)
            }
        }
        Commands::Admins(AdminsArgs { role, count }) => print_json(&console.admins(&role, count)?),
        Commands::Top(TopArgs { offset, count }) => print_json(&console.top_players(offset, count)?),
        Commands::Stats(ClientArgs { client_id }) => print_body(console.player_stats(&client_id)?),
        Commands::AdvancedStats(ClientArgs { client_id }) => {
            print_json(&console.advanced_stats(&client_id)?)
        }
        Commands::Client(ClientArgs { client_id }) => print_json(&console.client_info(&client_id)?),
        Commands::Xuid(XuidArgs { name }) => print_json(&console.xuid_from_name(&name)?),
        Commands::Name(ClientArgs { client_id }) => {
            print_json(&console.name_from_client_id(&client_id)?)
        }
        Commands::Config(_) => unreachable!(),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve connection settings with precedence flag > env > config file > default.
fn connect(flags: &ConnectionFlags, config_path: &Path) -> Result<Console<ConsoleClient>> {
    let config = load_config(config_path)?;
    let timeout_ms = flags.timeout_ms.map(|value| value.to_string());
    let settings = config.resolve_with(|key| {
        let flag = match key {
            ENV_URL => flags.url.clone(),
            ENV_SERVER_ID => flags.server_id.clone(),
            ENV_TIMEOUT_MS => timeout_ms.clone(),
            _ => None,
        };
        flag.or_else(|| env::var(key).ok())
    })?;
    debug!(
        base_url = %settings.base_url,
        server_id = %settings.server_id,
        has_cookie = settings.cookie.is_some(),
        "resolved console settings"
    );
    Console::connect(settings).context("failed to build console HTTP client")
}

fn run_config(config_path: &Path, command: ConfigSubcommand) -> Result<()> {
    match command {
        ConfigSubcommand::Show => {
            let mut config: ConsoleConfig = load_config(config_path)?;
            if config.console.cookie.is_some() {
                config.console.cookie = Some("<redacted>".to_string());
            }
            println!("config_path: {}", normalize_path(config_path));
            print_json(&config)
        }
        ConfigSubcommand::Set {
            url,
            server_id,
            cookie,
        } => {
            let patch = ConsoleConfigPatch {
                set_url: url,
                set_server_id: server_id,
                set_cookie: cookie,
            };
            let wrote = patch_console_config(config_path, &patch)?;
            if wrote {
                println!("updated {}", normalize_path(config_path));
            } else {
                println!("no changes to {}", normalize_path(config_path));
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_body(body: String) -> Result<()> {
    println!("{body}");
    Ok(())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
