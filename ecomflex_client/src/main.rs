//! Command-line client for Ecomflex sessions.
//!
//! Logs in against the Ecomflex API and keeps the session in a local file so
//! later invocations can refresh it, inspect it, or log it out.

use anyhow::{Context, Result};
use ecomflex_client::commands::{Command, describe_navigation, parse_command};
use ecomflex_session::auth::RefreshStatus;
use ecomflex_session::{
    FileStore, HttpAuthApi, RouteGuard, RouteTable, SessionConfig, SessionManager,
};
use log::{debug, info};
use pico_args::Arguments;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

const HELP: &str = "\
Manage an Ecomflex client session

USAGE:
  ecomflex_client [OPTIONS] <COMMAND>

COMMANDS:
  login EMAIL PASSWORD  Log in and save the session
  logout                End the session locally and on the server
  refresh               Exchange the refresh token for a new access token
  status                Show who is logged in
  profile               Reload the user profile from the server
  check PATH            Show what the route guard does for PATH

OPTIONS:
  --store PATH          Session file  [default: .ecomflex_session.json]
  --server URL          API base URL  [default: from ECOMFLEX_API_BASE_URL]

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  ECOMFLEX_SESSION_FILE         Session file when --store is not given
  ECOMFLEX_API_BASE_URL         API base URL
  ECOMFLEX_REQUEST_TIMEOUT_SECS Request timeout in seconds
  ECOMFLEX_ELEVATED_BYPASS      Enable the development admin login
  RUST_LOG                      Log filter, e.g. ecomflex_session=debug
";

const DEFAULT_STORE: &str = ".ecomflex_session.json";

struct Args {
    store: PathBuf,
    server: Option<String>,
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let store = match pargs.opt_value_from_str::<_, PathBuf>("--store")? {
        Some(path) => path,
        None => std::env::var_os("ECOMFLEX_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE)),
    };
    let server = pargs.opt_value_from_str("--server")?;

    let free: Vec<String> = pargs
        .finish()
        .into_iter()
        .map(OsString::into_string)
        .collect::<std::result::Result<_, _>>()
        .map_err(|arg| anyhow::anyhow!("Argument is not valid UTF-8: {:?}", arg))?;
    let command = parse_command(free.as_slice())?;

    run(Args {
        store,
        server,
        command,
    })
    .await
}

async fn run(args: Args) -> Result<()> {
    let mut config = SessionConfig::from_env().context("Invalid configuration")?;
    if let Some(server) = args.server {
        config = config.with_base_url(server);
        config.validate().context("Invalid --server URL")?;
    }
    debug!("Using API at {}", config.api_base_url);

    let store = FileStore::open(&args.store)
        .with_context(|| format!("Failed to open session file {}", args.store.display()))?;
    let api = HttpAuthApi::from_config(&config).context("Failed to create API client")?;
    let session = SessionManager::restore(Arc::new(api), Arc::new(store), config);

    match args.command {
        Command::Login { email, password } => {
            if let Err(e) = session.login(&email, &password).await {
                anyhow::bail!("Login failed: {}", e.client_message());
            }
            let guard = RouteGuard::new(session.clone(), RouteTable::ecomflex());
            println!(
                "Logged in as {} ({}). Start at {}",
                session.user().map(|u| u.email).unwrap_or(email),
                session.role().map(|r| r.as_str()).unwrap_or("unknown role"),
                guard.post_login_destination(None)
            );
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Refresh => match session.refresh().await {
            Ok(RefreshStatus::Refreshed) => println!("Access token refreshed"),
            Ok(RefreshStatus::Skipped) => println!("Nothing to refresh for this session"),
            Err(e) => anyhow::bail!("Refresh failed: {}", e.client_message()),
        },
        Command::Status => print_status(&session),
        Command::Profile => {
            let profile = session
                .fetch_profile()
                .await
                .map_err(|e| anyhow::anyhow!("Could not load profile: {}", e.client_message()))?;
            println!("Name:  {}", profile.display_name);
            println!("Email: {}", profile.email);
            println!("Phone: {}", profile.phone_number);
            println!("Role:  {}", profile.role);
        }
        Command::Check { path } => {
            let guard = RouteGuard::new(session.clone(), RouteTable::ecomflex());
            println!("{}", describe_navigation(&path, &guard.check(&path)));
        }
    }

    info!("Session file: {}", args.store.display());
    Ok(())
}

fn print_status(session: &SessionManager) {
    let snapshot = session.snapshot();
    if !snapshot.is_authenticated {
        println!("Not logged in");
        return;
    }

    println!("Logged in ({:?} session)", snapshot.mode);
    if let Some(role) = snapshot.role {
        println!("Role:  {}", role);
    }
    if let Some(user) = session.user() {
        println!("User:  {} <{}>", user.display_name, user.email);
    }
}
