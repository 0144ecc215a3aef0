//! `courtside`: sign in to a Courtside server and manage the active team
//! from the terminal.
//!
//! # Usage
//!
//! ```
//! courtside login alice
//! courtside teams
//! courtside switch T2
//! courtside navigate /dashboard
//! ```
//!
//! The session persists in a SQLite file between invocations.

mod settings;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use courtside_core::{
  backend::{NewTeam, Registration},
  guard::Navigation,
  storage::StorageKey,
};
use courtside_http::HttpBackend;
use courtside_session::{RefreshOutcome, SessionService};
use courtside_store_sqlite::SqliteStorage;
use settings::ClientConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type Service = SessionService<HttpBackend, SqliteStorage>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "courtside", version, about = "Courtside session and team context")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "courtside.toml")]
  config: PathBuf,

  /// Server root (overrides the config file).
  #[arg(long, env = "COURTSIDE_API_URL")]
  api_url: Option<String>,

  /// Session database (overrides the config file).
  #[arg(long, value_name = "FILE", env = "COURTSIDE_STATE_PATH")]
  state_path: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and load your teams.
  Login {
    username: String,
    /// Read from stdin when omitted.
    #[arg(long, env = "COURTSIDE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// Create an account.
  Register {
    username:  String,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long, env = "COURTSIDE_PASSWORD", hide_env_values = true)]
    password:  Option<String>,
  },
  /// Forget the stored session.
  Logout,
  /// Show who is signed in and the active team.
  Whoami {
    /// Print the session snapshot as JSON.
    #[arg(long)]
    json: bool,
  },
  /// Refresh and list your teams.
  Teams,
  /// Make another team active.
  Switch { team_id: String },
  /// Create a team and make it active.
  CreateTeam {
    name:        String,
    #[arg(long)]
    sport:       Option<String>,
    #[arg(long)]
    description: Option<String>,
  },
  /// Print what the console would do when opening `path`.
  Navigate { path: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // CLI flags override config file, which overrides defaults.
  let mut cfg = ClientConfig::load(&cli.config)?;
  if let Some(url) = cli.api_url {
    cfg.api_url = url;
  }
  if let Some(path) = cli.state_path {
    cfg.state_path = path;
  }

  let state_path = cfg.state_path();
  if let Some(dir) = state_path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {}", dir.display()))?;
  }
  let storage = SqliteStorage::open(&state_path)
    .await
    .with_context(|| format!("failed to open session store at {state_path:?}"))?;

  let backend = HttpBackend::new(cfg.api()).context("failed to build HTTP client")?;
  let session = SessionService::init(backend, storage.clone())
    .await
    .context("failed to restore session")?;

  let result = run(cli.command, &session, &storage).await;
  session.teardown();
  result
}

async fn run(command: Command, session: &Service, storage: &SqliteStorage) -> Result<()> {
  match command {
    Command::Login { username, password } => {
      let password = password_or_stdin(password)?;
      session.login(&username, &password).await?;
      print_active(session);
    }

    Command::Register {
      username,
      full_name,
      password,
    } => {
      let registration = Registration {
        username,
        password: password_or_stdin(password)?,
        full_name,
      };
      if session.register(&registration).await? {
        println!("Registered and signed in as {}", registration.username);
        print_active(session);
      } else {
        println!("Registered {}; sign in with `courtside login`", registration.username);
      }
    }

    Command::Logout => {
      session.logout().await?;
      println!("Signed out");
    }

    Command::Whoami { json } => {
      if json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        return Ok(());
      }
      let Some(identity) = session.identity() else {
        println!("Not signed in");
        return Ok(());
      };
      println!("user:   {}", identity.username);
      println!("state:  {}", session.guard_state());
      print_active(session);
      if let Some(at) = storage.updated_at(StorageKey::Token).await? {
        println!("since:  {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
      }
    }

    Command::Teams => {
      match session.refresh_teams().await {
        RefreshOutcome::Skipped => anyhow::bail!("not signed in"),
        RefreshOutcome::SignedOut => anyhow::bail!("session expired; sign in again"),
        RefreshOutcome::Failed => eprintln!("warning: could not refresh teams; showing cached list"),
        RefreshOutcome::Applied | RefreshOutcome::Stale => {}
      }
      let active = session.active_team().map(|t| t.id);
      let teams  = session.teams();
      if teams.teams().is_empty() {
        println!("No teams yet; create one with `courtside create-team`");
      }
      for team in teams.teams() {
        let marker = if active.as_deref() == Some(team.id.as_str()) { '*' } else { ' ' };
        match &team.sport_type {
          Some(sport) => println!("{marker} {:<12} {} ({sport})", team.id, team.name),
          None => println!("{marker} {:<12} {}", team.id, team.name),
        }
      }
    }

    Command::Switch { team_id } => {
      session.switch_team(&team_id).await?;
      print_active(session);
    }

    Command::CreateTeam {
      name,
      sport,
      description,
    } => {
      let team = NewTeam {
        team_name: name,
        sport_type: sport,
        description,
      };
      session.create_team(&team).await?;
      print_active(session);
    }

    Command::Navigate { path } => match session.navigate(&path) {
      Navigation::Render => println!("render"),
      Navigation::Redirect(to) => println!("redirect {to}"),
    },
  }
  Ok(())
}

fn print_active(session: &Service) {
  match session.active_team() {
    Some(team) => println!("team:   {} ({})", team.name, team.id),
    None => println!("team:   none"),
  }
}

/// Use `password` if given, otherwise read a line from stdin.
fn password_or_stdin(password: Option<String>) -> Result<String> {
  if let Some(password) = password {
    return Ok(password);
  }
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
