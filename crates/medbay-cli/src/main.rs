//! `medbay`: command-line client for the medbay injury register.
//!
//! # Usage
//!
//! ```text
//! medbay --url http://localhost:8080 --user medico --password secret players --squad A
//! medbay --config ~/.config/medbay/config.toml register --file lesion.json
//! ```

mod client;
mod search;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ReportFilter};
use medbay_core::{
  injury::{InjuryRecord, InjuryStatus},
  report::{Dimension, Period},
  roster::{Player, Position},
  store::InjuryQuery,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "medbay", about = "Command-line client for the medbay injury register")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the medbay server (default: http://localhost:8080).
  #[arg(long, env = "MEDBAY_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "MEDBAY_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "MEDBAY_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
  /// Squad code.
  #[arg(long)]
  squad:       Option<String>,
  /// Position code (POR, DEF, MC, DEL).
  #[arg(long)]
  position:    Option<Position>,
  #[arg(long = "type")]
  injury_type: Option<String>,
  /// First injury date included (YYYY-MM-DD).
  #[arg(long)]
  from:        Option<NaiveDate>,
  /// Last injury date included (YYYY-MM-DD).
  #[arg(long)]
  to:          Option<NaiveDate>,
}

impl From<FilterArgs> for ReportFilter {
  fn from(a: FilterArgs) -> Self {
    Self {
      squad:       a.squad,
      position:    a.position,
      injury_type: a.injury_type,
      from:        a.from,
      to:          a.to,
    }
  }
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List players.
  Players {
    #[arg(long)]
    squad:    Option<String>,
    #[arg(long)]
    position: Option<Position>,
  },
  /// Fuzzy-find a player by name or id and show their injury history.
  Find { query: String },
  /// List injuries.
  Injuries {
    #[arg(long)]
    player: Option<String>,
    #[arg(long)]
    status: Option<InjuryStatus>,
    #[arg(long)]
    limit:  Option<usize>,
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// Print one injury record as JSON.
  Show { id: String },
  /// Register an injury from a JSON form file (must include `id_jugadora`).
  Register {
    #[arg(short, long)]
    file: PathBuf,
  },
  /// Apply a follow-up JSON form file to an injury.
  FollowUp {
    id:   String,
    #[arg(short, long)]
    file: PathBuf,
  },
  /// Headline metrics.
  Summary {
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// Period-over-period series.
  Trends {
    #[arg(long, default_value = "week")]
    period: Period,
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// Counts by one dimension (zone, injury_type, mechanism, place, severity,
  /// treatment, recurrence).
  Distribution {
    dimension: Dimension,
    #[command(flatten)]
    filter:    FilterArgs,
  },
  /// Write every record as JSON lines to a file or stdout.
  Export {
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Import a JSON-lines file.
  Import { file: PathBuf },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args.user.or_else(|| non_empty(&file_cfg.username)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(&file_cfg.password)).unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

fn read_json(path: &Path) -> Result<Value> {
  let raw =
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Players { squad, position } => {
      let players = client.list_players(squad, position).await?;
      for p in &players {
        print_player(p);
      }
    }
    Command::Find { query } => {
      let players = client.list_players(None, None).await?;
      let hits = search::rank(&players, &query);
      let Some(best) = hits.first() else {
        println!("no player matches {query:?}");
        return Ok(());
      };
      for p in &hits {
        print_player(p);
      }
      println!();
      println!("Injuries of {}:", best.full_name());
      for r in client.player_injuries(&best.player_id).await? {
        print_injury(&r);
      }
    }
    Command::Injuries { player, status, limit, filter } => {
      let query = InjuryQuery {
        player_id: player,
        squad: filter.squad,
        position: filter.position,
        injury_type: filter.injury_type,
        status,
        from: filter.from,
        to: filter.to,
        limit,
        offset: None,
      };
      for r in client.list_injuries(&query).await? {
        print_injury(&r);
      }
    }
    Command::Show { id } => {
      let record = client.get_injury(&id).await?;
      println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Command::Register { file } => {
      let record = client.register(&read_json(&file)?).await?;
      println!("registered {}", record.injury_id);
      print_injury(&record);
    }
    Command::FollowUp { id, file } => {
      let record = client.follow_up(&id, &read_json(&file)?).await?;
      println!("updated {} ({} sessions)", record.injury_id, record.session_count());
      print_injury(&record);
    }
    Command::Summary { filter } => {
      let s = client.summary(&filter.into()).await?;
      println!("Total injuries:     {}", s.total);
      println!("Active:             {} ({:.1}%)", s.active_count, s.active_share);
      match s.average_days_out {
        Some(avg) => println!("Average days out:   {avg:.1}"),
        None => println!("Average days out:   -"),
      }
      match s.top_zone {
        Some(z) => println!("Most affected zone: {} ({}, {:.1}%)", z.zone, z.count, z.share),
        None => println!("Most affected zone: -"),
      }
      println!("Recurrences:        {} ({:.1}%)", s.recurrence_count, s.recurrence_share);
    }
    Command::Trends { period, filter } => {
      let t = client.trends(&filter.into(), period).await?;
      println!("{:<12} {:>6} {:>6} {:>8} {:>6}", "period", "total", "active", "avg days", "zone");
      for p in &t.points {
        println!(
          "{:<12} {:>6} {:>6} {:>8.1} {:>6}",
          p.period, p.total, p.active, p.average_days_out, p.top_zone_count
        );
      }
      println!(
        "Δ% total {:+.1}  active {:+.1}  avg days {:+.1}  {} {:+.1}",
        t.deltas.total,
        t.deltas.active,
        t.deltas.average_days_out,
        t.top_zone.as_deref().unwrap_or("zone"),
        t.deltas.top_zone_count
      );
    }
    Command::Distribution { dimension, filter } => {
      for b in client.distribution(&filter.into(), dimension).await? {
        println!("{:<28} {:>5} {:>6.1}%", b.label, b.count, b.share);
      }
    }
    Command::Export { out } => {
      let doc = client.export().await?;
      match out {
        Some(path) => {
          std::fs::write(&path, &doc).with_context(|| format!("writing {}", path.display()))?;
          tracing::info!(lines = doc.lines().count(), path = %path.display(), "export written");
        }
        None => print!("{doc}"),
      }
    }
    Command::Import { file } => {
      let body =
        std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
      let report = client.import(body).await?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
  }
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_player(p: &Player) {
  println!(
    "{:<10} {:<28} {:<10} {}",
    p.player_id,
    p.full_name(),
    p.position.map(Position::label).unwrap_or("-"),
    p.squad.as_deref().unwrap_or("-"),
  );
}

fn print_injury(r: &InjuryRecord) {
  let days = r
    .effective_days_out()
    .map_or_else(|| "-".to_string(), |d| d.to_string());
  println!(
    "{:<16} {:<10} {} {:<10} {:<14} {:<14} {:>4}d {:<10} {}s",
    r.injury_id,
    r.player_id,
    r.injury_date,
    r.status,
    r.classification.body_zone.name,
    r.classification.injury_type.name,
    days,
    r.severity.as_deref().unwrap_or("-"),
    r.session_count(),
  );
}
