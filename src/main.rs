use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use pdcache::config::{Config, PagerDutyConfig};
use pdcache::pagerduty::{ResultMap, ESCALATION_POLICIES, USERS};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pdcache")]
#[command(about = "Fetch and cache PagerDuty users and escalation policies")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pdcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// PagerDuty subdomain, overrides the config file
  #[arg(short, long)]
  domain: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print all users as a JSON object keyed by id
  Users,
  /// Print on-call escalation policies as a JSON object keyed by id
  Policies,
  /// Keep both collections refreshed and log their sizes until Ctrl-C
  Watch {
    /// Refresh interval in seconds, overrides the config file
    #[arg(short, long)]
    interval: Option<u64>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;

  // Override domain if specified on command line
  let config = if let Some(domain) = args.domain {
    Config {
      pagerduty: PagerDutyConfig {
        domain,
        endpoint: None,
        ..config.pagerduty
      },
      ..config
    }
  } else {
    config
  };

  let _log_guard = pdcache::logging::init(&config.logging)?;

  let token = Config::get_api_token()?;
  let client = config.client(&token)?;

  match args.command {
    Command::Users => print_map(&client.users().await?)?,
    Command::Policies => print_map(&client.escalation_policies().await?)?,
    Command::Watch { interval } => {
      let interval = match interval {
        Some(0) => return Err(eyre!("--interval must be at least 1")),
        Some(secs) => std::time::Duration::from_secs(secs),
        None => config.refresh.interval(),
      };

      let cache = client.refresh_cache();
      let handle = cache.start(interval)?;
      let mut users = cache
        .subscribe(USERS)
        .ok_or_else(|| eyre!("users collection not configured"))?;
      let mut policies = cache
        .subscribe(ESCALATION_POLICIES)
        .ok_or_else(|| eyre!("escalation policy collection not configured"))?;

      loop {
        tokio::select! {
          _ = tokio::signal::ctrl_c() => break,
          Ok(()) = users.changed() => {
            info!(count = users.borrow_and_update().data.len(), "users refreshed");
          }
          Ok(()) = policies.changed() => {
            info!(count = policies.borrow_and_update().data.len(), "escalation policies refreshed");
          }
        }
      }

      info!("stopping refresh cycles");
      handle.stop().await;
    }
  }

  Ok(())
}

fn print_map(map: &ResultMap) -> Result<()> {
  let json =
    serde_json::to_string_pretty(map).map_err(|e| eyre!("Failed to serialize result: {}", e))?;
  println!("{}", json);
  Ok(())
}
