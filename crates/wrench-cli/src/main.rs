//! rexwrench — operator CLI for the Rex Radio configuration API.
//!
//! The HMAC key is captured once at startup (flag, environment variable, or
//! an interactive prompt), held only in memory, and never logged.

mod config;

use std::io::{self, BufRead};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use wrench_api::ApiClient;
use wrench_core::genres::{catalog_label, default_catalog, resolve_label, slugify, Genre};
use wrench_core::presenters::{NewPresenter, ScheduleBlock, VOICE_IDS};
use wrench_core::settings::StationSettings;

pub const HMAC_KEY_ENV: &str = "REX_API_HMAC_KEY";

#[derive(Parser)]
#[command(name = "rexwrench", version, about = "Manage Rex Radio station settings and presenters")]
struct Cli {
    /// API base URL; falls back to the config file, REX_API_BASE_URL, then localhost.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// HMAC signing key; prompted for when neither this nor REX_API_HMAC_KEY is set.
    #[arg(long, global = true)]
    hmac_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the default genre catalog with derived ids.
    Catalog,
    /// Load station name, description, and genres from the server.
    Show,
    /// Save station settings with one bulk patch.
    Apply {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Genre ids or labels, comma separated; labels are slugified.
        #[arg(long, value_delimiter = ',')]
        genres: Option<Vec<String>>,
    },
    /// List presenters with their schedule summaries.
    Presenters,
    /// Create a presenter record.
    AddPresenter {
        #[arg(long)]
        name: String,
        /// Schedule block "mon,tue@09:00-12:00"; repeatable.
        #[arg(long = "block")]
        blocks: Vec<String>,
        /// Role codes (news, music, sports, emergency); repeatable.
        #[arg(long = "role")]
        roles: Vec<String>,
        #[arg(long, default_value = VOICE_IDS[0])]
        voice_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Catalog => {
            for genre in default_catalog() {
                println!("{:<16} {}", genre.id, genre.label);
            }
            Ok(())
        }
        command => {
            let api = build_client(&cli)?;
            run(&api, command).await
        }
    }
}

fn build_client(cli: &Cli) -> anyhow::Result<ApiClient> {
    let cfg = config::Config::load().unwrap_or_default();
    let key = resolve_hmac_key(cli.hmac_key.clone())?;
    // Flag wins over the config file; the client itself still falls back to
    // the environment variable and the built-in default.
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| (!cfg.api.base_url.is_empty()).then(|| cfg.api.base_url.clone()));
    let api = ApiClient::with_timeout(
        key,
        base_url.as_deref(),
        Duration::from_secs(cfg.api.timeout_secs),
    )?;
    info!("API base URL: {}", api.base_url());
    Ok(api)
}

fn resolve_hmac_key(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(key) = flag {
        return Ok(key);
    }
    if let Ok(key) = std::env::var(HMAC_KEY_ENV) {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    eprint!("HMAC key (blank sends unsigned requests): ");
    let mut key = String::new();
    io::stdin().lock().read_line(&mut key)?;
    Ok(key.trim().to_string())
}

async fn run(api: &ApiClient, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Catalog => unreachable!("handled before client construction"),
        Command::Show => show_station(api).await,
        Command::Apply { name, description, genres } => {
            apply_station(api, name.clone(), description.clone(), genres.clone()).await
        }
        Command::Presenters => list_presenters(api).await,
        Command::AddPresenter { name, blocks, roles, voice_id } => {
            add_presenter(api, name, blocks, roles, voice_id).await
        }
    }
}

async fn show_station(api: &ApiClient) -> anyhow::Result<()> {
    let settings = api
        .load_station(&StationSettings::default())
        .await
        .context("failed to load one or more fields")?;
    info!("[GET /config/name] ok");
    info!("[GET /config/description] ok");
    info!("[GET /config/genres] {} item(s)", settings.genres.len());

    println!("name:        {}", settings.name);
    println!("description: {}", settings.description);
    println!("genres:");
    for genre in &settings.genres {
        println!("  {:<16} {}", genre.id, genre.label);
    }
    Ok(())
}

async fn apply_station(
    api: &ApiClient,
    name: Option<String>,
    description: Option<String>,
    genres: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let mut settings = api
        .load_station(&StationSettings::default())
        .await
        .context("failed to load current settings before applying")?;

    if let Some(name) = name {
        settings.name = name.trim().to_string();
    }
    if let Some(description) = description {
        settings.description = description.trim().to_string();
    }
    if let Some(entries) = genres {
        let known = settings.known_labels();
        settings.genres = entries
            .iter()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                // Catalog ids pass through; anything else is a label to slugify.
                let id = if catalog_label(entry).is_some() {
                    entry.to_string()
                } else {
                    slugify(entry)
                };
                let label = resolve_label(&id, &known);
                Genre { id, label }
            })
            .filter(|g| !g.id.is_empty())
            .collect();
    }

    info!(
        "[PATCH /config] body: {}",
        json!([
            { "field": "name", "value": &settings.name },
            { "field": "description", "value": &settings.description },
            { "field": "genres", "value": settings.genre_ids() },
        ])
    );
    let outcome = api.save_station(&settings).await;
    if outcome.ok {
        info!("[PATCH /config] {} ok", outcome.status);
        println!("station information saved");
        Ok(())
    } else {
        info!("[PATCH /config] {} fail: {}", outcome.status, snippet(&outcome.body));
        anyhow::bail!(
            "failed to save station information: HTTP {} {}",
            outcome.status,
            snippet(&outcome.body)
        )
    }
}

async fn list_presenters(api: &ApiClient) -> anyhow::Result<()> {
    let presenters = api
        .get_presenters()
        .await
        .context("failed to load presenters")?;
    info!("[GET /presenters] {} item(s)", presenters.len());
    for presenter in &presenters {
        println!("{}", presenter.summary());
    }
    Ok(())
}

async fn add_presenter(
    api: &ApiClient,
    name: &str,
    blocks: &[String],
    roles: &[String],
    voice_id: &str,
) -> anyhow::Result<()> {
    let schedule = blocks
        .iter()
        .map(|raw| parse_block(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let presenter = NewPresenter::new(name, schedule, roles.to_vec(), voice_id);
    presenter.validate()?;

    let outcome = api.create_presenter(&presenter).await;
    if outcome.ok {
        info!("[POST /presenters] {} ok", outcome.status);
        println!("presenter created");
        Ok(())
    } else {
        info!("[POST /presenters] {} fail: {}", outcome.status, snippet(&outcome.body));
        anyhow::bail!(
            "failed to create presenter: HTTP {} {}",
            outcome.status,
            snippet(&outcome.body)
        )
    }
}

/// Parse "mon,tue@09:00-12:00" into a schedule block.
fn parse_block(raw: &str) -> anyhow::Result<ScheduleBlock> {
    let (days_part, times) = raw
        .split_once('@')
        .with_context(|| format!("block '{raw}' must look like mon,tue@09:00-12:00"))?;
    let (start, end) = times
        .split_once('-')
        .with_context(|| format!("block '{raw}' is missing a start-end time range"))?;
    let days = days_part
        .split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    Ok(ScheduleBlock {
        days,
        start: start.trim().to_string(),
        end: end.trim().to_string(),
    })
}

/// Trim long server error bodies before showing them to the operator.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > 500 {
        let cut: String = trimmed.chars().take(500).collect();
        format!("{cut}…")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block() {
        let block = parse_block("mon,tue@09:00-12:00").unwrap();
        assert_eq!(block.days, vec!["mon", "tue"]);
        assert_eq!(block.start, "09:00");
        assert_eq!(block.end, "12:00");
        assert!(block.validate().is_ok());

        assert!(parse_block("mon 09:00-12:00").is_err());
        assert!(parse_block("mon@morning").is_err());
    }

    #[test]
    fn test_snippet_truncation() {
        assert_eq!(snippet("  short  "), "short");
        let long = "x".repeat(600);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), 501);
        assert!(cut.ends_with('…'));
    }
}
