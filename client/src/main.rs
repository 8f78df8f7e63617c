//! Command-line front end for the Matsya data client.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use matsya_client::common::events::LiveEvent;
use matsya_client::common::model::analysis::AnalysisRequest;
use matsya_client::common::model::edna::{EdnaMetadata, EdnaStatus};
use matsya_client::common::requests::{EdnaSampleQuery, SpeciesQuery};
use matsya_client::credentials;
use matsya_client::edna::UploadFile;
use matsya_client::live::{ChannelOptions, ChannelState, LiveChannel, ReconnectPolicy};
use matsya_client::{ClientConfig, MatsyaClient};

#[derive(Parser)]
#[command(name = "matsya")]
#[command(about = "Query and sync marine biodiversity data")]
#[command(version)]
struct Cli {
    /// Bearer token for the HTTP API (skips managed-backend session lookup)
    #[arg(long, env = "MATSYA_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List species
    Species(SpeciesArgs),
    /// Show one species by id
    SpeciesGet {
        id: String,
    },
    /// List eDNA samples
    Samples(SamplesArgs),
    /// Upload a FASTA/FASTQ file as a new eDNA sample
    Upload(UploadArgs),
    /// Import target species from OBIS
    SyncObis,
    /// Analysis commands
    Analyses {
        #[command(subcommand)]
        command: AnalysisCommands,
    },
    /// Classify a fish image
    Classify {
        image: PathBuf,
    },
    /// Check API health
    Health,
    /// Print live events until interrupted
    Watch {
        /// Follow a user's chat channel instead of the update broadcast
        #[arg(long)]
        chat: Option<String>,
        /// Reconnect with backoff when the socket drops
        #[arg(long, default_value_t = false)]
        reconnect: bool,
    },
}

#[derive(Args)]
struct SpeciesArgs {
    /// Case-insensitive substring of the scientific or common name
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    offset: Option<u32>,
}

#[derive(Args)]
struct SamplesArgs {
    /// uploaded, processing, processed or failed
    #[arg(long, value_parser = parse_status)]
    status: Option<EdnaStatus>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    offset: Option<u32>,
}

#[derive(Args)]
struct UploadArgs {
    file: PathBuf,
    #[arg(long)]
    sample_id: String,
    #[arg(long)]
    location: String,
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Collection date, YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,
    /// Depth in metres
    #[arg(long)]
    depth: Option<f64>,
}

#[derive(Subcommand)]
enum AnalysisCommands {
    /// List analyses
    List,
    /// Start a new analysis
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        analysis_type: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

fn parse_status(s: &str) -> Result<EdnaStatus, String> {
    serde_json::from_value(Value::String(s.to_ascii_lowercase()))
        .map_err(|_| format!("unknown status {s:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let client = MatsyaClient::from_config(&config).context("Failed to build client")?;

    match cli.token {
        Some(token) => client.set_auth_token(Some(token)),
        None => {
            if let Some(backend) = client.backend() {
                credentials::sync_once(backend.as_ref(), client.auth()).await;
            }
        }
    }

    match cli.command {
        Commands::Species(args) => {
            let query = SpeciesQuery {
                search: args.search,
                limit: args.limit,
                offset: args.offset,
            };
            print_json(&client.fetch_species(&query).await?)?;
        }
        Commands::SpeciesGet { id } => match client.get_species(&id).await? {
            Some(species) => print_json(&species)?,
            None => anyhow::bail!("species {id} not found"),
        },
        Commands::Samples(args) => {
            let query = EdnaSampleQuery {
                status: args.status,
                limit: args.limit,
                offset: args.offset,
            };
            print_json(&client.fetch_edna_samples(&query).await?)?;
        }
        Commands::Upload(args) => {
            let file = UploadFile::from_path(&args.file)
                .await
                .with_context(|| format!("Failed to read {}", args.file.display()))?;
            let metadata = EdnaMetadata {
                sample_id: args.sample_id,
                location_name: args.location,
                latitude: args.lat,
                longitude: args.lon,
                collection_date: args.date,
                depth: args.depth,
            };
            print_json(&client.upload_edna_sample(&file, &metadata).await?)?;
        }
        Commands::SyncObis => print_json(&client.sync_obis().await?)?,
        Commands::Analyses { command } => match command {
            AnalysisCommands::List => print_json(&client.fetch_analyses().await?)?,
            AnalysisCommands::Create {
                name,
                analysis_type,
                params,
            } => {
                let parameters: Value =
                    serde_json::from_str(&params).context("--params must be valid JSON")?;
                let request = AnalysisRequest {
                    name,
                    analysis_type,
                    parameters,
                };
                print_json(&client.create_analysis(&request).await?)?;
            }
        },
        Commands::Classify { image } => {
            let file = UploadFile::from_path(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;
            print_json(&client.classify_image(&file).await?)?;
        }
        Commands::Health => print_json(&client.health().await?)?,
        Commands::Watch { chat, reconnect } => {
            let options = ChannelOptions {
                capacity: config.event_log_capacity(),
                reconnect: if reconnect {
                    ReconnectPolicy::backoff()
                } else {
                    ReconnectPolicy::Never
                },
                ..ChannelOptions::default()
            };
            let mut channel = match chat {
                Some(user) => LiveChannel::chat(client.transport(), &user, options)?,
                None => LiveChannel::updates(client.transport(), options)?,
            };
            watch(&mut channel, reconnect).await?;
        }
    }
    Ok(())
}

async fn watch(channel: &mut LiveChannel, reconnect: bool) -> Result<()> {
    info!("Watching {}", channel.url());
    let mut feed = channel.feed();
    let mut states = channel.state_changes();
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = feed.changed() => printed = print_events(channel, printed)?,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if state == ChannelState::Closed && !reconnect {
                    break;
                }
            }
        }
    }
    print_events(channel, printed)?;
    channel.close().await;
    Ok(())
}

/// Print events after `printed` as JSON lines; returns the last sequence printed.
fn print_events(channel: &LiveChannel, mut printed: u64) -> Result<u64> {
    for observed in channel.events_since(printed) {
        let line = match &observed.event {
            LiveEvent::Other { payload, .. } => payload.to_string(),
            event => serde_json::to_string(event)?,
        };
        println!("{line}");
        printed = observed.seq;
    }
    Ok(printed)
}
