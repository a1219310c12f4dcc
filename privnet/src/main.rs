//! privnet: manage a private network and its instance membership.
//!
//! Each invocation:
//! - Loads the recorded state from the state file
//! - Reconciles it against the desired state given on the command line
//! - Saves the refreshed state and prints it as JSON

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use privnet::state::{self, NetworkSpec, NetworkState};
use privnet::{
    ApiClient, ClientConfig, ControllerConfig, ControllerError, NetworkController, RetryPolicy,
};

/// Private network lifecycle controller
#[derive(Parser, Debug)]
#[command(name = "privnet", version, about)]
struct Args {
    /// API endpoint
    #[arg(long, env = "PRIVNET_ENDPOINT", default_value_t = ClientConfig::default().endpoint)]
    endpoint: String,

    /// Pre-issued bearer token for the API
    #[arg(long, env = "PRIVNET_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File holding the recorded resource state
    #[arg(long, default_value = "privnet.state.json")]
    state: PathBuf,

    /// Region for networks created without --region
    #[arg(long, default_value_t = ControllerConfig::default().default_region)]
    default_region: String,

    /// Attempts for enabling private networking on an instance
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts)]
    enable_attempts: u32,

    /// Seconds between enable attempts
    #[arg(long, default_value_t = RetryPolicy::default().interval.as_secs())]
    enable_interval: u64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = ClientConfig::default().timeout.as_secs())]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the network and attach the given instances
    Create(DesiredArgs),

    /// Refresh the recorded state from the API
    Read,

    /// Converge name, description and membership to the given values
    Update(DesiredArgs),

    /// Detach all instances and delete the network
    Delete,

    /// Adopt an existing network
    Import {
        /// Private network ID
        id: i64,
    },
}

#[derive(ClapArgs, Debug)]
struct DesiredArgs {
    /// Network name
    #[arg(long, default_value = "")]
    name: String,

    /// Network description
    #[arg(long, default_value = "")]
    description: String,

    /// Region (only used on create)
    #[arg(long)]
    region: Option<String>,

    /// Instance to attach (repeatable)
    #[arg(long = "instance-id")]
    instance_ids: Vec<i64>,
}

impl From<DesiredArgs> for NetworkSpec {
    fn from(args: DesiredArgs) -> Self {
        NetworkSpec {
            name: args.name,
            description: args.description,
            region: args.region,
            instance_ids: args.instance_ids.into_iter().collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privnet=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let client_config = ClientConfig {
        bearer_token: args.token.clone(),
        timeout: Duration::from_secs(args.timeout),
        ..ClientConfig::new(&args.endpoint)
    };
    let client = ApiClient::new(client_config).context("Failed to create API client")?;
    info!("API endpoint: {}", client.endpoint());

    let controller = NetworkController::new(
        client,
        ControllerConfig {
            default_region: args.default_region.clone(),
            enable_retry: RetryPolicy::new(
                args.enable_attempts,
                Duration::from_secs(args.enable_interval),
            ),
        },
    );

    let mut recorded = state::load(&args.state)
        .await
        .with_context(|| format!("Failed to load {}", args.state.display()))?;

    let result = run(&controller, &mut recorded, args.command).await;

    // Save even on failure: a partial create or update still records what exists
    state::save(&args.state, &recorded)
        .await
        .with_context(|| format!("Failed to save {}", args.state.display()))?;
    result?;

    println!("{}", serde_json::to_string_pretty(&recorded)?);
    Ok(())
}

async fn run(
    controller: &NetworkController<ApiClient>,
    recorded: &mut NetworkState,
    command: Command,
) -> Result<()> {
    match command {
        Command::Create(desired) => {
            if let Some(id) = recorded.id {
                bail!("Private network {} already exists, use update", id);
            }
            let created = controller.create(&desired.into()).await;
            if let Err(ControllerError::Incomplete { state, .. }) = &created {
                *recorded = (**state).clone();
            }
            *recorded = created?;
        }
        Command::Read => {
            controller.read(recorded).await?;
        }
        Command::Update(desired) => {
            if !controller.update(recorded, &desired.into()).await? {
                info!("No changes");
            }
        }
        Command::Delete => {
            let outcome = controller.delete(recorded).await?;
            for failure in &outcome.drain_failures {
                warn!(
                    "Instance {} may still be attached: {}",
                    failure.instance_id, failure.error
                );
            }
        }
        Command::Import { id } => {
            if let Some(existing) = recorded.id {
                bail!("State already tracks private network {}", existing);
            }
            *recorded = controller.import(id).await?;
        }
    }
    Ok(())
}
