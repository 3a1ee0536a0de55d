//! tasking-client - inspect Tasking Manager project resources from a shell

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tasking_client::{
    config::ConnectionArgs, logging, ApiClient, ClientConfig, FilterState, FilterValue,
    ProjectId, ProjectQueries, QueryClient, QueryState,
};

/// Fetch project resources from a Tasking Manager API and print them as JSON
#[derive(Parser, Debug)]
#[command(name = "tasking-client")]
#[command(about = "Fetch Tasking Manager project resources as JSON")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search projects
    Projects {
        /// UI filter as key=value (repeatable), e.g. --filter team=5
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Browse by action (mapping, validation)
        #[arg(long)]
        action: Option<String>,
    },
    /// Project details
    Project { id: ProjectId },
    /// Project summary
    Summary { id: ProjectId },
    /// Per-user contributions
    Contributions { id: ProjectId },
    /// Latest activity
    Activities {
        id: ProjectId,

        /// Keep polling and print every update
        #[arg(long)]
        watch: bool,
    },
    /// Task grid
    Tasks { id: ProjectId },
    /// Priority areas
    PriorityAreas { id: ProjectId },
    /// Daily contribution timeline
    Timeline { id: ProjectId },
}

fn parse_filters(raw: &[String]) -> anyhow::Result<FilterState> {
    let mut filters = FilterState::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("filter must look like key=value: {}", pair);
        };
        match FilterValue::parse(value.trim()) {
            Some(value) => filters.insert(key.trim(), value),
            None => warn!("Ignoring empty filter: {}", key.trim()),
        }
    }
    Ok(filters)
}

fn print_state<T: Serialize>(state: &QueryState<T>) -> anyhow::Result<()> {
    if let Some(ref error) = state.error {
        error!("Request failed: {}", error);
    }
    match state.data {
        Some(ref data) => println!("{}", serde_json::to_string_pretty(data)?),
        None => println!("null"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.connection.log_level);
    let config = ClientConfig::from(cli.connection);

    let ctx = config.request_context();
    info!("API: {}", config.base_url);
    let api = ApiClient::new(config).context("invalid client configuration")?;
    let queries = ProjectQueries::new(api, QueryClient::new());

    // Ctrl-C aborts whatever is in flight
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Projects { filters, action } => {
            let filters = parse_filters(&filters)?;
            info!(
                "Params: {:?}",
                queries.projects_params(&filters, action.as_deref()).to_query_pairs()
            );
            print_state(&queries.projects(&ctx, filters, action, &cancel).await?)?;
        }
        Command::Project { id } => print_state(&queries.project(&ctx, id, &cancel).await?)?,
        Command::Summary { id } => {
            print_state(&queries.project_summary(&ctx, id, &cancel).await?)?
        }
        Command::Contributions { id } => {
            print_state(&queries.project_contributions(&ctx, id, &cancel).await?)?
        }
        Command::Activities { id, watch: false } => {
            print_state(&queries.project_activities(&ctx, id, &cancel).await?)?
        }
        Command::Activities { id, watch: true } => {
            let client = queries.query_client().clone();
            let mut observer = client.observe(queries.project_activities_query(&ctx, id));
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    state = observer.settled() => print_state(&state?)?,
                }
            }
        }
        Command::Tasks { id } => print_state(&queries.project_tasks(&ctx, id, &cancel).await?)?,
        Command::PriorityAreas { id } => {
            print_state(&queries.priority_areas(&ctx, id, &cancel).await?)?
        }
        Command::Timeline { id } => {
            print_state(&queries.project_timeline(&ctx, id, &cancel).await?)?
        }
    }

    Ok(())
}
