use anyhow::Result;
use clap::{Parser, Subcommand};
use relgraph::{Config, GraphQueryService, HttpRelationClient, QuerySettings};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "relgraph")]
#[command(about = "Explore how biomedical entities connect through the relation API")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// All relationships of one entity, both directions
    Everything {
        /// Entity CURIE, e.g. HGNC:8651
        entity: String,
    },
    /// Relationships of one entity under a specific predicate
    Predicate {
        entity: String,
        /// Predicate CURIE, e.g. biolink:treats
        predicate: String,
    },
    /// Subgraph connecting two or more entities
    Paths {
        #[arg(required = true, num_args = 2..)]
        entities: Vec<String>,

        /// Neighborhood radius around each entity (defaults to config)
        #[arg(short, long)]
        max_depth: Option<usize>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load()?;

    // Initialize logger from environment variable or the configured level.
    // Logs go to stderr so stdout stays clean JSON.
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.logging.level.as_str())
    ).init();

    log::info!("Starting Relgraph v{}", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => log::info!("Loaded config from {}", path.display()),
        None => log::info!("No config.toml found, using defaults"),
    }
    log::info!("Relation API: {}", config.api.base_url);

    let client = HttpRelationClient::new(&config.api.base_url, config.timeout())?;
    let service = GraphQueryService::new(Arc::new(client), QuerySettings::from(&config));

    let start = Instant::now();

    match args.command {
        Command::Everything { entity } => {
            let result = service.get_everything(&entity).await?;
            print_json(&result)?;
        }
        Command::Predicate { entity, predicate } => {
            let result = service.query_with_predicate(&entity, &predicate).await?;
            print_json(&result)?;
        }
        Command::Paths { entities, max_depth } => {
            let result = service.get_connecting_paths(&entities, max_depth).await?;
            log::info!(
                "{} nodes, {} edges, {} connected components",
                result.nodes.len(),
                result.edges.len(),
                result.connected_components
            );
            print_json(&result)?;
        }
    }

    log::info!("Query finished in {:?}", start.elapsed());

    Ok(())
}
