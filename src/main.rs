//! uicache - command-line front end for the demo caches.
//!
//! Configuration comes from the environment (see `config`), logging is
//! controlled through `RUST_LOG`.

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uicache::{AppState, Config};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Parser)]
#[command(name = "uicache", version, about = "Layered caches for UI demo content")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a URL through the tiered cache
    Get { url: String },

    /// Look a key up and report which tier answered
    Show { key: String },

    /// Store a value in both tiers
    Put { key: String, value: String },

    /// Remove every cached entry from memory and storage
    Clear,

    /// List posts (cached), or fetch a single one
    Posts {
        #[arg(long)]
        id: Option<u64>,
    },

    /// Resolve module paths under the module root, or absolute URLs
    Load {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uicache=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    info!("Configuration loaded (storage: {:?})", config.storage_mode);

    let state = AppState::new(&config)?;

    match cli.command {
        Command::Get { url } => {
            let body = state.fetcher.fetch_cached(&state.content, &url).await?;
            println!("{body}");
        }
        Command::Show { key } => {
            let lookup = state.content.lookup(&key);
            match lookup.tier() {
                Some(tier) => info!("{} served from {}", key, tier),
                None => info!("{} is not cached", key),
            }
            if let Some(value) = lookup.into_value() {
                println!("{value}");
            }
        }
        Command::Put { key, value } => {
            if let Err(e) = state.content.try_set(&key, value) {
                warn!("Stored {} in memory only: {}", key, e);
            }
        }
        Command::Clear => {
            let removed = state.content.try_clear()?;
            info!("Removed {} persistent entries", removed);
        }
        Command::Posts { id: Some(id) } => {
            let post = state.posts.by_id(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::Posts { id: None } => {
            let posts = state.posts.cached_all().await?;
            for post in posts {
                println!("#{:<4} {}", post.id, post.title);
            }
        }
        Command::Load { paths } => {
            let units = state.load(&paths).await?;
            for unit in units {
                println!("{} -> {} ({} bytes)", unit.id, unit.origin, unit.content.len());
            }
        }
    }

    Ok(())
}
