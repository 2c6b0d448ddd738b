//! Post Cache CLI
//!
//! Inspects and manages a file-backed post cache.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use post_cache::cache::{
    invalidate_author_posts, invalidate_post_detail, invalidate_posts, invalidate_user_posts,
    Clock, SystemClock,
};
use post_cache::{Config, FileStorage, PersistentCache};

#[derive(Parser)]
#[command(name = "post_cache")]
#[command(about = "Inspect and manage the persistent post cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage file holding the cache
    #[arg(long, env = "CACHE_PATH")]
    path: Option<PathBuf>,

    /// Physical key prefix
    #[arg(long, env = "CACHE_PREFIX")]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cached value for a key
    Get { key: String },
    /// Store a JSON value under a key
    Set {
        key: String,
        /// Value as JSON text
        json: String,
        /// TTL in milliseconds (defaults to the configured TTL)
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Remove a key
    Clear { key: String },
    /// List cached keys with their remaining TTL
    Keys,
    /// Remove every expired or malformed entry
    Purge,
    /// Clear the keys a data change makes stale
    Invalidate {
        #[command(subcommand)]
        target: Target,
    },
}

#[derive(Subcommand)]
enum Target {
    /// The global post listing
    AllPosts,
    /// Posts written by a user
    User { uid: String },
    /// Posts attributed to an author name
    Author { name: String },
    /// A single post
    Post { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "post_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(path) = cli.path {
        config.storage_path = path;
    }
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }

    let storage = FileStorage::open(&config.storage_path)
        .with_context(|| format!("opening {}", config.storage_path.display()))?;
    let mut cache = PersistentCache::from_config(storage, SystemClock, &config);

    match cli.command {
        Commands::Get { key } => match cache.get::<Value>(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("(none)"),
        },
        Commands::Set { key, json, ttl_ms } => {
            let value: Value =
                serde_json::from_str(&json).with_context(|| format!("invalid JSON: {}", json))?;
            cache.set(&key, &value, ttl_ms.map(Duration::from_millis));
            info!("Stored '{}'", key);
        }
        Commands::Clear { key } => {
            cache.clear(&key);
            info!("Cleared '{}'", key);
        }
        Commands::Keys => {
            let now = cache.clock().now_ms();
            for key in cache.keys() {
                let status = match cache.peek(&key) {
                    Some(entry) if entry.is_expired(now) => "expired".to_string(),
                    Some(entry) => match entry.ttl_remaining_ms(now) {
                        Some(ms) => format!("{}ms", ms),
                        None => "no expiry".to_string(),
                    },
                    None => "unreadable".to_string(),
                };
                println!("{}\t{}", key, status);
            }
        }
        Commands::Purge => {
            let removed = cache.purge_expired();
            println!("{}", removed);
        }
        Commands::Invalidate { target } => {
            match &target {
                Target::AllPosts => invalidate_posts(&mut cache),
                Target::User { uid } => invalidate_user_posts(&mut cache, uid),
                Target::Author { name } => invalidate_author_posts(&mut cache, name),
                Target::Post { id } => invalidate_post_detail(&mut cache, id),
            }
            info!("{} invalidation(s) applied", cache.stats().invalidations);
        }
    }

    Ok(())
}
