//! CLI entry point for postforge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postforge::Site;

#[derive(Parser)]
#[command(name = "postforge")]
#[command(version)]
#[command(about = "A deterministic static site builder for Jekyll-style blogs", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the public directory
    #[command(alias = "b")]
    Build {
        /// Rebuild on every change
        #[arg(short, long)]
        watch: bool,
    },

    /// Build, then serve the site locally
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public directory
    Clean,

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Create an undated draft
        #[arg(long)]
        draft: bool,
    },

    /// List site content
    List {
        /// What to list (posts, drafts, tags)
        #[arg(default_value = "posts")]
        kind: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postforge=debug,info"
    } else {
        "postforge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Build { watch } => {
            let site = Site::new(&base_dir)?;
            let report = site.build()?;
            println!(
                "Built {} pages and {} assets into {:?}",
                report.pages, report.assets, site.public_dir
            );

            if watch {
                tokio::task::spawn_blocking(move || {
                    postforge::commands::build::watch(&site, || println!("Rebuilt."))
                })
                .await??;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Building site...");
            site.build()?;
            postforge::server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::New { title, draft } => {
            let site = Site::new(&base_dir)?;
            let path = site.new_post(&title, draft)?;
            println!("Created: {:?}", path);
        }

        Commands::List { kind } => {
            let site = Site::new(&base_dir)?;
            postforge::commands::list::run(&site, &kind)?;
        }

        Commands::Version => {
            println!("postforge version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
