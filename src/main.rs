//! Docseekr - keyword search across folders of PDF and DOCX documents
//!
//! Counts keyword occurrences per document, ranks documents by count and
//! writes a highlighted copy of every matching file next to its original.
//! Results are available from the terminal or over HTTP.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cache;
mod cli;
mod config;
mod counter;
mod docx;
mod error;
mod highlight;
mod loader;
mod output;
mod pdf;
mod ranker;
mod search;
mod server;

use cli::{Cli, Commands};
use output::ResultPrinter;
use search::SearchService;
use server::ServerConfig;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            no_cors,
            public_url,
            options,
        } => {
            let config = options.into_config()?;
            tracing::info!("Base directory: {:?}", config.base_dir);

            let service = SearchService::new(config);
            let server_config = ServerConfig {
                bind,
                allow_cors: !no_cors,
                public_url,
            };

            tokio::runtime::Runtime::new()?
                .block_on(server::start_server(service, server_config))?;
        }
        Commands::Search {
            folder,
            keyword,
            limit,
            no_highlight,
            json,
            options,
        } => {
            let config = options.into_config()?;
            tracing::info!("Searching {:?} for: {}", folder, keyword);

            let service = SearchService::new(config);
            let results = service.search(&folder, &keyword, limit, !no_highlight)?;

            let printer = ResultPrinter::new(&keyword, json);
            printer.print_results(&results)?;
        }
    }

    Ok(())
}
