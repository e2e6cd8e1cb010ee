//! CLI definitions using clap derive macros
//!
//! Subcommands:
//! - serve: run the HTTP frontend
//! - search: run one search from the terminal

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{resolve_base_dir, MatchCase, SearchConfig, DEFAULT_HIGHLIGHT_COLOR};

/// Docseekr - keyword search and highlighting for PDF and DOCX folders
#[derive(Parser, Debug)]
#[command(name = "docseekr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct SearchOptions {
    /// Directory that folder names are resolved against
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// File whose first non-empty line is the base directory
    #[arg(long, value_name = "FILE")]
    pub base_dir_file: Option<PathBuf>,

    /// Only search the top level of a folder
    #[arg(long, default_value = "false")]
    pub flat: bool,

    /// Case policy when locating matches inside PDF pages
    #[arg(long, value_enum, default_value_t = MatchCase::Sensitive)]
    pub pdf_match_case: MatchCase,

    /// Highlight colour for DOCX runs
    #[arg(long, default_value = DEFAULT_HIGHLIGHT_COLOR)]
    pub highlight_color: String,

    /// Regenerate highlighted copies even when they are up to date
    #[arg(short, long, default_value = "false")]
    pub force: bool,
}

impl SearchOptions {
    /// Resolve the base directory and build the search configuration
    pub fn into_config(self) -> Result<SearchConfig> {
        let base_dir = resolve_base_dir(self.base_dir, self.base_dir_file.as_deref())?;
        Ok(SearchConfig {
            recursive: !self.flat,
            pdf_match_case: self.pdf_match_case,
            highlight_color: self.highlight_color,
            force: self.force,
            ..SearchConfig::with_base_dir(base_dir)
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Disable the permissive CORS layer
        #[arg(long, default_value = "false")]
        no_cors: bool,

        /// Base URL used in result links (defaults to the request's Host)
        #[arg(long, value_name = "URL")]
        public_url: Option<String>,

        #[command(flatten)]
        options: SearchOptions,
    },

    /// Search a folder for a keyword
    Search {
        /// Folder to search, relative to the base directory
        #[arg(value_name = "FOLDER")]
        folder: String,

        /// Keyword to count and highlight
        #[arg(value_name = "KEYWORD")]
        keyword: String,

        /// Maximum number of documents to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip writing highlighted copies
        #[arg(long, default_value = "false")]
        no_highlight: bool,

        /// Output results as JSON (for tool integration)
        #[arg(long, default_value = "false")]
        json: bool,

        #[command(flatten)]
        options: SearchOptions,
    },
}
