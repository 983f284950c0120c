use clap::{Args, Parser, Subcommand};

use crate::crawl::{DEFAULT_BASE_URL, DEFAULT_OUTPUT_PATH};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Crawl(CrawlArgs),
    Book(BookArgs),
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Catalogue page number to start from.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub start_page: i64,

    /// Write collected records to `--out`.
    #[arg(long)]
    pub save: bool,

    /// Output file for collected records (JSON Lines, overwritten).
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub out: String,

    /// Site root serving `catalogue/page-{n}.html`.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Pause after each book (politeness).
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Retries for a catalogue page answering a non-404 error status.
    #[arg(long, default_value_t = 3)]
    pub max_page_retries: u32,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Absolute URL of a book detail page.
    #[arg(long)]
    pub url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}
