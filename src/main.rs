use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    bookcrawl::logging::init().context("init logging")?;

    let cli = bookcrawl::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookcrawl::cli::Command::Crawl(args) => {
            bookcrawl::crawl::run(args).context("crawl")?;
        }
        bookcrawl::cli::Command::Book(args) => {
            bookcrawl::extract::run(args).context("book")?;
        }
    }

    Ok(())
}
