use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use scraper::Html;
use url::Url;

use crate::cli::CrawlArgs;
use crate::extract::{fetch_book, selector};
use crate::formats::BookRecord;

pub const DEFAULT_BASE_URL: &str = "https://books.toscrape.com/";
pub const DEFAULT_OUTPUT_PATH: &str = "books_data.txt";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Site root; catalogue pages live under `{base_url}catalogue/`.
    pub base_url: String,
    pub timeout: Duration,
    /// Politeness pause after every catalogue entry and before a page retry.
    pub delay: Duration,
    pub output_path: PathBuf,
    /// Consecutive non-404 failures tolerated for one catalogue page.
    pub max_page_retries: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(10),
            delay: Duration::from_millis(100),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            max_page_retries: 3,
        }
    }
}

impl CrawlConfig {
    pub fn site_root(&self) -> anyhow::Result<Url> {
        let mut root = Url::parse(&self.base_url)
            .with_context(|| format!("parse base url: {}", self.base_url))?;
        if root.scheme() != "http" && root.scheme() != "https" {
            anyhow::bail!("base url must be http/https: {root}");
        }
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(root)
    }

    pub fn catalogue_root(&self) -> anyhow::Result<Url> {
        self.site_root()?
            .join("catalogue/")
            .context("build catalogue url")
    }
}

pub fn build_client(config: &CrawlConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!("bookcrawl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")
}

pub fn catalogue_page_url(config: &CrawlConfig, page: i64) -> anyhow::Result<Url> {
    config
        .catalogue_root()?
        .join(&format!("page-{page}.html"))
        .with_context(|| format!("build catalogue page url: {page}"))
}

/// Resolves a catalogue entry link to an absolute detail page URL.
///
/// Links starting with `..` lose their first three characters and resolve
/// against the site root; every other link resolves against the catalogue.
pub fn detail_url(config: &CrawlConfig, href: &str) -> anyhow::Result<Url> {
    let (base, relative) = if href.starts_with("..") {
        (config.site_root()?, href.get(3..).unwrap_or_default())
    } else {
        (config.catalogue_root()?, href)
    };
    base.join(relative)
        .with_context(|| format!("resolve book link: {href}"))
}

/// `href` of every `article.product_pod` heading link, in page order.
pub fn book_links(html: &str) -> anyhow::Result<Vec<String>> {
    let document = Html::parse_document(html);
    let heading_link = selector("h3 a")?;

    let links = document
        .select(&selector("article.product_pod")?)
        .filter_map(|article| {
            article
                .select(&heading_link)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::to_owned)
        })
        .collect();

    Ok(links)
}

enum CataloguePage {
    Listing(String),
    NotFound,
    Unavailable(StatusCode),
}

fn fetch_catalogue_page(client: &Client, url: &Url) -> anyhow::Result<CataloguePage> {
    let response = client
        .get(url.clone())
        .send()
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(CataloguePage::NotFound);
    }
    if !status.is_success() {
        return Ok(CataloguePage::Unavailable(status));
    }

    let html = response
        .text()
        .with_context(|| format!("read body: {url}"))?;
    Ok(CataloguePage::Listing(html))
}

/// Walks catalogue pages from `start_page` until one answers 404, collecting
/// one record per book whose detail page could be fetched and had any fields.
///
/// A catalogue request that fails at the transport level aborts the walk, as
/// does a page that keeps answering a non-404 error status for more than
/// `max_page_retries` attempts in a row. Books that fail, links that cannot be
/// resolved and pages without any fields are logged and left out. With `save`,
/// the collection is also written to `output_path`; a failed write is only
/// logged.
pub fn walk(config: &CrawlConfig, start_page: i64, save: bool) -> anyhow::Result<Vec<BookRecord>> {
    let client = build_client(config)?;
    let mut books = Vec::new();
    let mut page = start_page;
    let mut failures = 0_u32;

    loop {
        let url = catalogue_page_url(config, page)?;
        tracing::info!(page, "fetching catalogue page");

        let html = match fetch_catalogue_page(&client, &url)? {
            CataloguePage::Listing(html) => html,
            CataloguePage::NotFound => {
                tracing::info!(page, "catalogue page returned 404; catalogue finished");
                break;
            }
            CataloguePage::Unavailable(status) => {
                failures += 1;
                if failures > config.max_page_retries {
                    anyhow::bail!(
                        "catalogue page {page} still failing after {} retries: {status}",
                        config.max_page_retries
                    );
                }
                tracing::warn!(page, %status, attempt = failures, "catalogue page unavailable; retrying");
                thread::sleep(config.delay);
                continue;
            }
        };
        failures = 0;

        for href in book_links(&html)? {
            let book_url = match detail_url(config, &href) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(%href, ?err, "unusable book link; skipping");
                    thread::sleep(config.delay);
                    continue;
                }
            };
            match fetch_book(&client, book_url.as_str()) {
                Ok(record) if record.is_empty() => {
                    tracing::debug!(url = %book_url, "book page had no fields; skipping");
                }
                Ok(record) => {
                    tracing::debug!(url = %book_url, fields = record.len(), "added book");
                    books.push(record);
                }
                Err(err) => {
                    tracing::warn!(url = %book_url, ?err, "failed to fetch book; skipping");
                }
            }
            thread::sleep(config.delay);
        }

        page = page
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("catalogue page number overflowed after page {page}"))?;
    }

    if save {
        match crate::store::write_records(&config.output_path, &books) {
            Ok(()) => tracing::info!(
                path = %config.output_path.display(),
                books = books.len(),
                "saved book records"
            ),
            Err(err) => tracing::warn!(?err, "failed to save book records"),
        }
    }

    Ok(books)
}

pub fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let config = CrawlConfig {
        base_url: args.base_url,
        timeout: Duration::from_secs(args.timeout_secs),
        delay: Duration::from_millis(args.delay_ms),
        output_path: PathBuf::from(args.out),
        max_page_retries: args.max_page_retries,
    };

    let books = walk(&config, args.start_page, args.save).context("walk catalogue")?;
    println!("collected {} books", books.len());
    Ok(())
}
