use anyhow::Context as _;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::cli::BookArgs;
use crate::crawl::{CrawlConfig, build_client};
use crate::formats::{BookRecord, DESCRIPTION, RATING, TITLE};

const RATING_MARKER: &str = "star-rating";

static RATING_WORDS: [(&str, &str); 5] = [
    ("One", "1"),
    ("Two", "2"),
    ("Three", "3"),
    ("Four", "4"),
    ("Five", "5"),
];

/// Maps a star-rating class word (`"Three"`) to its digit (`"3"`).
#[must_use]
pub fn rating_digit(word: &str) -> Option<&'static str> {
    RATING_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, digit)| *digit)
}

/// Fetches one book detail page and extracts its fields.
///
/// Transport errors, timeouts and non-success statuses are returned as errors;
/// nothing is retried here.
pub fn fetch_book(client: &Client, url: &str) -> anyhow::Result<BookRecord> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;
    let bytes = response
        .bytes()
        .with_context(|| format!("read body: {url}"))?;
    let html = String::from_utf8_lossy(&bytes);

    parse_book_page(&html).with_context(|| format!("parse book page: {url}"))
}

pub fn parse_book_page(html: &str) -> anyhow::Result<BookRecord> {
    let document = Html::parse_document(html);
    let mut record = BookRecord::new();

    extract_product_table(&document, &mut record)?;

    if let Some(heading) = document.select(&selector("h1")?).next() {
        record.insert(TITLE, element_text(heading));
    }

    if let Some(description) = extract_description(&document)? {
        record.insert(DESCRIPTION, description);
    }

    if let Some(rating) = extract_rating(&document)? {
        record.insert(RATING, rating);
    }

    Ok(record)
}

fn extract_product_table(document: &Html, record: &mut BookRecord) -> anyhow::Result<()> {
    let Some(table) = document
        .select(&selector("table.table.table-striped")?)
        .next()
    else {
        return Ok(());
    };

    let header_cell = selector("th")?;
    let data_cell = selector("td")?;
    for row in table.select(&selector("tr")?) {
        let (Some(th), Some(td)) = (
            row.select(&header_cell).next(),
            row.select(&data_cell).next(),
        ) else {
            continue;
        };
        record.insert(element_text(th), element_text(td));
    }

    Ok(())
}

fn extract_description(document: &Html) -> anyhow::Result<Option<String>> {
    let Some(container) = document
        .select(&selector("div#product_description")?)
        .next()
    else {
        return Ok(None);
    };

    let paragraph = container
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "p");

    Ok(paragraph.map(element_text))
}

fn extract_rating(document: &Html) -> anyhow::Result<Option<String>> {
    let Some(indicator) = document.select(&selector("p.star-rating")?).next() else {
        return Ok(None);
    };

    let word = indicator
        .value()
        .classes()
        .find(|class| *class != RATING_MARKER);

    Ok(word.map(|word| rating_digit(word).unwrap_or_default().to_owned()))
}

pub fn run(args: BookArgs) -> anyhow::Result<()> {
    let config = CrawlConfig {
        timeout: std::time::Duration::from_secs(args.timeout_secs),
        ..CrawlConfig::default()
    };
    let client = build_client(&config)?;
    let record = fetch_book(&client, &args.url)?;

    let json = serde_json::to_string(&record).context("serialize book record")?;
    println!("{json}");
    Ok(())
}

/// Text below `element`, with every text fragment trimmed and empty ones dropped.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

pub(crate) fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse css selector {css:?}: {err}"))
}
