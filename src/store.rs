use std::fs::File;
use std::io::{BufRead as _, BufReader, BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;

use crate::formats::BookRecord;

/// Writes one JSON object per record, replacing any previous file content.
pub fn write_records(path: &Path, records: &[BookRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("create records file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut out, record).context("serialize book record")?;
        out.write_all(b"\n").context("write record newline")?;
    }
    out.flush()
        .with_context(|| format!("flush records file: {}", path.display()))?;
    Ok(())
}

pub fn read_records(path: &Path) -> anyhow::Result<Vec<BookRecord>> {
    let file =
        File::open(path).with_context(|| format!("open records file: {}", path.display()))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.context("read records line")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: BookRecord = serde_json::from_str(&line).context("parse book record")?;
        records.push(record);
    }
    Ok(records)
}
