/**
This module turns the raw VLSP 2018 corpus into dataset records.

The raw corpus stores one article per file, grouped by topic directory and split:
`<raw_dir>/<split>/<topic>/<id>.muc`. The first line of a file is the title and the rest is the
body. Entities are marked inline with ENAMEX tags, which may be nested:

```text
<ENAMEX TYPE="PERSON">Đức Phúc</ENAMEX> biểu diễn tại <ENAMEX TYPE="LOCATION">Hà Nội</ENAMEX>
```
*/
use crate::dataset::{save_json, Record, Split};
use crate::entity::{EntityMap, EntityType, EntityValue};
use crate::error::{Error, Result};
use either::Either;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

const ENAMEX_PATTERN: &str = r#"(?is)<ENAMEX\s+TYPE="([^"]+)">(.*?)</ENAMEX>"#;

/// Extensions of the raw article files.
const RAW_EXTENSIONS: [&str; 2] = ["muc", "txt"];

fn enamex_regex() -> Result<&'static Regex> {
    static ENAMEX: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    ENAMEX
        .get_or_init(|| Regex::new(ENAMEX_PATTERN))
        .as_ref()
        .map_err(|e| Error::Pattern(e.clone()))
}

/// Removes double quotes (straight and curly) and collapses whitespace runs, newlines included,
/// into single spaces.
///
/// ```rust
/// use vner_eval::corpus::clean_text;
///
/// assert_eq!(clean_text("  “Hà   Nội”\n\"mùa thu\" "), "Hà Nội mùa thu");
/// ```
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Removes every ENAMEX tag from `text` and collects the tagged mentions.
///
/// Tags are unwrapped one layer at a time. At each layer, only the bodies without any remaining
/// tag are collected, so a mention is recorded once it is innermost. Mentions are cleaned and
/// kept once per type, in order of first appearance. Tags of unknown types are unwrapped without
/// being collected.
pub fn strip_tags_and_collect_entities(text: &str) -> Result<(String, EntityMap)> {
    let regex = enamex_regex()?;
    let mut ground_truth = EntityMap::default();
    let mut current = text.to_string();
    while regex.is_match(&current) {
        for caps in regex.captures_iter(&current) {
            let value = caps[2].trim();
            if value.is_empty() || value.contains('<') {
                continue;
            }
            let Some(entity_type) = EntityType::from_enamex_tag(&caps[1]) else {
                continue;
            };
            let cleaned = clean_text(value);
            if cleaned.is_empty() {
                continue;
            }
            let mentions = ground_truth.get_mut(entity_type);
            let cleaned = EntityValue::Plain(cleaned);
            if !mentions.contains(&cleaned) {
                mentions.push(cleaned);
            }
        }
        current = regex
            .replace_all(&current, |caps: &Captures| caps[2].to_string())
            .into_owned();
    }
    Ok((clean_text(&current), ground_truth))
}

/// Removes every ENAMEX tag, trimming the tagged content, without collecting anything.
fn unwrap_tags(text: &str) -> Result<String> {
    let regex = enamex_regex()?;
    let mut current = text.to_string();
    while regex.is_match(&current) {
        current = regex
            .replace_all(&current, |caps: &Captures| caps[2].trim().to_string())
            .into_owned();
    }
    Ok(current)
}

/// The id of a raw file: its stem as an integer when possible, the stem itself otherwise.
fn record_id(path: &Path) -> Either<i64, String> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.parse::<i64>() {
        Ok(id) => Either::Left(id),
        Err(_) => Either::Right(stem),
    }
}

/// Parses one raw article into a record.
pub fn parse_file(path: &Path, topic: &str) -> Result<Record> {
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let (title_raw, body_raw) = match raw.split_once('\n') {
        Some((title, body)) => (title.trim(), body.trim()),
        None => (raw.trim(), ""),
    };
    let title = clean_text(&unwrap_tags(title_raw)?);
    let (text, ground_truth) = strip_tags_and_collect_entities(body_raw)?;
    Ok(Record {
        id: record_id(path),
        topic: topic.to_string(),
        title,
        text,
        ground_truth,
        rewrite: None,
    })
}

/// Entries of `dir` matching `keep`, sorted by path.
fn sorted_entries<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Parses every article of a split: topic directories in sorted order, then `.muc` and `.txt`
/// files in sorted order.
pub fn collect_split(raw_dir: &Path, split: Split) -> Result<Vec<Record>> {
    let split_dir = raw_dir.join(split.as_str());
    if !split_dir.is_dir() {
        return Err(Error::DatasetNotFound(split_dir));
    }
    let mut records = Vec::new();
    for topic_dir in sorted_entries(&split_dir, Path::is_dir)? {
        let topic = topic_dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let files = sorted_entries(&topic_dir, |path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| RAW_EXTENSIONS.contains(&ext))
        })?;
        debug!(%split, topic = %topic, files = files.len(), "parsing topic");
        for file in files {
            records.push(parse_file(&file, &topic)?);
        }
    }
    Ok(records)
}

/// Processes every split of the raw corpus and writes `<out_dir>/<split>.json`. Returns the
/// written paths with their number of records.
pub fn process_corpus(raw_dir: &Path, out_dir: &Path) -> Result<Vec<(Split, usize, PathBuf)>> {
    let mut written = Vec::new();
    for split in Split::all_splits() {
        let records = collect_split(raw_dir, split)?;
        let path = save_json(&out_dir.join(split.file_name()), &records)?;
        info!(%split, records = records.len(), path = %path.display(), "wrote split");
        written.push((split, records.len(), path));
    }
    Ok(written)
}
