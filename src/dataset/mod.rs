/**
This module loads the processed dataset splits. Each split is a UTF-8 JSON array of records
stored as `<data_dir>/<split>.json`. A `DatasetLoader` reads a split the first time it is asked
for and keeps it for the following calls.
*/
pub mod sampler;
pub mod stats;

use crate::entity::EntityMap;
use crate::error::{Error, Result};
use ahash::AHashMap;
use either::Either;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// One annotated news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Integer ids come from numeric file names, anything else is kept as a string.
    #[serde(with = "either::serde_untagged")]
    pub id: Either<i64, String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
    pub ground_truth: EntityMap,
    /// Rewritten text, set by the rewrite pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
}

impl Record {
    /// The id as a string, used to pair model outputs with their ground truth.
    pub fn id_key(&self) -> String {
        self.id.to_string()
    }
}

/// The three splits of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence)]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    pub fn all_splits() -> Vec<Split> {
        all::<Split>().collect()
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "dev" | "validation" => Ok(Split::Dev),
            "test" => Ok(Split::Test),
            _ => Err(Error::parse("Split", s)),
        }
    }
}

/// Reads a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(Error::DatasetNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let records: Vec<Record> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))?;
    debug!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

/// Writes `value` as pretty-printed JSON. Non-ASCII characters are written as is and missing
/// parent directories are created.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| Error::json(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Loader of the dataset splits with a private per-split cache.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
    cache: AHashMap<Split, Vec<Record>>,
}

impl DatasetLoader {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: AHashMap::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.data_dir.join(split.file_name())
    }

    pub fn is_cached(&self, split: Split) -> bool {
        self.cache.contains_key(&split)
    }

    /// Returns the records of a split, reading the file only on the first call.
    pub fn load_split(&mut self, split: Split) -> Result<&[Record]> {
        let path = self.split_path(split);
        match self.cache.entry(split) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let records = load_records(&path)?;
                info!(%split, records = records.len(), "loaded split");
                Ok(entry.insert(records).as_slice())
            }
        }
    }

    /// Loads every split. Fails on the first missing one.
    pub fn load_all(&mut self) -> Result<Vec<(Split, &[Record])>> {
        for split in all::<Split>() {
            self.load_split(split)?;
        }
        Ok(all::<Split>()
            .filter_map(|split| self.cache.get(&split).map(|r| (split, r.as_slice())))
            .collect())
    }
}
