use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hierarchy::ClassificationRecord;
use crate::spectrum::{peaks_from_pairs, Peak};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },
}

/// Row shape of the stored table. Field names follow the table's columns.
#[derive(Deserialize)]
struct RawCompound {
    name: String,
    #[serde(rename = "SMILES", default)]
    smiles: String,
    #[serde(rename = "molFile", default)]
    mol_file: String,
    #[serde(default)]
    parsed_spectrum: Vec<(f64, f64)>,
    #[serde(default)]
    classification: Vec<RawClassification>,
}

#[derive(Deserialize)]
struct RawClassification {
    name: String,
    value: String,
}

#[derive(Debug, Clone)]
pub struct Compound {
    pub name: String,
    pub smiles: String,
    pub mol_file: String,
    pub spectrum: Vec<Peak>,
    pub classification: Vec<ClassificationRecord>,
}

/// The loaded table. Built once at startup, immutable afterwards, shared
/// by reference through the server state.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub compounds: Vec<Compound>,
}

static SMILES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9@+\[\]()=#$%:/\\.*~-]+$").expect("SMILES charset pattern")
});

impl Dataset {
    pub fn from_json(text: &str) -> Result<Dataset, serde_json::Error> {
        let raw: Vec<RawCompound> = serde_json::from_str(text)?;
        let compounds = raw
            .into_iter()
            .enumerate()
            .map(|(i, row)| validate_compound(i + 1, row))
            .collect();
        Ok(Dataset { compounds })
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    /// Clamps a 1-based row selection into the table's valid range.
    pub fn clamp_row(&self, requested: usize) -> usize {
        requested.clamp(1, self.len().max(1))
    }

    /// 1-based row lookup.
    pub fn get(&self, row: usize) -> Option<&Compound> {
        row.checked_sub(1).and_then(|i| self.compounds.get(i))
    }
}

fn validate_compound(row: usize, raw: RawCompound) -> Compound {
    let smiles = if raw.smiles.is_empty() || SMILES_RE.is_match(&raw.smiles) {
        raw.smiles
    } else {
        log::warn!("row {row} ({}): dropping malformed SMILES", raw.name);
        String::new()
    };
    let classification = raw
        .classification
        .iter()
        .map(|c| ClassificationRecord::new(&c.name, &c.value))
        .collect();
    Compound {
        name: raw.name,
        smiles,
        mol_file: raw.mol_file,
        spectrum: peaks_from_pairs(&raw.parsed_spectrum),
        classification,
    }
}

/// Loads the table from a local path, or from an `http(s)` URL via a
/// one-time download into `data/cache/`.
pub async fn load(source: &str) -> Result<Dataset, DatasetError> {
    let path = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_to_cache(source).await?
    } else {
        PathBuf::from(source)
    };
    load_file(&path)
}

fn load_file(path: &Path) -> Result<Dataset, DatasetError> {
    let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Dataset::from_json(&text).map_err(|source| DatasetError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

async fn fetch_to_cache(url: &str) -> Result<PathBuf, DatasetError> {
    let cache_dir = PathBuf::from("data").join("cache");
    fs::create_dir_all(&cache_dir).map_err(|source| DatasetError::Io {
        path: cache_dir.clone(),
        source,
    })?;

    let filename = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("dataset.json");
    let local_path = cache_dir.join(filename);
    if !local_path.exists() {
        let fetch_err = |source| DatasetError::Fetch {
            url: url.to_string(),
            source,
        };
        let bytes = reqwest::get(url)
            .await
            .map_err(fetch_err)?
            .bytes()
            .await
            .map_err(fetch_err)?;
        fs::write(&local_path, &bytes).map_err(|source| DatasetError::Io {
            path: local_path.clone(),
            source,
        })?;
        log::info!("cached {url} as {}", local_path.display());
    }
    Ok(local_path)
}
