//! Dataset loading from a local data directory
//!
//! Datasets live at `<root>/<id>/<id>.yaml`. A flat layout `<root>/<id>.yaml`
//! is accepted as a fallback. Batch loading runs on a fixed number of scoped
//! worker threads and yields one independent result per requested id, so a
//! single malformed file never aborts the rest of the batch.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
    thread,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{document::DatasetError, model::Dataset};

/// Extension of dataset files.
const EXTENSION: &str = "yaml";

/// Error returned when a dataset cannot be loaded from disk.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("dataset '{dataset_id}' not found under {}", root.display())]
    NotFound { dataset_id: String, root: PathBuf },
    #[display("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to load {}: {source}", path.display())]
    Dataset { path: PathBuf, source: DatasetError },
}

/// Resolves the file of dataset `dataset_id` under `root`.
///
/// Returns `None` if neither `<root>/<id>/<id>.yaml` nor `<root>/<id>.yaml` exists.
#[must_use]
pub fn dataset_path(root: &Path, dataset_id: &str) -> Option<PathBuf> {
    let nested = root
        .join(dataset_id)
        .join(dataset_id)
        .with_extension(EXTENSION);
    if nested.is_file() {
        return Some(nested);
    }
    let flat = root.join(dataset_id).with_extension(EXTENSION);
    flat.is_file().then_some(flat)
}

/// Loads, validates and normalizes one dataset.
pub fn load_dataset(root: &Path, dataset_id: &str) -> Result<Dataset, LoadError> {
    let path = dataset_path(root, dataset_id).ok_or_else(|| LoadError::NotFound {
        dataset_id: dataset_id.to_owned(),
        root: root.to_owned(),
    })?;
    load_dataset_file(&path, dataset_id)
}

/// Loads a dataset file at an explicit path.
pub fn load_dataset_file(path: &Path, dataset_id: &str) -> Result<Dataset, LoadError> {
    tracing::debug!(dataset_id, path = %path.display(), "loading dataset");
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    Dataset::from_yaml_str(dataset_id, &text).map_err(|source| LoadError::Dataset {
        path: path.to_owned(),
        source,
    })
}

/// Loads many datasets in parallel on `workers` scoped threads.
///
/// Results are returned in the order of `dataset_ids`, one per id. Failures
/// are logged and returned in place; they do not affect other datasets.
pub fn load_datasets(
    root: &Path,
    dataset_ids: &[String],
    workers: usize,
) -> Vec<Result<Dataset, LoadError>> {
    if dataset_ids.is_empty() {
        return vec![];
    }
    let chunk_size = dataset_ids.len().div_ceil(workers.max(1));
    tracing::debug!(
        count = dataset_ids.len(),
        workers = dataset_ids.len().div_ceil(chunk_size),
        "loading datasets"
    );

    thread::scope(|s| {
        let handles = dataset_ids
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|id| {
                            let result = load_dataset(root, id);
                            if let Err(e) = &result {
                                tracing::warn!(dataset_id = %id, "{e}");
                            }
                            result
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

/// Lists the ids of all datasets under `root`, sorted.
///
/// Both `<root>/*/*.yaml` and `<root>/*.yaml` are scanned. Files whose name
/// starts with a dot (such as `.schema.yaml`) are skipped.
pub fn list_dataset_ids(root: &Path) -> Result<Vec<String>, LoadError> {
    let mut ids = BTreeSet::new();
    for entry in read_dir(root)? {
        let path = entry.path();
        if path.is_dir() {
            for inner in read_dir(&path)? {
                if let Some(id) = dataset_file_stem(&inner.path()) {
                    ids.insert(id);
                }
            }
        } else if let Some(id) = dataset_file_stem(&path) {
            ids.insert(id);
        }
    }
    Ok(ids.into_iter().collect())
}

/// Lists the dataset files under `root`, sorted by path.
pub(crate) fn list_dataset_files(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = BTreeSet::new();
    for entry in read_dir(root)? {
        let path = entry.path();
        if path.is_dir() {
            for inner in read_dir(&path)? {
                let inner = inner.path();
                if dataset_file_stem(&inner).is_some() {
                    files.insert(inner);
                }
            }
        }
    }
    Ok(files.into_iter().collect())
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_owned(),
        source,
    };
    fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)
}

fn dataset_file_stem(path: &Path) -> Option<String> {
    if !path.is_file() || path.extension().is_none_or(|ext| ext != EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (!stem.is_empty() && !stem.starts_with('.')).then(|| stem.to_owned())
}

/// File-level facts about a loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetFileInfo {
    pub dataset_id: String,
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub participants: usize,
    pub analytes: usize,
    pub measurements: usize,
}

impl DatasetFileInfo {
    /// Loads dataset `dataset_id` and records facts about its file.
    pub fn collect(root: &Path, dataset_id: &str) -> Result<(Self, Dataset), LoadError> {
        let path = dataset_path(root, dataset_id).ok_or_else(|| LoadError::NotFound {
            dataset_id: dataset_id.to_owned(),
            root: root.to_owned(),
        })?;
        let metadata = fs::metadata(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let dataset = load_dataset_file(&path, dataset_id)?;
        let info = Self {
            dataset_id: dataset_id.to_owned(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            participants: dataset.participants.len(),
            analytes: dataset.analytes.len(),
            measurements: dataset.measurement_count(),
            path,
        };
        Ok((info, dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r"
title: Fixture study
doi: 10.1000/fixture
analyte:
  specimen: stool
  biomarker: SARS-CoV-2
  unit: gc/mL
  reference_event: symptom onset
participants:
  - measurements:
      - time: 1
        value: 100
      - time: 4
        value: negative
";

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_nested_and_flat() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "nested2020/nested2020.yaml", DATASET);
        write(dir.path(), "flat2021.yaml", DATASET);

        let nested = load_dataset(dir.path(), "nested2020").unwrap();
        assert_eq!(nested.dataset_id, "nested2020");
        assert_eq!(nested.title.as_deref(), Some("Fixture study"));
        assert!(nested.analytes.contains_key("nested2020"));

        let flat = load_dataset(dir.path(), "flat2021").unwrap();
        assert_eq!(flat.measurement_count(), 2);
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(dir.path(), "absent").unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/a.yaml", DATASET);
        write(dir.path(), "b/b.yaml", "participants: [");
        write(dir.path(), "c/c.yaml", DATASET);

        let ids = ["a", "b", "missing", "c"].map(String::from);
        let results = load_datasets(dir.path(), &ids, 3);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().dataset_id, "a");
        assert!(matches!(results[1], Err(LoadError::Dataset { .. })));
        assert!(matches!(results[2], Err(LoadError::NotFound { .. })));
        assert_eq!(results[3].as_ref().unwrap().dataset_id, "c");
    }

    #[test]
    fn test_batch_with_more_workers_than_ids() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/a.yaml", DATASET);
        let results = load_datasets(dir.path(), &["a".to_owned()], 16);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
        assert!(load_datasets(dir.path(), &[], 4).is_empty());
    }

    #[test]
    fn test_list_ids_skips_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".schema.yaml", "{}");
        write(dir.path(), "zeta/zeta.yaml", DATASET);
        write(dir.path(), "alpha/alpha.yaml", DATASET);
        write(dir.path(), "alpha/notes.txt", "ignored");

        let ids = list_dataset_ids(dir.path()).unwrap();
        assert_eq!(ids, ["alpha", "zeta"]);
    }

    #[test]
    fn test_file_info() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "info/info.yaml", DATASET);
        let (info, dataset) = DatasetFileInfo::collect(dir.path(), "info").unwrap();
        assert_eq!(info.participants, 1);
        assert_eq!(info.analytes, 1);
        assert_eq!(info.measurements, 2);
        assert_eq!(info.size, DATASET.len() as u64);
        assert!(info.modified.is_some());
        assert_eq!(dataset.dataset_id, "info");
    }
}
