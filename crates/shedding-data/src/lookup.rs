//! Lookup of publications in the curated corpus
//!
//! Answers "is this paper already curated?" by DOI or title. Only the header
//! of each dataset file is read, up to the first `analyte:`, `analytes:` or
//! `participants:` line, so the lookup stays cheap on large corpora.
//!
//! When no exact title matches, the closest title is scored with the
//! Ratcliff-Obershelp similarity `2·M / (|a| + |b|)`, where `M` counts the
//! characters of recursively found longest common blocks.

use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::loader::{self, LoadError};

/// Default minimum similarity for reporting a near match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

const HEADER_KEYS: [&str; 3] = ["title", "doi", "url"];
const STOP_KEYS: [&str; 3] = ["analyte:", "analytes:", "participants:"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LookupError {
    #[display("at least one of DOI or title must be specified")]
    NoQuery,
    #[display("data directory not found: {}", _0.display())]
    DataDirNotFound(#[error(not(source))] PathBuf),
    #[display("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("{_0}")]
    Load(LoadError),
}

/// Publication metadata read from the header of a dataset file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetHeader {
    pub dataset_id: String,
    pub title: String,
    pub doi: String,
    pub url: String,
}

impl DatasetHeader {
    /// DOI, or URL when the publication has no DOI.
    #[must_use]
    pub fn identifier(&self) -> &str {
        if self.doi.is_empty() { &self.url } else { &self.doi }
    }

    /// Parses the header lines of a dataset document.
    ///
    /// Indented lines continue the value of the preceding key, so folded
    /// titles spanning several lines are joined with single spaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use shedding_data::lookup::DatasetHeader;
    ///
    /// let text = "title: >-\n  Temporal dynamics\n  in viral shedding\ndoi: 10.1038/x\nanalytes:\n";
    /// let header = DatasetHeader::parse("he2020", text.lines());
    /// assert_eq!(header.title, "Temporal dynamics in viral shedding");
    /// assert_eq!(header.doi, "10.1038/x");
    /// ```
    pub fn parse<'a, I>(dataset_id: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut header = Self {
            dataset_id: dataset_id.to_owned(),
            ..Self::default()
        };
        let mut current: Option<&str> = None;

        for line in lines {
            if STOP_KEYS.iter().any(|key| line.starts_with(key)) {
                break;
            }
            if let Some((key, value)) = HEADER_KEYS.iter().find_map(|key| {
                line.strip_prefix(key)
                    .and_then(|rest| rest.strip_prefix(':'))
                    .map(|value| (*key, value))
            }) {
                let value = value.trim();
                let value = if value.starts_with(['>', '|']) {
                    ""
                } else {
                    unquote(value)
                };
                *header.field_mut(key) = value.to_owned();
                current = Some(key);
                continue;
            }
            match current {
                Some(key) if line.starts_with([' ', '\t']) => {
                    let field = header.field_mut(key);
                    if !field.is_empty() {
                        field.push(' ');
                    }
                    field.push_str(line.trim());
                }
                _ => current = None,
            }
        }
        header
    }

    /// Reads the header of the dataset file at `path`.
    pub fn read(path: &Path) -> Result<Self, LookupError> {
        let io_err = |source| LookupError::Io {
            path: path.to_owned(),
            source,
        };
        let file = fs::File::open(path).map_err(io_err)?;
        let mut lines = vec![];
        for line in BufReader::new(file).lines() {
            let line = line.map_err(io_err)?;
            if STOP_KEYS.iter().any(|key| line.starts_with(key)) {
                break;
            }
            lines.push(line);
        }
        let dataset_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Ok(Self::parse(dataset_id, lines.iter().map(String::as_str)))
    }

    fn field_mut(&mut self, key: &str) -> &mut String {
        match key {
            "title" => &mut self.title,
            "doi" => &mut self.doi,
            _ => &mut self.url,
        }
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Outcome of a corpus lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResult {
    /// Exact case-insensitive DOI or title match.
    Found { dataset_id: String },
    /// No exact match, but a title at least as similar as the threshold exists.
    Similar {
        dataset_id: String,
        title: String,
        identifier: String,
        ratio: f64,
    },
    NotFound,
}

impl LookupResult {
    /// Returns `true` only for an exact match.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Checks whether a publication is already curated under `root`.
///
/// DOI matches take precedence over title matches. A near match is reported
/// only when a title was given and no exact match exists.
pub fn check_dataset(
    root: &Path,
    doi: Option<&str>,
    title: Option<&str>,
    similarity_threshold: f64,
) -> Result<LookupResult, LookupError> {
    if doi.is_none() && title.is_none() {
        return Err(LookupError::NoQuery);
    }
    if !root.is_dir() {
        return Err(LookupError::DataDirNotFound(root.to_owned()));
    }

    let headers = loader::list_dataset_files(root)
        .map_err(LookupError::Load)?
        .iter()
        .map(|path| DatasetHeader::read(path))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = headers.len(), "scanned dataset headers");

    if let Some(doi) = doi {
        let doi = doi.trim().to_lowercase();
        if let Some(h) = headers
            .iter()
            .find(|h| !h.doi.is_empty() && h.doi.trim().to_lowercase() == doi)
        {
            return Ok(LookupResult::Found {
                dataset_id: h.dataset_id.clone(),
            });
        }
    }

    let Some(title) = title else {
        return Ok(LookupResult::NotFound);
    };
    let title = title.trim().to_lowercase();
    if let Some(h) = headers
        .iter()
        .find(|h| h.title.trim().to_lowercase() == title)
    {
        return Ok(LookupResult::Found {
            dataset_id: h.dataset_id.clone(),
        });
    }

    let mut best: Option<(&DatasetHeader, f64)> = None;
    for h in &headers {
        let ratio = similarity(&title, &h.title.trim().to_lowercase());
        if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
            best = Some((h, ratio));
        }
    }
    match best {
        Some((h, ratio)) if ratio > 0.0 && ratio >= similarity_threshold => {
            tracing::warn!(
                "no exact title match found, but a similar dataset exists: \"{}\" ({}), similarity: {ratio:.2}",
                h.title,
                h.identifier(),
            );
            Ok(LookupResult::Similar {
                dataset_id: h.dataset_id.clone(),
                title: h.title.clone(),
                identifier: h.identifier().to_owned(),
                ratio,
            })
        }
        _ => Ok(LookupResult::NotFound),
    }
}

/// Ratcliff-Obershelp similarity of two strings, in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use shedding_data::lookup::similarity;
///
/// assert_eq!(similarity("abcd", "bcde"), 0.75);
/// assert_eq!(similarity("", ""), 1.0);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Returns `(start_in_a, start_in_b, length)` of the earliest longest common block.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0; b.len() + 1];
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = curr[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}
