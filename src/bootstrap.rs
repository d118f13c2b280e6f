//! One-time seeding of the content store from JSON files.
//!
//! A bootstrap directory may hold `fragments.json`, `memes.json` and
//! `laws.json`, each a JSON array of objects. Every file is optional. A
//! collection is only loaded while it holds no records, so running bootstrap
//! against an already seeded store does nothing.
//!
//! ```text
//! fragments.json  [{"text": "...", "kind": "CAUSE", "role": "DEV"}, {"axiom": "..."}]
//! memes.json      [{"author": "...", "quote": "..."}, {"text": "..."}]
//! laws.json       [{"name": "...", "description": "...", "category": "..."}, {"text": "..."}]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::role::Role;
use crate::store::ContentStore;
use crate::types::{FragmentKind, NewFragment, NewLaw, NewMeme};

/// File holding fragment rows.
pub const FRAGMENTS_FILE: &str = "fragments.json";
/// File holding meme rows.
pub const MEMES_FILE: &str = "memes.json";
/// File holding law rows.
pub const LAWS_FILE: &str = "laws.json";

/// Kind for fragment rows without one.
pub const DEFAULT_FRAGMENT_KIND: FragmentKind = FragmentKind::Context;
/// Author for meme rows without one.
pub const DEFAULT_MEME_AUTHOR: &str = "Anon";
/// Category for law rows without one.
pub const DEFAULT_LAW_CATEGORY: &str = "Murphy";

/// Error type for bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// A data file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A data file is not a JSON array of objects.
    #[error("Failed to parse {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl BootstrapError {
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Fragments inserted.
    pub fragments: usize,
    /// Memes inserted.
    pub memes: usize,
    /// Laws inserted.
    pub laws: usize,
    /// Rows dropped because they did not decode or failed validation.
    pub skipped: usize,
}

impl BootstrapReport {
    /// Total records inserted.
    pub fn inserted(&self) -> usize {
        self.fragments + self.memes + self.laws
    }
}

// Alternate text fields are separate so a row may carry both; the primary
// name wins. A row with neither gets empty text and fails validation.

#[derive(Debug, Deserialize)]
struct FragmentRow {
    text: Option<String>,
    axiom: Option<String>,
    kind: Option<String>,
    role: Option<String>,
}

impl FragmentRow {
    fn text(&mut self) -> String {
        self.text.take().or_else(|| self.axiom.take()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct MemeRow {
    author: Option<String>,
    quote: Option<String>,
    text: Option<String>,
}

impl MemeRow {
    fn quote(&mut self) -> String {
        self.quote.take().or_else(|| self.text.take()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct LawRow {
    name: Option<String>,
    description: Option<String>,
    text: Option<String>,
    category: Option<String>,
}

impl LawRow {
    fn description(&mut self) -> String {
        self.description.take().or_else(|| self.text.take()).unwrap_or_default()
    }
}

/// Seed the store from the JSON files in `dir`.
///
/// Each collection is handled on its own: a non-empty collection is left
/// untouched even when the others get loaded.
pub async fn seed_from_dir<S>(store: &S, dir: impl AsRef<Path>) -> Result<BootstrapReport, BootstrapError>
where
    S: ContentStore,
{
    let dir = dir.as_ref();
    let mut report = BootstrapReport::default();
    let (fragments, memes, laws) = store.content_counts().await.map_err(BootstrapError::from_store)?;

    if fragments == 0 {
        if let Some(rows) = read_rows::<FragmentRow>(&dir.join(FRAGMENTS_FILE), &mut report)? {
            load_fragments(store, rows, &mut report).await?;
        }
    }
    if memes == 0 {
        if let Some(rows) = read_rows::<MemeRow>(&dir.join(MEMES_FILE), &mut report)? {
            load_memes(store, rows, &mut report).await?;
        }
    }
    if laws == 0 {
        if let Some(rows) = read_rows::<LawRow>(&dir.join(LAWS_FILE), &mut report)? {
            load_laws(store, rows, &mut report).await?;
        }
    }

    info!(
        dir = %dir.display(),
        fragments = report.fragments,
        memes = report.memes,
        laws = report.laws,
        skipped = report.skipped,
        "Bootstrap finished"
    );
    Ok(report)
}

/// Read a file as a JSON array and decode each element on its own.
///
/// Only a missing file, an unreadable file or a non-array document is an
/// error. Elements that do not decode are counted as skipped.
fn read_rows<T: serde::de::DeserializeOwned>(
    path: &Path,
    report: &mut BootstrapReport,
) -> Result<Option<Vec<(usize, T)>>, BootstrapError> {
    if !path.exists() {
        info!(path = %path.display(), "Bootstrap file not found, skipping");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|source| BootstrapError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(row) => rows.push((i, row)),
            Err(e) => {
                warn!(path = %path.display(), row = i, error = %e, "Skipping undecodable row");
                report.skipped += 1;
            }
        }
    }
    Ok(Some(rows))
}

async fn load_fragments<S: ContentStore>(
    store: &S,
    rows: Vec<(usize, FragmentRow)>,
    report: &mut BootstrapReport,
) -> Result<(), BootstrapError> {
    for (i, mut row) in rows {
        let kind = match row.kind.as_deref() {
            None => DEFAULT_FRAGMENT_KIND,
            Some(token) => match FragmentKind::from_str(token) {
                Some(kind) => kind,
                None => {
                    warn!(row = i, kind = token, "Skipping fragment with unknown kind");
                    report.skipped += 1;
                    continue;
                }
            },
        };
        let role = match row.role.as_deref() {
            None => None,
            Some(token) => match Role::from_str(token) {
                Some(role) => Some(role),
                None => {
                    warn!(row = i, role = token, "Skipping fragment with unknown role");
                    report.skipped += 1;
                    continue;
                }
            },
        };

        match (NewFragment { kind, text: row.text(), role }).validate() {
            Ok(fragment) => {
                store.put_fragment(&fragment).await.map_err(BootstrapError::from_store)?;
                report.fragments += 1;
            }
            Err(e) => {
                warn!(row = i, error = %e, "Skipping invalid fragment");
                report.skipped += 1;
            }
        }
    }
    Ok(())
}

async fn load_memes<S: ContentStore>(
    store: &S,
    rows: Vec<(usize, MemeRow)>,
    report: &mut BootstrapReport,
) -> Result<(), BootstrapError> {
    for (i, mut row) in rows {
        let input = NewMeme {
            quote: row.quote(),
            author: row.author.unwrap_or_else(|| DEFAULT_MEME_AUTHOR.to_string()),
        };
        match input.validate() {
            Ok(meme) => {
                store.put_meme(&meme).await.map_err(BootstrapError::from_store)?;
                report.memes += 1;
            }
            Err(e) => {
                warn!(row = i, error = %e, "Skipping invalid meme");
                report.skipped += 1;
            }
        }
    }
    Ok(())
}

async fn load_laws<S: ContentStore>(
    store: &S,
    rows: Vec<(usize, LawRow)>,
    report: &mut BootstrapReport,
) -> Result<(), BootstrapError> {
    for (i, mut row) in rows {
        let description = row.description();
        let category = row.category.unwrap_or_else(|| DEFAULT_LAW_CATEGORY.to_string());
        let input = NewLaw {
            name: row.name.unwrap_or_else(|| format!("{} Law", category)),
            description,
            category,
        };
        match input.validate() {
            Ok(law) => {
                store.put_law(&law).await.map_err(BootstrapError::from_store)?;
                report.laws += 1;
            }
            Err(e) => {
                warn!(row = i, error = %e, "Skipping invalid law");
                report.skipped += 1;
            }
        }
    }
    Ok(())
}
