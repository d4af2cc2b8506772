//! Signature database loading
//!
//! Sources are single JSON files or directory trees of them. Every source
//! of a load call is parsed and compiled before anything is merged, so a
//! failed load leaves the database untouched.

use super::LoadError;
use super::schema::SignatureSchema;
use crate::domain::entities::SignatureEntry;
use crate::domain::services::Database;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Definitions shipped inside the binary, as `(file name, JSON)` pairs
pub const BUILTIN_DEFINITIONS: &[(&str, &str)] =
    &[("windows.json", include_str!("../../../db/windows.json"))];

impl Database {
    /// The database compiled into the binary.
    ///
    /// Callers layer on-disk sources over it with `extend_from`.
    pub fn builtin() -> Result<Self, LoadError> {
        let mut staged = Vec::new();
        for (name, contents) in BUILTIN_DEFINITIONS {
            staged.extend(parse_definitions(Path::new(name), contents)?);
        }

        let mut db = Database::new();
        db.merge(staged);
        tracing::debug!("{} built-in signature definition(s)", db.len());
        Ok(db)
    }

    /// Loads a database from one file or directory.
    pub fn load(source: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::load_sources(&[source])
    }

    /// Loads several sources in order; later sources override earlier ones.
    pub fn load_sources<P: AsRef<Path>>(sources: &[P]) -> Result<Self, LoadError> {
        let mut db = Database::new();
        db.extend_from(sources)?;
        Ok(db)
    }

    /// Merges more sources into an existing database, all or nothing.
    ///
    /// Returns the number of definitions read.
    pub fn extend_from<P: AsRef<Path>>(&mut self, sources: &[P]) -> Result<usize, LoadError> {
        let mut staged: Vec<SignatureEntry> = Vec::new();
        for source in sources {
            staged.extend(read_source(source.as_ref())?);
        }

        let count = staged.len();
        self.merge(staged);
        tracing::info!(
            "Loaded {} signature definition(s) from {} source(s); {} entries total",
            count,
            sources.len(),
            self.len()
        );
        Ok(count)
    }
}

/// Reads one source: a JSON file, or every `*.json` below a directory.
pub fn read_source(source: &Path) -> Result<Vec<SignatureEntry>, LoadError> {
    let metadata = fs::metadata(source).map_err(|e| LoadError::io(source, e))?;

    if !metadata.is_dir() {
        return read_file(source);
    }

    let mut entries = Vec::new();
    for path in definition_files(source)? {
        entries.extend(read_file(&path)?);
    }
    Ok(entries)
}

/// `*.json` files under `dir`, in sorted path order.
pub fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let error = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            LoadError::io(&path, error)
        })?;

        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn read_file(path: &Path) -> Result<Vec<SignatureEntry>, LoadError> {
    let contents = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let entries = parse_definitions(path, &contents)?;
    tracing::debug!("{}: {} definition(s)", path.display(), entries.len());
    Ok(entries)
}

fn parse_definitions(path: &Path, contents: &str) -> Result<Vec<SignatureEntry>, LoadError> {
    SignatureSchema::from_json(contents)
        .and_then(|schema| schema.compile())
        .map_err(|e| e.in_file(path))
}
