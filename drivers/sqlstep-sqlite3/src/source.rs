//!
//! SQL script loading.
//!
//! Scripts are plain `.sql` files. A directory of scripts is read one level
//! deep and ordered by file name, so `001_schema.sql` runs before
//! `002_seed.sql`.
//!

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DatabaseError;

pub fn read_sql_file(path: &Path) -> Result<String, DatabaseError> {
    std::fs::read_to_string(path).map_err(|source| DatabaseError::ReadSql {
        path: path.to_path_buf(),
        source,
    })
}

/// Paths of the `.sql` files directly inside `dir`, sorted by file name.
pub fn read_sql_dir(dir: &Path) -> Result<Vec<PathBuf>, DatabaseError> {
    let mut scripts = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| DatabaseError::ScanSql {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            scripts.push(path.to_path_buf());
        }
    }
    Ok(scripts)
}
