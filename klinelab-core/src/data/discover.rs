//! Locate the monthly CSV files of a pair folder.

use super::provider::DataError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the `*.csv` files directly inside `folder`, in lexicographic order.
///
/// Matching follows shell wildcard rules: the extension must be exactly
/// `csv` and hidden files (leading `.`) are not matched. A folder that
/// cannot be read matches nothing, so it yields the same
/// [`DataError::NoCsvFiles`] as an empty one.
pub fn find_csv_files(folder: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(folder = %folder.display(), error = %e, "price folder not readable");
            return Err(DataError::NoCsvFiles {
                folder: folder.to_path_buf(),
            });
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_csv_match(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(DataError::NoCsvFiles {
            folder: folder.to_path_buf(),
        });
    }

    debug!(folder = %folder.display(), count = files.len(), "found price files");
    Ok(files)
}

fn is_csv_match(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| !name.starts_with('.'));
    visible && path.is_file() && path.extension().is_some_and(|ext| ext == "csv")
}
