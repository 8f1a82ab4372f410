//! Store location helpers.

use std::path::{Path, PathBuf};

/// Get the SQLite index path for a collection.
pub fn get_index_path(data_dir: &Path, collection: &str) -> PathBuf {
    data_dir.join(format!("{}.sqlite", collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_path() {
        let path = get_index_path(Path::new("./db"), "docs");
        assert_eq!(path, PathBuf::from("./db/docs.sqlite"));
    }
}
