use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::CrawlerError;

pub fn page_file_name(page_index: usize) -> String {
    format!("repos.{page_index}.json")
}

/// Writes the raw edges of page `page_index` to `output_dir/repos.{page_index}.json`,
/// replacing any previous file of that name.
pub fn write_page(
    output_dir: &Path,
    page_index: usize,
    edges: &[serde_json::Value],
) -> Result<PathBuf, CrawlerError> {
    let path = output_dir.join(page_file_name(page_index));
    let contents = serde_json::to_vec(edges)?;
    fs::write(&path, contents).map_err(|source| CrawlerError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
