use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;

use crate::mr::Record;

/// The regular files directly inside `dir`, in name order, one record each:
/// key is the file's position, the single value its path.
pub async fn dir_records(dir: impl AsRef<Path>) -> Result<Vec<Record>, anyhow::Error> {
    let files = list_files(dir.as_ref()).await?;
    Ok(into_records(files))
}

/// Like [`dir_records`] over explicit paths; directories are expanded in place.
pub async fn path_records<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Record>, anyhow::Error> {
    let mut files = vec![];
    for path in paths {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        if meta.is_dir() {
            files.extend(list_files(path).await?);
        } else {
            files.push(path.to_path_buf());
        }
    }
    Ok(into_records(files))
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    let entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading directory {}", dir.display()))?;
    let mut entries = ReadDirStream::new(entries);

    let mut files = vec![];
    while let Some(entry) = entries.next().await {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    log::debug!("{} input files in {}", files.len(), dir.display());
    Ok(files)
}

fn into_records(files: Vec<PathBuf>) -> Vec<Record> {
    files
        .into_iter()
        .enumerate()
        .map(|(i, path)| Record::single(i.to_string(), path.to_string_lossy()))
        .collect()
}
