//! Stage files and preprocessing.
//!
//! Documents and chunks travel between pipeline steps as pretty-printed JSON
//! arrays. A directory of `.txt` files can stand in for the documents file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Collapses every whitespace run to a single space and trims both ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_documents(documents: &mut [Document]) {
    for doc in documents.iter_mut() {
        doc.raw_text = normalize_text(&doc.raw_text);
    }
}

pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let documents: Vec<Document> = read_json(path)?;
    info!(path = %path.display(), documents = documents.len(), "loaded documents");
    Ok(documents)
}

pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let chunks: Vec<Chunk> = read_json(path)?;
    info!(path = %path.display(), chunks = chunks.len(), "loaded chunks");
    Ok(chunks)
}

/// Reads every `.txt` file under `root` as one document keyed by its path.
/// Unreadable files are logged and skipped; non-UTF-8 bytes are replaced.
pub fn load_txt_documents(root: &Path) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!("text directory {}", root.display())));
    }
    let mut documents = Vec::new();
    for path in list_txt_files(root) {
        match read_text_lossy(&path) {
            Ok(raw_text) => documents.push(Document::new(path.to_string_lossy(), raw_text)),
            Err(e) => warn!(kind = e.kind(), error = %e, "skipping unreadable source"),
        }
    }
    info!(root = %root.display(), documents = documents.len(), "loaded text documents");
    Ok(documents)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&body)?)
}

fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::Acquisition {
        source_id: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
