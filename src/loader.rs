//! Loads pre-extracted report text from the data directory.
//!
//! Each document is a `.txt` file holding the text of one report with pages
//! separated by form feeds, the layout `pdftotext` produces. The file stem
//! becomes the document name.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::config::DocumentsConfig;
use crate::error::IngestError;
use crate::types::Partition;

const PAGE_SEPARATOR: char = '\u{c}';
const DOCUMENT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub document: String,
    pub partition: Partition,
    /// 1-based position in the source document
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub name: String,
    pub path: PathBuf,
    pub partition: Partition,
    pub total_pages: usize,
    /// Non-blank pages only
    pub pages: Vec<Page>,
}

/// Document files in `data_dir`, sorted by name.
///
/// Fails before anything is read when the directory is missing or holds fewer
/// than two documents.
pub fn discover_documents(data_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !data_dir.is_dir() {
        return Err(IngestError::MissingDataDir {
            path: data_dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        })
        .collect();
    files.sort();

    if files.len() < 2 {
        return Err(IngestError::InsufficientDocuments {
            path: data_dir.to_path_buf(),
            found: files.len(),
        });
    }

    Ok(files)
}

pub fn classify_document(name: &str, documents: &DocumentsConfig) -> Partition {
    if name == documents.midyear_doc_name {
        Partition::Midyear
    } else if name == documents.forecast_doc_name {
        Partition::Forecast
    } else {
        Partition::classify(name)
    }
}

pub fn load_document(path: &Path, documents: &DocumentsConfig) -> Result<LoadedDocument> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid document file name: {}", path.display()))?
        .to_string();
    let partition = classify_document(&name, documents);

    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let pages = split_pages(&name, partition, &content);
    let total_pages = content.split(PAGE_SEPARATOR).count();

    info!(
        document = %name,
        doc_type = %partition,
        pages = pages.len(),
        "loaded document"
    );

    Ok(LoadedDocument {
        name,
        path: path.to_path_buf(),
        partition,
        total_pages,
        pages,
    })
}

pub fn load_documents(data_dir: &Path, documents: &DocumentsConfig) -> Result<Vec<LoadedDocument>> {
    let files = discover_documents(data_dir)?;
    info!(count = files.len(), dir = %data_dir.display(), "found documents");
    files
        .iter()
        .map(|path| load_document(path, documents))
        .collect()
}

fn split_pages(document: &str, partition: Partition, content: &str) -> Vec<Page> {
    content
        .split(PAGE_SEPARATOR)
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| Page {
            document: document.to_string(),
            partition,
            number: idx + 1,
            text: text.to_string(),
        })
        .collect()
}
