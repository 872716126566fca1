//! File I/O for source and target documents.
//!
//! Documents are loaded from files or stdin (gzip detected by extension or
//! magic bytes) and saved back with atomic writes and optional backups.

pub mod loader;
pub mod saver;

use std::path::Path;

use crate::config::Config;
use crate::json::JsonTree;
use crate::xml::XmlDocument;

/// On-disk document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Xml,
}

impl DocumentFormat {
    /// Determines the format from a file name, looking past a `.gz` suffix.
    ///
    /// - `data.json` → JSON
    /// - `data.xml.gz` → XML
    /// - `data.txt` → unknown
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path_str = path.as_ref().to_string_lossy().to_lowercase();
        let base = path_str.strip_suffix(".gz").unwrap_or(&path_str);

        if base.ends_with(".json") {
            Some(DocumentFormat::Json)
        } else if base.ends_with(".xml") {
            Some(DocumentFormat::Xml)
        } else {
            None
        }
    }

    /// Guesses the format from content: markup starts with `<`.
    pub fn sniff(content: &str) -> Self {
        let content = content.trim_start_matches('\u{feff}').trim_start();
        if content.starts_with('<') {
            DocumentFormat::Xml
        } else {
            DocumentFormat::Json
        }
    }
}

/// A loaded document of either format.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedDocument {
    Json(JsonTree),
    Xml(XmlDocument),
}

impl LoadedDocument {
    /// An empty document to write into: `{}` for JSON, no root element
    /// for XML.
    pub fn empty(format: DocumentFormat, config: &Config) -> Self {
        match format {
            DocumentFormat::Json => LoadedDocument::Json(JsonTree::empty()),
            DocumentFormat::Xml => LoadedDocument::Xml(
                XmlDocument::new().with_namespaces(config.xml_namespaces.clone()),
            ),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            LoadedDocument::Json(_) => DocumentFormat::Json,
            LoadedDocument::Xml(_) => DocumentFormat::Xml,
        }
    }
}
