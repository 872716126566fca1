//! Document saving.
//!
//! Saving serializes the document, then writes it atomically (temp file
//! then rename), optionally keeping a `.bak` copy of the previous file and
//! optionally gzip-compressing the output.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use super::LoadedDocument;
use crate::config::Config;
use crate::json::serialize_node;
use crate::xml::serialize_document as serialize_xml;

/// Serializes a document the way [`save_document`] writes it.
///
/// # Errors
///
/// Fails for an XML document without a root element, or if the JSON
/// produced does not parse back.
pub fn serialize_document(document: &LoadedDocument, config: &Config) -> Result<String> {
    match document {
        LoadedDocument::Json(tree) => {
            let mut json_str = serialize_node(tree.root(), config.indent_size, 0);
            json_str.push('\n');

            // Raw values are emitted verbatim, so check the result
            serde_json::from_str::<serde_json::Value>(&json_str)
                .context("Generated invalid JSON")?;
            Ok(json_str)
        }
        LoadedDocument::Xml(doc) => {
            serialize_xml(doc, config.indent_size).context("Failed to serialize XML")
        }
    }
}

/// Saves a document to a file.
///
/// Output is gzip-compressed when the target ends in `.gz` or
/// `compress_output` is set.
///
/// # Examples
///
/// ```no_run
/// use fieldquill::config::Config;
/// use fieldquill::file::{DocumentFormat, LoadedDocument};
/// use fieldquill::file::saver::save_document;
///
/// let config = Config::default();
/// let doc = LoadedDocument::empty(DocumentFormat::Json, &config);
/// save_document("output.json", &doc, &config).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Serialization fails
/// - Backup creation fails (if requested)
/// - Writing or renaming the temp file fails
pub fn save_document<P: AsRef<Path>>(path: P, document: &LoadedDocument, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let should_compress = config.compress_output || path.to_string_lossy().ends_with(".gz");

    let content = serialize_document(document, config)?;

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    write_file_atomic(path, content.as_bytes(), should_compress)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), compressed = should_compress, "saved document");
    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
///
/// # Errors
///
/// Returns an error if:
/// - Creating the temp file fails
/// - Writing or compressing fails
/// - Renaming the temp file fails
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}
