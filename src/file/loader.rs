//! Document loading.
//!
//! Files are parsed according to their extension (`.json`, `.xml`, either
//! optionally followed by `.gz`); anything else, and stdin, is sniffed.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

use super::{DocumentFormat, LoadedDocument};
use crate::config::Config;
use crate::json::parse_json_with;
use crate::xml::parse_xml_with;

/// Loads and parses a document from the filesystem.
///
/// # Examples
///
/// ```no_run
/// use fieldquill::config::Config;
/// use fieldquill::file::loader::load_document;
///
/// let doc = load_document("orders.xml", &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read or decompressed
/// - The contents are not a valid document of the detected format
pub fn load_document<P: AsRef<Path>>(path: P, config: &Config) -> Result<LoadedDocument> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read file: {}", path_ref.display()))?
    };

    let format = DocumentFormat::from_path(path_ref).unwrap_or_else(|| DocumentFormat::sniff(&content));
    tracing::debug!(path = %path_ref.display(), ?format, gzipped = is_gzipped, "loading document");
    parse_document(&content, format, config)
        .with_context(|| format!("Failed to load {}", path_ref.display()))
}

/// Loads and parses a document from standard input.
///
/// Gzip input is recognized by its magic bytes; the format is sniffed.
///
/// # Errors
///
/// Fails if stdin cannot be read or does not hold a valid document.
pub fn load_document_from_stdin(config: &Config) -> Result<LoadedDocument> {
    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")?
    };

    parse_document(&content, DocumentFormat::sniff(&content), config)
        .context("Failed to parse document from stdin")
}

/// Parses document text in a known format.
///
/// # Errors
///
/// Returns the backend's parse error.
pub fn parse_document(content: &str, format: DocumentFormat, config: &Config) -> Result<LoadedDocument> {
    let document = match format {
        DocumentFormat::Json => LoadedDocument::Json(
            parse_json_with(content, config.json_options()).context("Failed to parse JSON")?,
        ),
        DocumentFormat::Xml => LoadedDocument::Xml(
            parse_xml_with(content, config.xml_namespaces.clone()).context("Failed to parse XML")?,
        ),
    };
    Ok(document)
}

/// Reads and decompresses a gzipped file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The file is not valid gzip format (corrupted)
/// - The decompressed content is not valid UTF-8
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

/// Decompresses gzip-encoded bytes to a UTF-8 string.
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path("a.json"), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path("dir/a.XML.gz"), Some(DocumentFormat::Xml));
        assert_eq!(DocumentFormat::from_path("a.txt"), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(DocumentFormat::sniff("  <?xml?><a/>"), DocumentFormat::Xml);
        assert_eq!(DocumentFormat::sniff("{\"a\": 1}"), DocumentFormat::Json);
    }

    #[test]
    fn test_read_gzipped_file() {
        let content = "<a>1</a>";
        let temp_file = NamedTempFile::new().unwrap();
        let gz_path = temp_file.path().with_extension("xml.gz");

        let file = fs::File::create(&gz_path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_gzipped_file(&gz_path).unwrap(), content);
        let doc = load_document(&gz_path, &Config::default()).unwrap();
        assert_eq!(doc.format(), DocumentFormat::Xml);
    }

    #[test]
    fn test_read_gzipped_file_corrupted() {
        let temp_file = NamedTempFile::new().unwrap();
        let gz_path = temp_file.path().with_extension("json.gz");
        fs::write(&gz_path, b"not gzip data").unwrap();

        let err_msg = read_gzipped_file(&gz_path).unwrap_err().to_string();
        assert!(err_msg.contains("decompress") || err_msg.contains("corrupted"));
    }

    #[test]
    fn test_decompress_gzip_bytes() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{}").unwrap();
        let bytes = encoder.finish().unwrap();
        assert_eq!(decompress_gzip_bytes(&bytes).unwrap(), "{}");
    }
}
