use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldquill::audit::{Audit, AUDIT_TARGET};
use fieldquill::config::Config;
use fieldquill::field::{FieldType, FieldValue, ReadField, ReadResult, Value};
use fieldquill::file::loader::{load_document, load_document_from_stdin};
use fieldquill::file::saver::{save_document, serialize_document};
use fieldquill::file::{DocumentFormat, LoadedDocument};
use fieldquill::mapping::{apply_mappings, load_mappings, FieldMapping, MappingReport};
use fieldquill::reader::DocumentReader;
use fieldquill::tree::TreeBackend;
use fieldquill::writer::{DocumentWriter, WriteOutcome, WriterOptions};

/// fieldquill - read and write document fields by path
#[derive(Parser)]
#[command(name = "fieldquill")]
#[command(version)]
#[command(about = "Read, write and map JSON/XML fields by path", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/fieldquill/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the value(s) at a path
    Read {
        /// Document to read ("-" for stdin)
        file: String,
        /// Field path, e.g. /orders[]/id
        path: String,
        /// Parse textual leaves as this type
        #[arg(short = 't', long = "type")]
        field_type: Option<FieldType>,
    },
    /// Set the value at a path, creating structure as needed
    Write {
        /// Document to modify (created if missing)
        file: PathBuf,
        /// Field path, e.g. /orders[4]/address/addressLine1
        path: String,
        /// Value text
        value: String,
        /// Field type to write the value as
        #[arg(short = 't', long = "type")]
        field_type: Option<FieldType>,
        /// Write here instead of overwriting FILE ("-" for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Apply a mapping file from a source document to a target document
    Map {
        /// Source document ("-" for stdin)
        source: String,
        /// Target document (created if missing)
        target: PathBuf,
        /// TOML file with [[mapping]] tables
        mappings: PathBuf,
        /// Write here instead of overwriting TARGET ("-" for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn init_tracing(config: &Config) {
    // Audits are reported by the CLI itself, keep them out of the log.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},{}=off", config.log_level, AUDIT_TARGET))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                return ExitCode::FAILURE;
            }
        },
        None => Config::load(),
    };
    init_tracing(&config);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Read {
            file,
            path,
            field_type,
        } => {
            let document = load_source(&file, config)?;
            let (result, audits) = match &document {
                LoadedDocument::Json(tree) => read_field(&file, tree, &path, field_type)?,
                LoadedDocument::Xml(doc) => read_field(&file, doc, &path, field_type)?,
            };
            print_audits(&audits);
            print_result(&path, &result);
            Ok(())
        }
        Command::Write {
            file,
            path,
            value,
            field_type,
            output,
        } => {
            let mut document = load_target(&file, None, config)?;
            let value = match field_type {
                Some(field_type) => FieldValue::typed(field_type, Some(Value::String(value))),
                None => FieldValue::string(value),
            };
            let doc_id = file.display().to_string();
            let options = config.writer_options();
            let (outcome, audits) = match &mut document {
                LoadedDocument::Json(tree) => write_field(&doc_id, tree, &path, value, options)?,
                LoadedDocument::Xml(doc) => write_field(&doc_id, doc, &path, value, options)?,
            };
            print_audits(&audits);
            if outcome == WriteOutcome::Written {
                store(&document, &file, output.as_deref(), config)?;
            } else {
                eprintln!("{}: nothing written ({:?})", path, outcome);
            }
            Ok(())
        }
        Command::Map {
            source,
            target,
            mappings,
            output,
        } => {
            let mappings = load_mappings(&mappings)?;
            let source_doc = load_source(&source, config)?;
            let mut target_doc = load_target(&target, Some(source_doc.format()), config)?;
            let target_id = target.display().to_string();
            let options = config.writer_options();

            let (report, audits) = match (&source_doc, &mut target_doc) {
                (LoadedDocument::Json(s), LoadedDocument::Json(t)) => {
                    map_documents(&source, s, &target_id, t, &mappings, options)
                }
                (LoadedDocument::Json(s), LoadedDocument::Xml(t)) => {
                    map_documents(&source, s, &target_id, t, &mappings, options)
                }
                (LoadedDocument::Xml(s), LoadedDocument::Json(t)) => {
                    map_documents(&source, s, &target_id, t, &mappings, options)
                }
                (LoadedDocument::Xml(s), LoadedDocument::Xml(t)) => {
                    map_documents(&source, s, &target_id, t, &mappings, options)
                }
            };
            print_audits(&audits);
            eprintln!(
                "{} written, {} skipped, {} abandoned, {} not found",
                report.fields_written, report.fields_skipped, report.fields_abandoned, report.not_found
            );
            store(&target_doc, &target, output.as_deref(), config)?;

            if let Some((mapping, err)) = report.errors.first() {
                anyhow::bail!(
                    "{} mapping(s) failed, first: {} -> {}: {}",
                    report.errors.len(),
                    mapping.input,
                    mapping.output,
                    err
                );
            }
            Ok(())
        }
    }
}

fn load_source(file: &str, config: &Config) -> Result<LoadedDocument> {
    if file == "-" {
        load_document_from_stdin(config)
    } else {
        load_document(file, config)
    }
}

/// Loads an existing target, or starts an empty one in the format its name
/// suggests.
fn load_target(
    file: &Path,
    fallback: Option<DocumentFormat>,
    config: &Config,
) -> Result<LoadedDocument> {
    if file.exists() {
        return load_document(file, config);
    }
    let format = DocumentFormat::from_path(file)
        .or(fallback)
        .unwrap_or(DocumentFormat::Json);
    tracing::debug!(path = %file.display(), ?format, "starting new document");
    Ok(LoadedDocument::empty(format, config))
}

fn store(document: &LoadedDocument, file: &Path, output: Option<&str>, config: &Config) -> Result<()> {
    match output {
        Some("-") => {
            let content = serialize_document(document, config)?;
            print!("{}", content);
            Ok(())
        }
        Some(path) => save_document(path, document, config)
            .with_context(|| format!("Failed to save {}", path)),
        None => save_document(file, document, config)
            .with_context(|| format!("Failed to save {}", file.display())),
    }
}

fn read_field<B: TreeBackend>(
    doc_id: &str,
    backend: &B,
    path: &str,
    field_type: Option<FieldType>,
) -> Result<(ReadResult, Vec<Audit>)> {
    let mut reader = DocumentReader::new(doc_id, backend);
    let result = match field_type {
        Some(field_type) => reader.read_typed(path, field_type)?,
        None => reader.read(path)?,
    };
    Ok((result, reader.into_audits().into_entries()))
}

fn write_field<B: TreeBackend>(
    doc_id: &str,
    backend: &mut B,
    path: &str,
    value: FieldValue,
    options: WriterOptions,
) -> Result<(WriteOutcome, Vec<Audit>)> {
    let mut writer = DocumentWriter::new(doc_id, backend).with_options(options);
    let outcome = writer.write(path, value)?;
    Ok((outcome, writer.into_audits().into_entries()))
}

fn map_documents<S: TreeBackend, T: TreeBackend>(
    source_id: &str,
    source: &S,
    target_id: &str,
    target: &mut T,
    mappings: &[FieldMapping],
    options: WriterOptions,
) -> (MappingReport, Vec<Audit>) {
    let mut reader = DocumentReader::new(source_id, source);
    let mut writer = DocumentWriter::new(target_id, target).with_options(options);
    let report = apply_mappings(&mut reader, &mut writer, mappings);

    let mut audits = reader.into_audits().into_entries();
    audits.extend(writer.into_audits().into_entries());
    (report, audits)
}

fn print_audits(audits: &[Audit]) {
    for audit in audits {
        eprintln!("{}", audit);
    }
}

fn print_result(path: &str, result: &ReadResult) {
    match result {
        ReadResult::Field(field) => print_field(field),
        ReadResult::Group(group) => group.iter().for_each(print_field),
        ReadResult::NotFound => eprintln!("{}: not found", path),
    }
}

fn print_field(field: &ReadField) {
    let field_type = field
        .value
        .field_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let value = field
        .value
        .value
        .as_ref()
        .map(Value::to_text)
        .unwrap_or_else(|| "null".to_string());
    println!("{}\t{}\t{}", field.path, field_type, value);
}
