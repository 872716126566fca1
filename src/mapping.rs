//! Field mappings between two documents.
//!
//! A mapping names an input path in the source document and an output path
//! in the target. Applying a set reads each input and writes each value
//! out; when the input fans out into a group, each element is written to
//! the output path with the element's collection indices filled in.
//!
//! Mappings are plain data, usually loaded from TOML:
//!
//! ```toml
//! [[mapping]]
//! input = "/customer/lastName"
//! output = "/contact/surname"
//!
//! [[mapping]]
//! input = "/orders[]/total"
//! output = "/invoices<>/amount"
//! output_type = "decimal"
//! ```
//!
//! `input_type` and `output_type` parse textual values only. A source leaf
//! that is already numeric keeps its kind, so the mapping above suits
//! totals held as strings (`"10.50"`); a JSON number `10.5` reads as DOUBLE
//! and a DECIMAL output abandons it with an ERROR audit.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::field::{FieldType, FieldValue, ReadField, ReadResult};
use crate::path::PathExpression;
use crate::reader::DocumentReader;
use crate::tree::TreeBackend;
use crate::writer::{DocumentWriter, WriteOutcome};

/// One source-to-target field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub input: String,
    pub output: String,
    /// Type used to parse textual source leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<FieldType>,
    /// Type the target field is written as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<FieldType>,
}

impl FieldMapping {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            input_type: None,
            output_type: None,
        }
    }

    pub fn with_output_type(mut self, field_type: FieldType) -> Self {
        self.output_type = Some(field_type);
        self
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct MappingFile {
    #[serde(default)]
    mapping: Vec<FieldMapping>,
}

/// Parses `[[mapping]]` tables from TOML text.
///
/// # Errors
///
/// Returns the TOML error when the text does not describe mappings.
pub fn parse_mappings(content: &str) -> Result<Vec<FieldMapping>, toml::de::Error> {
    let file: MappingFile = toml::from_str(content)?;
    Ok(file.mapping)
}

/// Loads mappings from a TOML file.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_mappings(path: &Path) -> Result<Vec<FieldMapping>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    parse_mappings(&content)
        .with_context(|| format!("Failed to parse mapping file: {}", path.display()))
}

/// Counts of what happened while applying a mapping set.
#[derive(Debug, Default)]
pub struct MappingReport {
    pub fields_written: usize,
    pub fields_skipped: usize,
    pub fields_abandoned: usize,
    pub not_found: usize,
    /// Mappings whose paths could not be parsed, with the error.
    pub errors: Vec<(FieldMapping, FieldError)>,
}

impl MappingReport {
    pub fn is_clean(&self) -> bool {
        self.fields_abandoned == 0 && self.errors.is_empty()
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.fields_written += 1,
            WriteOutcome::Skipped => self.fields_skipped += 1,
            WriteOutcome::Abandoned => self.fields_abandoned += 1,
        }
    }
}

/// Applies `mappings` from `reader`'s document to `writer`'s.
///
/// A malformed path fails only its own mapping. Everything else the
/// reader and writer could not do is in their audit logs.
pub fn apply_mappings<S: TreeBackend, T: TreeBackend>(
    reader: &mut DocumentReader<'_, S>,
    writer: &mut DocumentWriter<'_, T>,
    mappings: &[FieldMapping],
) -> MappingReport {
    let mut report = MappingReport::default();

    for mapping in mappings {
        let paths = PathExpression::parse(&mapping.input)
            .and_then(|input| Ok((input, PathExpression::parse(&mapping.output)?)));
        let (input, output) = match paths {
            Ok(paths) => paths,
            Err(err) => {
                tracing::warn!(input = %mapping.input, output = %mapping.output, "skipping mapping: {}", err);
                report.errors.push((mapping.clone(), FieldError::from(err)));
                continue;
            }
        };

        match reader.read_path(&input, mapping.input_type) {
            ReadResult::NotFound => {
                report.not_found += 1;
                let missing = FieldError::NotFound {
                    path: input.to_string(),
                };
                writer.audits_mut().info(&output, missing.to_string());
            }
            ReadResult::Field(field) => {
                let outcome = write_one(writer, &output, field, mapping.output_type);
                report.record(outcome);
            }
            ReadResult::Group(group) => {
                tracing::debug!(input = %input, elements = group.len(), "fanning out group");
                for field in group.fields {
                    let outcome = write_one(writer, &output, field, mapping.output_type);
                    report.record(outcome);
                }
            }
        }
    }

    tracing::info!(
        written = report.fields_written,
        skipped = report.fields_skipped,
        abandoned = report.fields_abandoned,
        not_found = report.not_found,
        "applied {} mappings",
        mappings.len()
    );
    report
}

fn write_one<T: TreeBackend>(
    writer: &mut DocumentWriter<'_, T>,
    output: &PathExpression,
    field: ReadField,
    output_type: Option<FieldType>,
) -> WriteOutcome {
    let target = output.with_indexes_from(&field.path).fill_indexes(0);
    let value = match output_type {
        Some(field_type) if !field.value.is_complex() => FieldValue {
            field_type: Some(field_type),
            ..field.value
        },
        _ => field.value,
    };
    writer.write_path(&target, &value)
}
