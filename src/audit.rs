//! Audit records for non-fatal read/write problems.
//!
//! Missing branches, out-of-range indices, unparseable leaves and structural
//! conflicts never abort a document. They are recorded here and mirrored to
//! `tracing` so a run can finish and report everything it skipped.

use std::fmt;

use serde::Serialize;

/// `tracing` target audit events are emitted under.
pub const AUDIT_TARGET: &str = "fieldquill::audit";

/// Audit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditSeverity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditSeverity::Info => write!(f, "INFO"),
            AuditSeverity::Warn => write!(f, "WARN"),
            AuditSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Audit {
    pub doc_id: String,
    pub message: String,
    pub severity: AuditSeverity,
    pub path: String,
}

impl fmt::Display for Audit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.doc_id, self.path, self.message
        )
    }
}

/// Destination for audit entries.
pub trait AuditSink {
    fn add_audit(&mut self, audit: Audit);
}

impl AuditSink for Vec<Audit> {
    fn add_audit(&mut self, audit: Audit) {
        self.push(audit);
    }
}

/// Audit collector bound to one document.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    doc_id: String,
    entries: Vec<Audit>,
}

impl AuditLog {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Records an entry and emits the matching `tracing` event.
    pub fn record(&mut self, severity: AuditSeverity, path: impl fmt::Display, message: impl Into<String>) {
        let audit = Audit {
            doc_id: self.doc_id.clone(),
            message: message.into(),
            severity,
            path: path.to_string(),
        };
        match severity {
            AuditSeverity::Info => {
                tracing::info!(target: AUDIT_TARGET, doc_id = %audit.doc_id, path = %audit.path, "{}", audit.message)
            }
            AuditSeverity::Warn => {
                tracing::warn!(target: AUDIT_TARGET, doc_id = %audit.doc_id, path = %audit.path, "{}", audit.message)
            }
            AuditSeverity::Error => {
                tracing::error!(target: AUDIT_TARGET, doc_id = %audit.doc_id, path = %audit.path, "{}", audit.message)
            }
        }
        self.entries.push(audit);
    }

    pub fn info(&mut self, path: impl fmt::Display, message: impl Into<String>) {
        self.record(AuditSeverity::Info, path, message);
    }

    pub fn warn(&mut self, path: impl fmt::Display, message: impl Into<String>) {
        self.record(AuditSeverity::Warn, path, message);
    }

    pub fn error(&mut self, path: impl fmt::Display, message: impl Into<String>) {
        self.record(AuditSeverity::Error, path, message);
    }

    pub fn entries(&self) -> &[Audit] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|audit| audit.severity == AuditSeverity::Error)
    }

    /// Entries at or above `severity`.
    pub fn at_least(&self, severity: AuditSeverity) -> impl Iterator<Item = &Audit> {
        self.entries.iter().filter(move |a| a.severity >= severity)
    }

    /// Moves every entry into another sink.
    pub fn drain_into<S: AuditSink + ?Sized>(&mut self, sink: &mut S) {
        for audit in self.entries.drain(..) {
            sink.add_audit(audit);
        }
    }

    pub fn into_entries(self) -> Vec<Audit> {
        self.entries
    }
}

impl AuditSink for AuditLog {
    fn add_audit(&mut self, audit: Audit) {
        self.entries.push(audit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_filter() {
        let mut log = AuditLog::new("source");
        log.info("/a", "fine");
        log.warn("/b", "missing");
        log.error("/c", "conflict");

        assert_eq!(log.len(), 3);
        assert!(log.has_errors());
        assert_eq!(log.at_least(AuditSeverity::Warn).count(), 2);
        assert_eq!(log.entries()[1].doc_id, "source");
        assert_eq!(log.entries()[1].path, "/b");
    }

    #[test]
    fn test_drain_into_vec() {
        let mut log = AuditLog::new("target");
        log.warn("/x", "out of range");
        let mut sink: Vec<Audit> = Vec::new();
        log.drain_into(&mut sink);
        assert!(log.is_empty());
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink[0].to_string(),
            "WARN [target] /x: out of range"
        );
    }
}
