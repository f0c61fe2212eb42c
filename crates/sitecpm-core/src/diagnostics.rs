//! Diagnostics produced while scheduling
//!
//! Non-fatal findings (computation warnings, clamped overrides, excluded
//! activities) travel with the result as `Diagnostic` values instead of
//! aborting the run. Fatal configuration problems are `ConfigError`s.

use serde::{Deserialize, Serialize};

use crate::ActivityId;

/// Diagnostic severity, most severe first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Malformed activity data; scheduling refused
    E001InvalidActivityData,
    /// Dependency id references no activity (treated as absent)
    C001MissingDependency,
    /// Critical paths have differing total durations
    W001CriticalPathMismatch,
    /// Ready set above the exhaustive cap
    W002SequenceCapExceeded,
    /// Optimizer time budget exhausted
    W003OptimizerTimeBudget,
    /// Zero-float activity missing from every reported critical path
    W004CriticalActivityOffPath,
    /// Idle manpower exceeds planned manpower
    O001IdleManpowerClamped,
    /// Material percentage outside [0, 100]
    O002MaterialClamped,
    /// Override names an unknown activity
    O003UnknownOverrideTarget,
    /// Activity excluded from ranking
    X001ActivityExcluded,
    /// Heuristic sequencing summary
    I001HeuristicSequencing,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::E001InvalidActivityData => "E001",
            DiagnosticCode::C001MissingDependency => "C001",
            DiagnosticCode::W001CriticalPathMismatch => "W001",
            DiagnosticCode::W002SequenceCapExceeded => "W002",
            DiagnosticCode::W003OptimizerTimeBudget => "W003",
            DiagnosticCode::W004CriticalActivityOffPath => "W004",
            DiagnosticCode::O001IdleManpowerClamped => "O001",
            DiagnosticCode::O002MaterialClamped => "O002",
            DiagnosticCode::O003UnknownOverrideTarget => "O003",
            DiagnosticCode::X001ActivityExcluded => "X001",
            DiagnosticCode::I001HeuristicSequencing => "I001",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::E001InvalidActivityData => Severity::Error,
            DiagnosticCode::I001HeuristicSequencing => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding reported to the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic at the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            activity: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn for_activity(mut self, id: impl Into<String>) -> Self {
        self.activity = Some(id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Emitter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
