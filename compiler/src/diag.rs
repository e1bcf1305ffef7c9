// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types used across all generator passes.
// Generation has no source text, so a diagnostic's location is its subject:
// the operator signature or registry entry it concerns.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::synth::GenError;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0200`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    /// No registered type covers a synthesized result.
    pub const E0100: DiagCode = DiagCode("E0100");
    /// A result is nonzero outside its declared output mask.
    pub const E0101: DiagCode = DiagCode("E0101");
    /// The registry's last descriptor does not cover every basis position.
    pub const E0200: DiagCode = DiagCode("E0200");
    /// A descriptor is covered by an earlier one and can never be inferred.
    pub const W0200: DiagCode = DiagCode("W0200");
    /// A codegen option has no valid rendering in the artifact.
    pub const E0201: DiagCode = DiagCode("E0201");
    /// The emitted artifact failed a verification obligation.
    pub const E0300: DiagCode = DiagCode("E0300");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Cause record ─────────────────────────────────────────────────────────

/// One link in a cause chain explaining a failure.
#[derive(Debug, Clone)]
pub struct CauseRecord {
    pub message: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A generator diagnostic emitted by any pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    /// What the diagnostic is about, e.g. `mul(Vector, Trivector)`.
    pub subject: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    pub cause_chain: Vec<CauseRecord>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, subject, hint, or causes.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            subject: None,
            message: message.into(),
            hint: None,
            cause_chain: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the subject the diagnostic concerns.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a cause record to the chain.
    pub fn with_cause(mut self, message: impl Into<String>) -> Self {
        self.cause_chain.push(CauseRecord {
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(subject) = &self.subject {
            write!(f, "\n  --> {}", subject)?;
        }
        for cause in &self.cause_chain {
            write!(f, "\n  cause: {}", cause.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

impl From<&GenError> for Diagnostic {
    fn from(err: &GenError) -> Self {
        match err {
            GenError::UnresolvableType { operator, .. } => Diagnostic::error(err.to_string())
                .with_code(codes::E0100)
                .with_subject(operator.clone())
                .with_hint("declare a descriptor covering all 16 positions last"),
            GenError::MaskInconsistency { operator, .. } => Diagnostic::error(err.to_string())
                .with_code(codes::E0101)
                .with_subject(operator.clone())
                .with_hint("the structure constants or the declared output type are wrong"),
        }
    }
}

/// `true` if any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Mask;
    use crate::registry::SubspaceType;

    #[test]
    fn display_without_code() {
        let d = Diagnostic::new(DiagLevel::Error, "something failed");
        assert_eq!(format!("{d}"), "error: something failed");
    }

    #[test]
    fn display_with_code() {
        let d = Diagnostic::warning("descriptor never inferred").with_code(codes::W0200);
        assert_eq!(format!("{d}"), "warning[W0200]: descriptor never inferred");
    }

    #[test]
    fn builder_chain() {
        let d = Diagnostic::error("no registered type covers the result")
            .with_code(codes::E0100)
            .with_subject("mul(Vector, Vector)")
            .with_hint("add a full multivector descriptor")
            .with_cause("support {1, e12}");

        assert_eq!(d.code, Some(codes::E0100));
        assert_eq!(d.hint.as_deref(), Some("add a full multivector descriptor"));
        assert_eq!(d.cause_chain.len(), 1);
        assert_eq!(
            d.to_string(),
            "error[E0100]: no registered type covers the result\n  --> mul(Vector, Vector)\n  cause: support {1, e12}\n  hint: add a full multivector descriptor"
        );
    }

    #[test]
    fn gen_errors_map_to_codes() {
        let unresolvable = GenError::UnresolvableType {
            operator: "mul(Vector, Vector)".into(),
            support: Mask::single(0),
        };
        let d = Diagnostic::from(&unresolvable);
        assert_eq!(d.code, Some(codes::E0100));
        assert_eq!(d.subject.as_deref(), Some("mul(Vector, Vector)"));

        let inconsistent = GenError::MaskInconsistency {
            operator: "neg(Vector)".into(),
            output: SubspaceType::Vector,
            position: 0,
        };
        let d = Diagnostic::from(&inconsistent);
        assert_eq!(d.code, Some(codes::E0101));
        assert!(has_errors(&[d]));
        assert!(!has_errors(&[Diagnostic::warning("w")]));
    }
}
