//! # Report and Exit Status
//!
//! Folds the outcome of a check into the text printed on stdout and the
//! process exit status consumed by CI.
//!
//! ## Exit Statuses
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | No structural, exemption or hygiene issue |
//! | 1    | One or more hygiene violations            |
//! | 2    | Malformed exemption entry                 |
//! | 3    | Expired exemption entry                   |
//! | 4    | Operational failure (IO, syntax, config)  |
//! | 5    | Duplicate key in the contract document    |
//!
//! When more than one condition is observed, the most severe wins:
//! duplicate key, malformed exemption, expired exemption, operational,
//! violations, success.

use std::collections::BTreeSet;

use thiserror::Error;

use apiscope_core::LoadError;

use crate::config::ConfigError;
use crate::exemptions::ExemptionError;
use crate::rules::Violation;
use crate::scope::ScopeSet;

const AUDIT_HEADER: &str = "--- OpenAPI Scoped Schemas (Audit) ---";
const AUDIT_FOOTER: &str = "--------------------------------------";

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Clean.
    Success,
    /// Hygiene violations found.
    Violations,
    /// An exemption entry is missing a field or has a bad expiry.
    MalformedExemption,
    /// An exemption entry has expired.
    ExpiredExemption,
    /// The run could not be carried out.
    Operational,
    /// The contract document repeats a key.
    DuplicateKey,
}

impl ExitStatus {
    /// Process exit code.
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Violations => 1,
            ExitStatus::MalformedExemption => 2,
            ExitStatus::ExpiredExemption => 3,
            ExitStatus::Operational => 4,
            ExitStatus::DuplicateKey => 5,
        }
    }

    /// Rank used to pick between competing statuses; higher is worse.
    pub fn severity(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Violations => 1,
            ExitStatus::Operational => 2,
            ExitStatus::ExpiredExemption => 3,
            ExitStatus::MalformedExemption => 4,
            ExitStatus::DuplicateKey => 5,
        }
    }

    /// The more severe of `self` and `other`.
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// A failure that stops the run before any rule is evaluated.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The contract document could not be loaded.
    #[error("contract document '{path}': {source}")]
    Contract {
        /// Path to the contract document.
        path: String,
        /// Loader failure.
        #[source]
        source: LoadError,
    },

    /// The exemption registry could not be loaded.
    #[error("{0}")]
    Exemptions(#[from] ExemptionError),

    /// The policy configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl CheckError {
    /// Exit status for this failure.
    pub fn status(&self) -> ExitStatus {
        match self {
            CheckError::Contract {
                source: LoadError::DuplicateKey { .. },
                ..
            } => ExitStatus::DuplicateKey,
            CheckError::Contract { .. } => ExitStatus::Operational,
            CheckError::Exemptions(ExemptionError::Malformed { .. }) => {
                ExitStatus::MalformedExemption
            }
            CheckError::Exemptions(ExemptionError::Expired { .. }) => ExitStatus::ExpiredExemption,
            CheckError::Exemptions(_) => ExitStatus::Operational,
            CheckError::Config(_) => ExitStatus::Operational,
        }
    }

    /// The more severe of two failures; `self` wins ties.
    pub fn worst(self, other: Self) -> Self {
        if self.status().worst(other.status()) == self.status() {
            self
        } else {
            other
        }
    }
}

/// Result of a completed evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Schemas reachable from the contract's operations.
    pub scope: ScopeSet,
    /// Scoped schemas skipped because of an exemption.
    pub exempted: BTreeSet<String>,
    /// Every violation, ordered by schema name.
    pub violations: Vec<Violation>,
}

impl Evaluation {
    /// `Violations` if any rule fired, otherwise `Success`.
    pub fn status(&self) -> ExitStatus {
        if self.violations.is_empty() {
            ExitStatus::Success
        } else {
            ExitStatus::Violations
        }
    }
}

/// Rendered output of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Text for stdout, newline-terminated.
    pub text: String,
    /// Terminal status.
    pub status: ExitStatus,
}

/// Render the outcome of a run.
///
/// A completed evaluation lists the full scope (exempt schemas marked),
/// every violation, and a summary line. A fatal failure renders as a
/// single diagnostic line.
pub fn aggregate(outcome: &Result<Evaluation, CheckError>) -> Report {
    match outcome {
        Ok(evaluation) => Report {
            text: render_evaluation(evaluation),
            status: evaluation.status(),
        },
        Err(err) => Report {
            text: format!("ERROR: {err}\n"),
            status: err.status(),
        },
    }
}

fn render_evaluation(evaluation: &Evaluation) -> String {
    let mut out = format!("{AUDIT_HEADER}\n");
    for name in evaluation.scope.iter() {
        if evaluation.exempted.contains(name) {
            out.push_str(&format!("  - {name} (exempt)\n"));
        } else {
            out.push_str(&format!("  - {name}\n"));
        }
    }
    out.push_str(&format!("{AUDIT_FOOTER}\n"));

    for violation in &evaluation.violations {
        out.push_str(&format!("VIOLATION {violation}\n"));
    }

    let summary = if evaluation.violations.is_empty() {
        format!(
            "OK: hygiene verified for {} scoped schema(s).\n",
            evaluation.scope.len()
        )
    } else {
        format!(
            "FAIL: {} hygiene violation(s) in {} scoped schema(s).\n",
            evaluation.violations.len(),
            evaluation.scope.len()
        )
    };
    out.push_str(&summary);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleId;

    fn violation(schema: &str, rule_id: RuleId) -> Violation {
        Violation {
            schema_name: schema.to_string(),
            rule_id,
            message: format!("{schema} broke {rule_id}"),
        }
    }

    #[test]
    fn test_exit_codes_are_stable() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Violations.code(), 1);
        assert_eq!(ExitStatus::MalformedExemption.code(), 2);
        assert_eq!(ExitStatus::ExpiredExemption.code(), 3);
        assert_eq!(ExitStatus::Operational.code(), 4);
        assert_eq!(ExitStatus::DuplicateKey.code(), 5);
    }

    #[test]
    fn test_precedence_order() {
        let ordered = [
            ExitStatus::DuplicateKey,
            ExitStatus::MalformedExemption,
            ExitStatus::ExpiredExemption,
            ExitStatus::Operational,
            ExitStatus::Violations,
            ExitStatus::Success,
        ];
        for (i, higher) in ordered.iter().enumerate() {
            for lower in &ordered[i + 1..] {
                assert_eq!(higher.worst(*lower), *higher);
                assert_eq!(lower.worst(*higher), *higher);
            }
        }
    }

    #[test]
    fn test_check_error_status_mapping() {
        let dup = CheckError::Contract {
            path: "openapi.yaml".to_string(),
            source: LoadError::DuplicateKey {
                key: "get".to_string(),
                line: 6,
            },
        };
        assert_eq!(dup.status(), ExitStatus::DuplicateKey);

        let syntax = CheckError::Contract {
            path: "openapi.yaml".to_string(),
            source: LoadError::Syntax {
                line: None,
                message: "bad".to_string(),
            },
        };
        assert_eq!(syntax.status(), ExitStatus::Operational);

        let expired = CheckError::from(ExemptionError::Expired {
            name: "A".to_string(),
            expiry: "2020-01-01".to_string(),
        });
        assert_eq!(expired.status(), ExitStatus::ExpiredExemption);

        let malformed = CheckError::from(ExemptionError::Malformed {
            index: 0,
            name: None,
            detail: "missing or empty 'name'".to_string(),
        });
        assert_eq!(malformed.status(), ExitStatus::MalformedExemption);

        assert_eq!(dup.worst(malformed).status(), ExitStatus::DuplicateKey);
        assert_eq!(syntax.worst(expired).status(), ExitStatus::ExpiredExemption);
    }

    #[test]
    fn test_error_report_is_single_diagnostic() {
        let outcome = Err(CheckError::Contract {
            path: "openapi.yaml".to_string(),
            source: LoadError::DuplicateKey {
                key: "get".to_string(),
                line: 6,
            },
        });
        let report = aggregate(&outcome);
        assert_eq!(report.status, ExitStatus::DuplicateKey);
        assert_eq!(
            report.text,
            "ERROR: contract document 'openapi.yaml': duplicate key 'get' found at line 6\n"
        );
    }

    #[test]
    fn test_clean_report() {
        let report = aggregate(&Ok(Evaluation::default()));
        assert_eq!(report.status, ExitStatus::Success);
        assert_eq!(
            report.text,
            format!(
                "{AUDIT_HEADER}\n{AUDIT_FOOTER}\nOK: hygiene verified for 0 scoped schema(s).\n"
            )
        );
    }

    #[test]
    fn test_violation_report_lists_scope_then_violations() {
        let doc = apiscope_core::load(
            r##"
paths:
  /a:
    get:
      schema: {$ref: "#/components/schemas/PlaybackState"}
    post:
      schema: {$ref: "#/components/schemas/Legacy"}
components:
  schemas:
    PlaybackState: {}
    Legacy: {}
"##,
        )
        .unwrap();
        let scope = crate::scope::resolve_scope(&crate::contract::Contract::new(&doc));
        let evaluation = Evaluation {
            scope,
            exempted: ["Legacy".to_string()].into_iter().collect(),
            violations: vec![
                violation("PlaybackState", RuleId::Naming),
                violation("PlaybackState", RuleId::Extensibility),
            ],
        };
        let report = aggregate(&Ok(evaluation));
        assert_eq!(report.status, ExitStatus::Violations);
        let lines: Vec<&str> = report.text.lines().collect();
        assert_eq!(
            lines,
            vec![
                AUDIT_HEADER,
                "  - Legacy (exempt)",
                "  - PlaybackState",
                AUDIT_FOOTER,
                "VIOLATION [naming] PlaybackState broke naming",
                "VIOLATION [extensibility] PlaybackState broke extensibility",
                "FAIL: 2 hygiene violation(s) in 2 scoped schema(s).",
            ]
        );
    }
}
