//! # Check Pipeline
//!
//! Wires the loaders, the scope resolver and the rule engine into one
//! run over a contract file and an optional exemption registry.
//!
//! Both inputs are loaded before any error is returned, and the most
//! severe failure wins (see [`ExitStatus::severity`]). A contract with a
//! syntax error and an expired exemption therefore reports the expired
//! exemption.
//!
//! [`ExitStatus::severity`]: crate::report::ExitStatus::severity

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;

use apiscope_core::{load_file, Document};

use crate::config::PolicyConfig;
use crate::contract::Contract;
use crate::exemptions::{load_exemptions, ExemptionSet};
use crate::report::{CheckError, Evaluation};
use crate::rules::evaluate;
use crate::scope::resolve_scope_with_prefix;

/// Inputs of a single check.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    /// Contract document (YAML or JSON).
    pub contract: &'a Path,
    /// Exemption registry, if any.
    pub exemptions: Option<&'a Path>,
    /// Date against which exemption expiry is judged.
    pub today: NaiveDate,
    /// Hygiene policy.
    pub config: &'a PolicyConfig,
}

/// Load both inputs and evaluate the contract.
///
/// # Errors
///
/// The most severe of the contract and exemption loading failures.
pub fn check_contract(request: &CheckRequest<'_>) -> Result<Evaluation, CheckError> {
    let document = load_file(request.contract).map_err(|source| CheckError::Contract {
        path: request.contract.display().to_string(),
        source,
    });
    let exemptions =
        load_exemptions(request.exemptions, request.today).map_err(CheckError::from);

    let (document, exemptions) = match (document, exemptions) {
        (Ok(document), Ok(exemptions)) => (document, exemptions),
        (Err(a), Err(b)) => return Err(a.worst(b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
    };

    Ok(evaluate_document(&document, &exemptions, request.config))
}

/// Resolve the scope of an already-loaded document and apply the rules.
pub fn evaluate_document(
    document: &Document,
    exemptions: &ExemptionSet,
    config: &PolicyConfig,
) -> Evaluation {
    let contract = Contract::new(document);
    let table = contract.schemas();
    tracing::info!(
        paths = contract.paths().map_or(0, |p| p.len()),
        schemas = table.len(),
        "contract loaded"
    );

    let scope = resolve_scope_with_prefix(&contract, &config.schema_ref_prefix);
    let exempted: BTreeSet<String> = scope
        .iter()
        .filter(|name| exemptions.contains(name))
        .map(str::to_string)
        .collect();
    let violations = evaluate(&scope, &table, exemptions, config);

    Evaluation {
        scope,
        exempted,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ExitStatus;
    use crate::rules::RuleId;
    use apiscope_core::load;

    const CONTRACT: &str = r##"
paths:
  /playback:
    get:
      responses:
        "200":
          content:
            application/json:
              schema: {$ref: "#/components/schemas/PlaybackState"}
components:
  schemas:
    PlaybackState:
      type: object
      properties:
        is_active: {type: boolean}
"##;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_evaluate_document_reports_both_rules() {
        let doc = load(CONTRACT).unwrap();
        let evaluation =
            evaluate_document(&doc, &ExemptionSet::new(), &PolicyConfig::default());
        assert_eq!(evaluation.scope.iter().collect::<Vec<_>>(), vec!["PlaybackState"]);
        assert!(evaluation.exempted.is_empty());
        let rules: Vec<RuleId> = evaluation.violations.iter().map(|v| v.rule_id).collect();
        assert_eq!(rules, vec![RuleId::Naming, RuleId::Extensibility]);
        assert_eq!(evaluation.status(), ExitStatus::Violations);
    }

    #[test]
    fn test_exempt_schema_is_marked_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let contract = write(dir.path(), "openapi.yaml", CONTRACT);
        let exemptions = write(
            dir.path(),
            "exemptions.yaml",
            "- name: PlaybackState\n  reason: legacy\n  adr_link: docs/adr/0007.md\n  expiry: never\n",
        );
        let config = PolicyConfig::default();
        let evaluation = check_contract(&CheckRequest {
            contract: &contract,
            exemptions: Some(&exemptions),
            today: date("2026-01-01"),
            config: &config,
        })
        .unwrap();
        assert!(evaluation.exempted.contains("PlaybackState"));
        assert!(evaluation.violations.is_empty());
        assert_eq!(evaluation.status(), ExitStatus::Success);
    }

    #[test]
    fn test_duplicate_key_beats_expired_exemption() {
        let dir = tempfile::tempdir().unwrap();
        let contract = write(
            dir.path(),
            "openapi.yaml",
            "paths:\n  /a:\n    get: {}\n    get: {}\n",
        );
        let exemptions = write(
            dir.path(),
            "exemptions.yaml",
            "- name: A\n  reason: r\n  adr_link: l\n  expiry: 2020-01-01\n",
        );
        let config = PolicyConfig::default();
        let err = check_contract(&CheckRequest {
            contract: &contract,
            exemptions: Some(&exemptions),
            today: date("2026-01-01"),
            config: &config,
        })
        .unwrap_err();
        assert_eq!(err.status(), ExitStatus::DuplicateKey);
    }

    #[test]
    fn test_expired_exemption_beats_contract_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let contract = write(dir.path(), "openapi.yaml", "paths: [unclosed\n");
        let exemptions = write(
            dir.path(),
            "exemptions.yaml",
            "- name: A\n  reason: r\n  adr_link: l\n  expiry: 2020-01-01\n",
        );
        let config = PolicyConfig::default();
        let err = check_contract(&CheckRequest {
            contract: &contract,
            exemptions: Some(&exemptions),
            today: date("2026-01-01"),
            config: &config,
        })
        .unwrap_err();
        assert_eq!(err.status(), ExitStatus::ExpiredExemption);
    }

    #[test]
    fn test_missing_contract_is_operational() {
        let config = PolicyConfig::default();
        let err = check_contract(&CheckRequest {
            contract: Path::new("/nonexistent/openapi.yaml"),
            exemptions: None,
            today: date("2026-01-01"),
            config: &config,
        })
        .unwrap_err();
        assert_eq!(err.status(), ExitStatus::Operational);
    }
}
