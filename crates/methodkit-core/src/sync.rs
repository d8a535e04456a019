//! Drift detection between the SSOT (methodology document) and the persisted
//! process files: regenerate the expected concrete form and diff it against
//! what is actually on disk, field by field and phase by phase.

use crate::generate::{generate_process, normalize_phase_id};
use crate::types::{ConcretePhase, ConcreteProcess, Methodology};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Issue / report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncIssue {
    pub process_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<String>,
    pub field: String,
    pub expected: Value,
    pub actual: Value,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SyncReport {
    /// Process ids declared in the methodology, in declaration order.
    pub checked: Vec<String>,
    pub issues: Vec<SyncIssue>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Issues grouped by process id: declared processes first (in order,
    /// including in-sync ones with an empty issue list), then any persisted
    /// processes that were never declared.
    pub fn grouped(&self) -> Vec<(String, Vec<&SyncIssue>)> {
        let mut groups: Vec<(String, Vec<&SyncIssue>)> = self
            .checked
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        for issue in &self.issues {
            match groups.iter_mut().find(|(id, _)| *id == issue.process_id) {
                Some((_, list)) => list.push(issue),
                None => groups.push((issue.process_id.clone(), vec![issue])),
            }
        }
        groups
    }
}

// ---------------------------------------------------------------------------
// Sync check
// ---------------------------------------------------------------------------

pub fn sync_check(methodology: &Methodology, actual: &[ConcreteProcess]) -> SyncReport {
    let actual_by_id: HashMap<&str, &ConcreteProcess> = actual
        .iter()
        .map(|p| (p.process_id.as_str(), p))
        .collect();

    let mut report = SyncReport::default();

    for process in &methodology.processes {
        report.checked.push(process.id.clone());

        let Some(persisted) = actual_by_id.get(process.id.as_str()) else {
            report.issues.push(SyncIssue {
                process_id: process.id.clone(),
                phase_id: None,
                field: "process".to_string(),
                expected: json!("exists"),
                actual: json!("missing"),
                severity: Severity::Error,
            });
            continue;
        };

        let expected = generate_process(process, &methodology.phase_defaults);
        compare_process_fields(process.states_sequence.len(), &expected, persisted, &mut report);
        compare_phases(&expected.process_id, &expected.phases, &persisted.phases, &mut report);
    }

    // Persisted processes with no declaration at all.
    for persisted in actual {
        if !methodology
            .processes
            .iter()
            .any(|p| p.id == persisted.process_id)
        {
            report.issues.push(SyncIssue {
                process_id: persisted.process_id.clone(),
                phase_id: None,
                field: "process".to_string(),
                expected: json!("not defined in methodology"),
                actual: json!("exists in processes/"),
                severity: Severity::Warning,
            });
        }
    }

    report
}

fn compare_process_fields(
    expected_phase_count: usize,
    expected: &ConcreteProcess,
    actual: &ConcreteProcess,
    report: &mut SyncReport,
) {
    let mut warn = |field: &str, exp: Value, act: Value| {
        report.issues.push(SyncIssue {
            process_id: expected.process_id.clone(),
            phase_id: None,
            field: field.to_string(),
            expected: exp,
            actual: act,
            severity: Severity::Warning,
        });
    };

    if expected.version != actual.version {
        warn("version", json!(expected.version), json!(actual.version));
    }
    if expected.name != actual.name {
        warn("name", json!(expected.name), json!(actual.name));
    }
    if expected.process_type != actual.process_type {
        warn(
            "type",
            json!(expected.process_type),
            json!(actual.process_type),
        );
    }

    // Containment, not equality: a persisted description may elaborate beyond
    // the declared one, so only its leading 50 characters must match.
    if !expected.description.is_empty() {
        let prefix: String = expected.description.chars().take(50).collect();
        if !actual.description.contains(&prefix) {
            let actual_prefix: String = actual.description.chars().take(50).collect();
            warn(
                "description",
                json!(format!("{prefix}...")),
                json!(format!("{actual_prefix}...")),
            );
        }
    }

    // Phase-by-phase comparison assumes aligned identity, so a count mismatch
    // is structural.
    if expected_phase_count != actual.phases.len() {
        report.issues.push(SyncIssue {
            process_id: expected.process_id.clone(),
            phase_id: None,
            field: "phases.length".to_string(),
            expected: json!(expected_phase_count),
            actual: json!(actual.phases.len()),
            severity: Severity::Error,
        });
    }
}

fn compare_phases(
    process_id: &str,
    expected: &[ConcretePhase],
    actual: &[ConcretePhase],
    report: &mut SyncReport,
) {
    let actual_by_id: BTreeMap<String, &ConcretePhase> = actual
        .iter()
        .map(|p| (normalize_phase_id(&p.id), p))
        .collect();

    for expected_phase in expected {
        let normalized = normalize_phase_id(&expected_phase.id);
        let mut issue = |field: &str, exp: Value, act: Value, severity: Severity| {
            report.issues.push(SyncIssue {
                process_id: process_id.to_string(),
                phase_id: Some(normalized.clone()),
                field: field.to_string(),
                expected: exp,
                actual: act,
                severity,
            });
        };

        let Some(actual_phase) = actual_by_id.get(&normalized) else {
            issue("phase", json!("exists"), json!("missing"), Severity::Error);
            continue;
        };

        if expected_phase.template != actual_phase.template {
            issue(
                "template",
                json!(expected_phase.template),
                json!(actual_phase.template),
                Severity::Warning,
            );
        }

        // Order-insensitive: validators are a set.
        let expected_validators = expected_phase.validators.clone().unwrap_or_default();
        let actual_validators = actual_phase.validators.clone().unwrap_or_default();
        if !same_set(&expected_validators, &actual_validators) {
            issue(
                "validators",
                json!(expected_validators),
                json!(actual_validators),
                Severity::Warning,
            );
        }

        match (&expected_phase.approval, &actual_phase.approval) {
            // A dropped approval gate is a structural hole; a surplus one is
            // merely suspicious.
            (Some(exp), None) => issue(
                "approval",
                json!(exp),
                Value::Null,
                Severity::Error,
            ),
            (None, Some(act)) => issue(
                "approval",
                Value::Null,
                json!(act),
                Severity::Warning,
            ),
            (Some(exp), Some(act)) if exp.role != act.role => issue(
                "approval.role",
                json!(exp.role),
                json!(act.role),
                Severity::Warning,
            ),
            _ => {}
        }

        if expected_phase.skip_allowed != actual_phase.skip_allowed {
            issue(
                "skip_allowed",
                json!(expected_phase.skip_allowed),
                json!(actual_phase.skip_allowed),
                Severity::Warning,
            );
        }
    }
}

fn same_set(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
