//! SSOT process generation: resolve a declarative process against the
//! methodology's phase-default table into a concrete, persistable process.
//!
//! Generation is total and deterministic. Every lookup miss degrades to "no
//! value" and an absent states_sequence yields an empty phase list, so the
//! same inputs always produce byte-identical output.

use crate::types::{ConcretePhase, ConcreteProcess, PhaseApproval, PhaseDefault, Process};
use std::collections::BTreeMap;

/// Canonical (lookup) form of a phase id.
pub fn normalize_phase_id(id: &str) -> String {
    id.to_uppercase()
}

/// Map a normalized phase id back to its conventional on-disk spelling.
///
/// Only a handful of legacy ids have a known mixed-case form; anything else
/// passes through uppercased. Unknown ids therefore round-trip losslessly
/// only if they were uppercase to begin with — callers rely on the fallback,
/// so it stays.
pub fn denormalize_phase_id(id: &str) -> String {
    match normalize_phase_id(id).as_str() {
        "BC_DELTA" => "BC_delta".to_string(),
        "AC_DELTA" => "AC_delta".to_string(),
        "PLAN_FINALIZE" => "PLAN_FINALIZE".to_string(),
        "APPLY_DELTAS" => "APPLY_DELTAS".to_string(),
        other => other.to_string(),
    }
}

/// Resolve one declarative process against the phase-default table.
///
/// Merge precedence per field: per-process override, then default, then the
/// fixed fallback (`skip_allowed: false`; template/validators omitted).
pub fn generate_process(
    process: &Process,
    phase_defaults: &BTreeMap<String, PhaseDefault>,
) -> ConcreteProcess {
    let approval_points = process.approval_points_normalized();
    let empty = PhaseDefault::default();

    let mut phases = Vec::with_capacity(process.states_sequence.len());
    for state_id in &process.states_sequence {
        let normalized = normalize_phase_id(state_id);
        let defaults = phase_defaults.get(&normalized).unwrap_or(&empty);
        let overrides = process.phase_overrides.get(&normalized).unwrap_or(&empty);

        let template = overrides
            .template
            .clone()
            .or_else(|| defaults.template.clone());
        let validators = overrides
            .validators
            .clone()
            .or_else(|| defaults.validators.clone())
            .filter(|v| !v.is_empty());
        let approval = approval_points.get(&normalized).map(|point| PhaseApproval {
            required: true,
            role: overrides
                .approval_role
                .clone()
                .or_else(|| defaults.approval_role.clone())
                .unwrap_or_else(|| point.role.clone()),
        });

        phases.push(ConcretePhase {
            id: denormalize_phase_id(state_id),
            template,
            validators,
            approval,
            skip_allowed: overrides
                .skip_allowed
                .or(defaults.skip_allowed)
                .unwrap_or(false),
        });
    }

    ConcreteProcess {
        process_id: process.id.clone(),
        version: process
            .version
            .clone()
            .unwrap_or_else(|| "1.0.0".to_string()),
        name: process.name.clone().unwrap_or_else(|| process.id.clone()),
        description: process.description.clone().unwrap_or_default(),
        process_type: process
            .process_type
            .clone()
            .unwrap_or_else(|| "feature_development".to_string()),
        phases,
        nodes: process.nodes.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApprovalPoint, ApprovalPoints};

    fn process(id: &str, sequence: &[&str]) -> Process {
        Process {
            id: id.to_string(),
            version: None,
            name: None,
            process_type: None,
            description: None,
            states_sequence: sequence.iter().map(|s| s.to_string()).collect(),
            approval_points: None,
            phase_overrides: BTreeMap::new(),
            nodes: BTreeMap::new(),
        }
    }

    fn defaults_with_qa() -> BTreeMap<String, PhaseDefault> {
        let mut defaults = BTreeMap::new();
        defaults.insert(
            "QA".to_string(),
            PhaseDefault {
                template: Some("QA_TEMPLATE".to_string()),
                validators: Some(vec!["v1".to_string()]),
                approval_role: Some("qa_lead".to_string()),
                skip_allowed: None,
            },
        );
        defaults
    }

    #[test]
    fn defaults_flow_into_generated_phase() {
        let mut defaults = BTreeMap::new();
        defaults.insert(
            "QA".to_string(),
            PhaseDefault {
                validators: Some(vec!["v1".to_string()]),
                approval_role: Some("qa_lead".to_string()),
                ..PhaseDefault::default()
            },
        );
        let mut p = process("release", &["QA"]);
        p.approval_points = Some(ApprovalPoints::Legacy(vec!["QA".to_string()]));

        let concrete = generate_process(&p, &defaults);
        assert_eq!(concrete.phases.len(), 1);
        let phase = &concrete.phases[0];
        assert_eq!(phase.id, "QA");
        assert_eq!(phase.validators.as_deref(), Some(&["v1".to_string()][..]));
        assert_eq!(
            phase.approval,
            Some(PhaseApproval {
                required: true,
                role: "qa_lead".to_string()
            })
        );
        assert!(!phase.skip_allowed);
    }

    #[test]
    fn override_beats_default() {
        let mut p = process("release", &["QA"]);
        p.phase_overrides.insert(
            "QA".to_string(),
            PhaseDefault {
                template: Some("CUSTOM_TEMPLATE".to_string()),
                skip_allowed: Some(true),
                ..PhaseDefault::default()
            },
        );
        let concrete = generate_process(&p, &defaults_with_qa());
        let phase = &concrete.phases[0];
        assert_eq!(phase.template.as_deref(), Some("CUSTOM_TEMPLATE"));
        assert!(phase.skip_allowed);
        // Unoverridden fields still come from the default.
        assert_eq!(phase.validators.as_deref(), Some(&["v1".to_string()][..]));
    }

    #[test]
    fn legacy_and_map_approval_points_generate_identically() {
        let mut legacy = process("release", &["QA"]);
        legacy.approval_points = Some(ApprovalPoints::Legacy(vec!["QA".to_string()]));

        let mut map = BTreeMap::new();
        map.insert(
            "QA".to_string(),
            ApprovalPoint {
                role: "approver".to_string(),
                note: None,
            },
        );
        let mut ssot = process("release", &["QA"]);
        ssot.approval_points = Some(ApprovalPoints::Roles(map));

        let defaults = BTreeMap::new();
        assert_eq!(
            generate_process(&legacy, &defaults).phases[0].approval,
            generate_process(&ssot, &defaults).phases[0].approval
        );
    }

    #[test]
    fn approval_role_override_wins_over_approval_point() {
        let mut p = process("release", &["QA"]);
        p.approval_points = Some(ApprovalPoints::Legacy(vec!["QA".to_string()]));
        p.phase_overrides.insert(
            "QA".to_string(),
            PhaseDefault {
                approval_role: Some("security_lead".to_string()),
                ..PhaseDefault::default()
            },
        );
        let concrete = generate_process(&p, &BTreeMap::new());
        assert_eq!(
            concrete.phases[0].approval.as_ref().unwrap().role,
            "security_lead"
        );
    }

    #[test]
    fn approval_role_precedence_override_then_default_then_point() {
        let mut p = process("release", &["QA"]);
        p.approval_points = Some(ApprovalPoints::Legacy(vec!["QA".to_string()]));
        let defaults = defaults_with_qa();

        // Default role beats the legacy point's implicit "approver".
        assert_eq!(
            generate_process(&p, &defaults).phases[0]
                .approval
                .as_ref()
                .unwrap()
                .role,
            "qa_lead"
        );

        // Override role beats the default role.
        p.phase_overrides.insert(
            "QA".to_string(),
            PhaseDefault {
                approval_role: Some("security_lead".to_string()),
                ..PhaseDefault::default()
            },
        );
        assert_eq!(
            generate_process(&p, &defaults).phases[0]
                .approval
                .as_ref()
                .unwrap()
                .role,
            "security_lead"
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let mut p = process("release", &["RELEASE", "QA", "DEPLOY"]);
        p.approval_points = Some(ApprovalPoints::Legacy(vec!["QA".to_string()]));
        let defaults = defaults_with_qa();

        let first = generate_process(&p, &defaults);
        let second = generate_process(&p, &defaults);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn known_legacy_ids_denormalize_others_pass_through_uppercased() {
        assert_eq!(denormalize_phase_id("bc_delta"), "BC_delta");
        assert_eq!(denormalize_phase_id("AC_DELTA"), "AC_delta");
        assert_eq!(denormalize_phase_id("plan_finalize"), "PLAN_FINALIZE");
        assert_eq!(denormalize_phase_id("custom_phase"), "CUSTOM_PHASE");
    }

    #[test]
    fn empty_sequence_yields_empty_phases_and_fixed_top_level_defaults() {
        let p = process("bare", &[]);
        let concrete = generate_process(&p, &BTreeMap::new());
        assert!(concrete.phases.is_empty());
        assert_eq!(concrete.version, "1.0.0");
        assert_eq!(concrete.name, "bare");
        assert_eq!(concrete.description, "");
        assert_eq!(concrete.process_type, "feature_development");
    }

    #[test]
    fn empty_validator_list_is_omitted() {
        let mut defaults = BTreeMap::new();
        defaults.insert(
            "QA".to_string(),
            PhaseDefault {
                validators: Some(Vec::new()),
                ..PhaseDefault::default()
            },
        );
        let concrete = generate_process(&process("release", &["QA"]), &defaults);
        assert_eq!(concrete.phases[0].validators, None);
    }

    #[test]
    fn nodes_carried_through_only_when_present() {
        let mut p = process("release", &["QA"]);
        p.nodes.insert("QA".to_string(), "qa-node".to_string());
        let concrete = generate_process(&p, &BTreeMap::new());
        assert_eq!(concrete.nodes.get("QA").map(String::as_str), Some("qa-node"));

        let json = serde_json::to_string(&generate_process(
            &process("bare", &["QA"]),
            &BTreeMap::new(),
        ))
        .unwrap();
        assert!(!json.contains("nodes"));
    }
}
