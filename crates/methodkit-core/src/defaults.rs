//! Inverse of generation, used for SSOT migration: derive a phase-default
//! table and declarative process definitions from already-persisted concrete
//! processes.

use crate::generate::normalize_phase_id;
use crate::types::{ApprovalPoint, ApprovalPoints, ConcreteProcess, PhaseDefault, Process};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ExtractedDefaults {
    pub defaults: BTreeMap<String, PhaseDefault>,
    /// Which processes use each phase, for reporting.
    pub used_in: BTreeMap<String, Vec<String>>,
}

/// Merge rules across processes sharing a phase: template and approval_role
/// keep the first value found, validators union in first-seen order,
/// skip_allowed is true if any process allows skipping.
pub fn extract_phase_defaults(processes: &[ConcreteProcess]) -> ExtractedDefaults {
    let mut extracted = ExtractedDefaults::default();

    for process in processes {
        for phase in &process.phases {
            let phase_id = normalize_phase_id(&phase.id);
            let entry = extracted.defaults.entry(phase_id.clone()).or_default();
            extracted
                .used_in
                .entry(phase_id)
                .or_default()
                .push(process.process_id.clone());

            if entry.template.is_none() {
                entry.template = phase.template.clone();
            }

            if let Some(validators) = &phase.validators {
                let merged = entry.validators.get_or_insert_with(Vec::new);
                for v in validators {
                    if !merged.contains(v) {
                        merged.push(v.clone());
                    }
                }
            }

            if entry.approval_role.is_none() {
                entry.approval_role = phase.approval.as_ref().map(|a| a.role.clone());
            }

            if phase.skip_allowed {
                entry.skip_allowed = Some(true);
            } else if entry.skip_allowed.is_none() {
                entry.skip_allowed = Some(false);
            }
        }
    }

    extracted
}

/// Rebuild the declarative process list (map-form approval points, normalized
/// state sequence) from persisted processes.
pub fn extract_processes(processes: &[ConcreteProcess]) -> Vec<Process> {
    processes
        .iter()
        .map(|p| {
            let mut approval_points = BTreeMap::new();
            for phase in &p.phases {
                if let Some(approval) = &phase.approval {
                    if approval.required {
                        approval_points.insert(
                            normalize_phase_id(&phase.id),
                            ApprovalPoint {
                                role: approval.role.clone(),
                                note: None,
                            },
                        );
                    }
                }
            }

            Process {
                id: p.process_id.clone(),
                version: Some(p.version.clone()),
                name: Some(p.name.clone()),
                process_type: Some(p.process_type.clone()),
                description: Some(p.description.clone()),
                states_sequence: p
                    .phases
                    .iter()
                    .map(|phase| normalize_phase_id(&phase.id))
                    .collect(),
                approval_points: (!approval_points.is_empty())
                    .then_some(ApprovalPoints::Roles(approval_points)),
                phase_overrides: BTreeMap::new(),
                nodes: p.nodes.clone(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
