//! Structural validation of a methodology document.
//!
//! `validate` always returns a report, even for a maximally malformed
//! document: missing collections were already defaulted to empty at
//! deserialization, so every check runs unconditionally and independently.

use crate::graph;
use crate::types::{ActorType, Methodology, StateType, ToolType, ValidationReport};
use std::collections::HashSet;

pub fn validate(m: &Methodology) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_required_fields(m, &mut errors);
    check_states(m, &mut errors, &mut warnings);
    check_actors(m, &mut errors, &mut warnings);
    check_tools(m, &mut warnings);
    check_actions(m, &mut errors, &mut warnings);
    check_facts(m, &mut errors, &mut warnings);
    check_rules(m, &mut warnings);
    check_processes(m, &mut warnings);
    check_graph(m, &mut errors, &mut warnings);

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn check_required_fields(m: &Methodology, errors: &mut Vec<String>) {
    if m.methodology_id.is_empty() {
        errors.push("Missing required field: methodology_id".to_string());
    }
    if m.version.is_empty() {
        errors.push("Missing required field: version".to_string());
    }
    if m.name.is_empty() {
        errors.push("Missing required field: name".to_string());
    }
}

fn check_states(m: &Methodology, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if m.states.len() < 2 {
        errors.push("Must have at least 2 states (Initial and Terminal)".to_string());
    }

    let initial: Vec<&str> = m
        .states
        .iter()
        .filter(|s| s.state_type == StateType::Initial)
        .map(|s| s.id.as_str())
        .collect();
    match initial.len() {
        0 => errors.push("No Initial state defined".to_string()),
        1 => {}
        _ => errors.push(format!(
            "Multiple Initial states defined: {}",
            initial.join(", ")
        )),
    }

    if !m.states.iter().any(|s| s.state_type == StateType::Terminal) {
        errors.push("No Terminal state defined".to_string());
    }

    if !m.states.iter().any(|s| s.state_type == StateType::Error) {
        warnings.push("No Error state defined (recommended for robustness)".to_string());
    }

    for state in &m.states {
        if state.state_type == StateType::Waiting && state.timeout.is_none() {
            warnings.push(format!(
                "Waiting state '{}' has no timeout defined",
                state.id
            ));
        }
    }
}

fn check_actors(m: &Methodology, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if m.actors.is_empty() {
        errors.push("Must have at least 1 actor".to_string());
    }

    for actor in &m.actors {
        if actor.tools.is_empty() {
            warnings.push(format!("Actor '{}' has no tools defined", actor.id));
        }
    }

    // Approval semantics need a human somewhere in the loop.
    let has_human = m.actors.iter().any(|a| a.actor_type == ActorType::Human);
    let has_approvals = m
        .actions
        .iter()
        .any(|a| a.name.to_lowercase().contains("approve"));
    if has_approvals && !has_human {
        warnings.push("Approval actions exist but no Human actors defined".to_string());
    }
}

fn check_tools(m: &Methodology, warnings: &mut Vec<String>) {
    for tool in &m.tools {
        if tool.compatible_actors.is_empty() {
            warnings.push(format!(
                "Tool '{}' has no compatible_actors defined",
                tool.id
            ));
        }
        if tool.tool_type == ToolType::Ui && tool.compatible_actors.contains(&ActorType::Ai) {
            warnings.push(format!(
                "Tool '{}' is UI type but marked compatible with AI",
                tool.id
            ));
        }
    }
}

fn check_actions(m: &Methodology, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if m.actions.is_empty() {
        errors.push("Must have at least 1 action".to_string());
    }

    let state_ids: HashSet<&str> = m.states.iter().map(|s| s.id.as_str()).collect();
    let actor_ids: HashSet<&str> = m.actors.iter().map(|a| a.id.as_str()).collect();
    let tool_ids: HashSet<&str> = m.tools.iter().map(|t| t.id.as_str()).collect();

    for action in &m.actions {
        if let Some(actor) = &action.actor {
            if !actor_ids.contains(actor.as_str()) {
                warnings.push(format!(
                    "Action '{}' references unknown actor '{}'",
                    action.id, actor
                ));
            }
        }
        if let Some(tool) = &action.tool {
            if !tool_ids.contains(tool.as_str()) {
                warnings.push(format!(
                    "Action '{}' references unknown tool '{}'",
                    action.id, tool
                ));
            }
        }
        for state_id in &action.allowed_in_states {
            if !state_ids.contains(state_id.as_str()) {
                warnings.push(format!(
                    "Action '{}' references unknown state '{}'",
                    action.id, state_id
                ));
            }
        }
        if action.allowed_in_states.is_empty() {
            warnings.push(format!("Action '{}' has no allowed_in_states", action.id));
        }
    }
}

fn check_facts(m: &Methodology, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if m.facts.is_empty() {
        errors.push("Must have at least 1 fact".to_string());
    }

    let state_ids: HashSet<&str> = m.states.iter().map(|s| s.id.as_str()).collect();
    let action_ids: HashSet<&str> = m.actions.iter().map(|a| a.id.as_str()).collect();

    for fact in &m.facts {
        if let Some(from) = &fact.from_state {
            if !state_ids.contains(from.as_str()) {
                warnings.push(format!(
                    "Fact '{}' references unknown from_state '{}'",
                    fact.id, from
                ));
            }
        }
        if let Some(to) = &fact.to_state {
            if !state_ids.contains(to.as_str()) {
                warnings.push(format!(
                    "Fact '{}' references unknown to_state '{}'",
                    fact.id, to
                ));
            }
        }
        if let Some(action) = &fact.triggered_by {
            if !action_ids.contains(action.as_str()) {
                warnings.push(format!(
                    "Fact '{}' references unknown action '{}'",
                    fact.id, action
                ));
            }
        }
        if fact.from_state.is_none() || fact.to_state.is_none() {
            warnings.push(format!(
                "Fact '{}' missing from_state or to_state (may not trigger transition)",
                fact.id
            ));
        }
    }
}

fn check_rules(m: &Methodology, warnings: &mut Vec<String>) {
    for rule in &m.rules {
        if rule.condition.is_none() {
            warnings.push(format!("Rule '{}' has no condition defined", rule.id));
        }
        if rule.on_violation.is_none() {
            warnings.push(format!(
                "Rule '{}' has no on_violation action defined",
                rule.id
            ));
        }
    }
}

fn check_processes(m: &Methodology, warnings: &mut Vec<String>) {
    let state_ids: HashSet<&str> = m.states.iter().map(|s| s.id.as_str()).collect();

    for process in &m.processes {
        for state_id in &process.states_sequence {
            if !state_ids.contains(state_id.as_str()) {
                warnings.push(format!(
                    "Process '{}' references unknown state '{}'",
                    process.id, state_id
                ));
            }
        }

        if let Some(first) = process.states_sequence.first() {
            if let Some(state) = m.state(first) {
                if state.state_type != StateType::Initial {
                    warnings.push(format!(
                        "Process '{}' doesn't start with Initial state",
                        process.id
                    ));
                }
            }
        }
        if let Some(last) = process.states_sequence.last() {
            if let Some(state) = m.state(last) {
                if state.state_type != StateType::Terminal {
                    warnings.push(format!(
                        "Process '{}' doesn't end with Terminal state",
                        process.id
                    ));
                }
            }
        }
    }
}

fn check_graph(m: &Methodology, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    // Unreachable states may be intentionally dormant: warning only.
    if m.initial_state().is_some() {
        let reachable = graph::reachable_states(&m.states, &m.facts);
        for state in &m.states {
            if !reachable.contains(state.id.as_str()) && state.state_type != StateType::Initial {
                warnings.push(format!(
                    "State '{}' is not reachable from Initial state",
                    state.id
                ));
            }
        }
    }

    for id in graph::deadlocked_states(&m.states, &m.facts) {
        errors.push(format!("Deadlock: State '{id}' has no outgoing transitions"));
    }

    for id in graph::non_terminating_states(&m.states, &m.facts) {
        warnings.push(format!("State '{id}' cannot reach any Terminal state"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
