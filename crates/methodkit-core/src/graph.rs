//! Reachability, deadlock, and termination analysis over the workflow graph.
//!
//! The graph is derived from facts: only a fact with both `from_state` and
//! `to_state` populated contributes an edge. Severity of the findings is the
//! validator's call; this module just computes the sets.

use crate::types::{Fact, State, StateType};
use std::collections::{HashMap, HashSet, VecDeque};

/// Edges `from -> to` derived from facts with both endpoints.
pub fn transition_edges(facts: &[Fact]) -> Vec<(&str, &str)> {
    facts.iter().filter_map(Fact::edge).collect()
}

/// Breadth-first traversal from the unique Initial state. Returns the set of
/// reachable state ids; empty when no Initial state is declared.
pub fn reachable_states<'a>(states: &'a [State], facts: &'a [Fact]) -> HashSet<&'a str> {
    let mut reachable = HashSet::new();
    let Some(initial) = states.iter().find(|s| s.state_type == StateType::Initial) else {
        return reachable;
    };

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in transition_edges(facts) {
        adjacency.entry(from).or_default().push(to);
    }

    reachable.insert(initial.id.as_str());
    let mut queue = VecDeque::from([initial.id.as_str()]);
    while let Some(current) = queue.pop_front() {
        for &next in adjacency.get(current).into_iter().flatten() {
            if reachable.insert(next) {
                queue.push_back(next);
            }
        }
    }
    reachable
}

/// States that are neither Terminal nor Error yet have no outgoing edge.
/// These are hard errors: the workflow literally cannot progress from them.
pub fn deadlocked_states<'a>(states: &'a [State], facts: &'a [Fact]) -> Vec<&'a str> {
    let with_exit: HashSet<&str> = transition_edges(facts)
        .into_iter()
        .map(|(from, _)| from)
        .collect();

    states
        .iter()
        .filter(|s| !s.state_type.is_sink())
        .filter(|s| !with_exit.contains(s.id.as_str()))
        .map(|s| s.id.as_str())
        .collect()
}

/// States that are neither Terminal nor Error and cannot reach any Terminal
/// state. Computed by reverse BFS from the full set of Terminal states.
pub fn non_terminating_states<'a>(states: &'a [State], facts: &'a [Fact]) -> Vec<&'a str> {
    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in transition_edges(facts) {
        reverse.entry(to).or_default().push(from);
    }

    let mut can_reach_terminal: HashSet<&str> = states
        .iter()
        .filter(|s| s.state_type == StateType::Terminal)
        .map(|s| s.id.as_str())
        .collect();
    let mut queue: VecDeque<&str> = can_reach_terminal.iter().copied().collect();

    while let Some(current) = queue.pop_front() {
        for &pred in reverse.get(current).into_iter().flatten() {
            if can_reach_terminal.insert(pred) {
                queue.push_back(pred);
            }
        }
    }

    states
        .iter()
        .filter(|s| !s.state_type.is_sink())
        .filter(|s| !can_reach_terminal.contains(s.id.as_str()))
        .map(|s| s.id.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str, state_type: StateType) -> State {
        State {
            id: id.to_string(),
            name: id.to_string(),
            state_type,
            allowed_actions: Vec::new(),
            timeout: None,
        }
    }

    fn fact(id: &str, from: Option<&str>, to: Option<&str>) -> Fact {
        Fact {
            id: id.to_string(),
            name: String::new(),
            from_state: from.map(str::to_string),
            to_state: to.map(str::to_string),
            triggered_by: None,
            requires: Vec::new(),
        }
    }

    #[test]
    fn partial_facts_contribute_no_edge() {
        let facts = vec![
            fact("f1", Some("A"), Some("B")),
            fact("f2", Some("A"), None),
            fact("f3", None, Some("B")),
        ];
        assert_eq!(transition_edges(&facts), vec![("A", "B")]);
    }

    #[test]
    fn reachability_follows_edges_from_initial() {
        let states = vec![
            state("S1", StateType::Initial),
            state("S2", StateType::Working),
            state("S3", StateType::Terminal),
            state("ORPHAN", StateType::Working),
        ];
        let facts = vec![
            fact("f1", Some("S1"), Some("S2")),
            fact("f2", Some("S2"), Some("S3")),
        ];
        let reachable = reachable_states(&states, &facts);
        assert!(reachable.contains("S1"));
        assert!(reachable.contains("S2"));
        assert!(reachable.contains("S3"));
        assert!(!reachable.contains("ORPHAN"));
    }

    #[test]
    fn reachability_empty_without_initial() {
        let states = vec![state("A", StateType::Working)];
        assert!(reachable_states(&states, &[]).is_empty());
    }

    #[test]
    fn deadlock_ignores_terminal_and_error() {
        let states = vec![
            state("S1", StateType::Initial),
            state("S2", StateType::Terminal),
            state("ERR", StateType::Error),
        ];
        // S1 has no outgoing edge: deadlocked. S2/ERR are exempt sinks.
        assert_eq!(deadlocked_states(&states, &[]), vec!["S1"]);
    }

    #[test]
    fn deadlock_cleared_by_outgoing_edge() {
        let states = vec![
            state("S1", StateType::Initial),
            state("S2", StateType::Terminal),
        ];
        let facts = vec![fact("f1", Some("S1"), Some("S2"))];
        assert!(deadlocked_states(&states, &facts).is_empty());
    }

    #[test]
    fn non_terminating_cycle_detected() {
        let states = vec![
            state("S1", StateType::Initial),
            state("LOOP_A", StateType::Working),
            state("LOOP_B", StateType::Working),
            state("DONE", StateType::Terminal),
        ];
        let facts = vec![
            fact("f1", Some("S1"), Some("DONE")),
            fact("f2", Some("LOOP_A"), Some("LOOP_B")),
            fact("f3", Some("LOOP_B"), Some("LOOP_A")),
        ];
        let stuck = non_terminating_states(&states, &facts);
        assert_eq!(stuck, vec!["LOOP_A", "LOOP_B"]);
    }

    #[test]
    fn non_terminating_empty_for_linear_chain() {
        let states = vec![
            state("S1", StateType::Initial),
            state("S2", StateType::Working),
            state("S3", StateType::Terminal),
        ];
        let facts = vec![
            fact("f1", Some("S1"), Some("S2")),
            fact("f2", Some("S2"), Some("S3")),
        ];
        assert!(non_terminating_states(&states, &facts).is_empty());
    }
}
