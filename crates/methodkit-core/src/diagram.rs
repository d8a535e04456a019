//! Diagram text emitters: pure formatting of an already-loaded methodology
//! into Mermaid or PlantUML source. No I/O here; the CLI decides whether the
//! text goes to stdout or a file.

use crate::types::{ActorType, Methodology, StateType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    State,
    Actors,
    Artifacts,
}

pub fn mermaid(m: &Methodology, kind: DiagramKind) -> String {
    match kind {
        DiagramKind::State => mermaid_state(m),
        DiagramKind::Actors => mermaid_actors(m),
        DiagramKind::Artifacts => mermaid_artifacts(m),
    }
}

pub fn plantuml(m: &Methodology, kind: DiagramKind) -> String {
    match kind {
        DiagramKind::State => plantuml_state(m),
        DiagramKind::Actors => plantuml_actors(m),
        DiagramKind::Artifacts => plantuml_artifacts(m),
    }
}

// ---------------------------------------------------------------------------
// Mermaid
// ---------------------------------------------------------------------------

fn mermaid_state(m: &Methodology) -> String {
    let mut lines = vec!["stateDiagram-v2".to_string(), String::new()];

    let initial = m.initial_state();
    let terminals = m.terminal_states();
    let error_state = m.states.iter().find(|s| s.state_type == StateType::Error);
    let waiting: Vec<_> = m
        .states
        .iter()
        .filter(|s| s.state_type == StateType::Waiting)
        .collect();

    lines.push("    %% State types:".to_string());
    lines.push(format!(
        "    %% Initial: {}",
        initial.map(|s| s.id.as_str()).unwrap_or("none")
    ));
    lines.push(format!(
        "    %% Terminal: {}",
        terminals
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if let Some(err) = error_state {
        lines.push(format!("    %% Error: {}", err.id));
    }
    if !waiting.is_empty() {
        lines.push(format!(
            "    %% Waiting (approval): {}",
            waiting
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    lines.push(String::new());

    if let Some(initial) = initial {
        lines.push(format!("    [*] --> {}", initial.id));
    }

    let is_error_edge = |fact: &crate::types::Fact, from: &str, to: &str| {
        error_state.is_some_and(|err| err.id == from || err.id == to)
            || fact.id.contains("error")
            || fact.id.contains("fail")
    };

    let edges: Vec<(&crate::types::Fact, &str, &str)> = m
        .facts
        .iter()
        .filter_map(|f| f.edge().map(|(from, to)| (f, from, to)))
        .collect();

    let normal: Vec<_> = edges
        .iter()
        .filter(|(f, from, to)| !is_error_edge(f, from, to))
        .collect();
    if !normal.is_empty() {
        lines.push(String::new());
        lines.push("    %% Normal transitions".to_string());
        for (fact, from, to) in &normal {
            lines.push(format!("    {from} --> {to}: {}", fact.id));
        }
    }

    for terminal in &terminals {
        lines.push(format!("    {} --> [*]", terminal.id));
    }

    let errors: Vec<_> = edges
        .iter()
        .filter(|(f, from, to)| is_error_edge(f, from, to))
        .collect();
    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("    %% Error transitions".to_string());
        for (fact, from, to) in &errors {
            lines.push(format!("    {from} --> {to}: {}", fact.id));
        }
    }

    if !waiting.is_empty() {
        lines.push(String::new());
        lines.push("    %% Approval points".to_string());
        for state in &waiting {
            lines.push(format!("    note right of {}: Requires approval", state.id));
        }
    }

    if let Some(err) = error_state {
        lines.push(String::new());
        lines.push(format!("    {}:::errorState", err.id));
        lines.push("    classDef errorState fill:#f96,stroke:#333,stroke-width:2px".to_string());
    }

    if !m.processes.is_empty() {
        lines.push(String::new());
        lines.push("    %% Processes:".to_string());
        for process in &m.processes {
            lines.push(format!(
                "    %% - {}: {}",
                process.id,
                process.states_sequence.join(" -> ")
            ));
        }
    }

    lines.join("\n")
}

fn mermaid_actors(m: &Methodology) -> String {
    let mut lines = vec![
        "flowchart LR".to_string(),
        String::new(),
        "    %% Actor interaction diagram".to_string(),
        String::new(),
    ];

    for actor_type in [ActorType::Human, ActorType::Ai, ActorType::System] {
        let actors: Vec<_> = m
            .actors
            .iter()
            .filter(|a| a.actor_type == actor_type)
            .collect();
        if actors.is_empty() {
            continue;
        }
        lines.push(format!(
            "    subgraph {0}Actors[\"{0} Actors\"]",
            actor_type
        ));
        for actor in actors {
            let shape = if actor_type == ActorType::Human {
                format!("([\"{}\"])", actor.name)
            } else {
                format!("[[\"{}\"]]", actor.name)
            };
            lines.push(format!("        {}{}", actor.id, shape));
        }
        lines.push("    end".to_string());
        lines.push(String::new());
    }

    if !m.tools.is_empty() {
        lines.push("    subgraph Tools[\"Tools\"]".to_string());
        for tool in &m.tools {
            lines.push(format!("        {}[(\"{}\")]", tool.id, tool.name));
        }
        lines.push("    end".to_string());
        lines.push(String::new());
    }

    for actor in &m.actors {
        for tool_id in &actor.tools {
            lines.push(format!("    {} --> {}", actor.id, tool_id));
        }
    }

    lines.push(String::new());
    lines.push("    %% Actions".to_string());
    for action in &m.actions {
        if let (Some(actor), Some(tool)) = (&action.actor, &action.tool) {
            lines.push(format!("    %% {}: {actor} uses {tool}", action.id));
        }
    }

    lines.push(String::new());
    lines.push("    classDef human fill:#ffd,stroke:#333".to_string());
    lines.push("    classDef ai fill:#ddf,stroke:#333".to_string());
    lines.push("    classDef tool fill:#dfd,stroke:#333".to_string());
    for actor in &m.actors {
        match actor.actor_type {
            ActorType::Human => lines.push(format!("    class {} human", actor.id)),
            ActorType::Ai => lines.push(format!("    class {} ai", actor.id)),
            ActorType::System => {}
        }
    }
    for tool in &m.tools {
        lines.push(format!("    class {} tool", tool.id));
    }

    lines.join("\n")
}

fn mermaid_artifacts(m: &Methodology) -> String {
    let mut lines = vec![
        "flowchart TD".to_string(),
        String::new(),
        "    %% Artifact flow diagram".to_string(),
        String::new(),
    ];

    for state in &m.states {
        lines.push(format!("    subgraph {}[\"{}\"]", state.id, state.name));
        let artifacts: Vec<_> = m
            .artifacts
            .iter()
            .filter(|artifact| {
                creator_states(m, artifact)
                    .first()
                    .is_some_and(|s| *s == state.id)
            })
            .collect();
        if artifacts.is_empty() {
            lines.push(format!("        {}_empty[\" \"]", state.id));
        } else {
            for artifact in artifacts {
                lines.push(format!("        {}[/\"{}\"/]", artifact.id, artifact.name));
            }
        }
        lines.push("    end".to_string());
        lines.push(String::new());
    }

    for fact in &m.facts {
        if let Some((from, to)) = fact.edge() {
            if !fact.id.contains("error") {
                lines.push(format!("    {from} --> {to}"));
            }
        }
    }

    lines.push(String::new());
    lines.push("    classDef artifact fill:#fff,stroke:#333".to_string());
    for artifact in &m.artifacts {
        lines.push(format!("    class {} artifact", artifact.id));
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// PlantUML
// ---------------------------------------------------------------------------

fn plantuml_state(m: &Methodology) -> String {
    let mut lines = vec![
        "@startuml".to_string(),
        format!("title {} - State Machine", m.name),
        String::new(),
    ];

    for state in &m.states {
        let color = match state.state_type {
            StateType::Initial => " #lightgreen",
            StateType::Terminal => " #lightblue",
            StateType::Error => " #salmon",
            StateType::Waiting => " #yellow",
            StateType::Working => "",
        };
        lines.push(format!("state \"{}\" as {}{color}", state.name, state.id));
    }
    lines.push(String::new());

    if let Some(initial) = m.initial_state() {
        lines.push(format!("[*] --> {}", initial.id));
    }

    for fact in &m.facts {
        if let Some((from, to)) = fact.edge() {
            lines.push(format!("{from} --> {to} : {}", fact.id));
        }
    }

    for terminal in m.terminal_states() {
        lines.push(format!("{} --> [*]", terminal.id));
    }

    for state in &m.states {
        if state.state_type == StateType::Waiting {
            lines.push(format!("note right of {} : Requires approval", state.id));
        }
    }

    lines.push(String::new());
    lines.push("legend right".to_string());
    lines.push("  |= Type |= Color |".to_string());
    lines.push("  | Initial | <#lightgreen> |".to_string());
    lines.push("  | Working | <#white> |".to_string());
    lines.push("  | Waiting | <#yellow> |".to_string());
    lines.push("  | Terminal | <#lightblue> |".to_string());
    lines.push("  | Error | <#salmon> |".to_string());
    lines.push("endlegend".to_string());
    lines.push(String::new());
    lines.push("@enduml".to_string());

    lines.join("\n")
}

fn plantuml_actors(m: &Methodology) -> String {
    let mut lines = vec![
        "@startuml".to_string(),
        format!("title {} - Actor Interactions", m.name),
        String::new(),
    ];

    for actor in &m.actors {
        match actor.actor_type {
            ActorType::Human => lines.push(format!("actor \"{}\" as {}", actor.name, actor.id)),
            ActorType::Ai => lines.push(format!(
                "participant \"{}\" as {} <<AI>>",
                actor.name, actor.id
            )),
            ActorType::System => lines.push(format!(
                "participant \"{}\" as {} <<System>>",
                actor.name, actor.id
            )),
        }
    }
    lines.push(String::new());

    for tool in &m.tools {
        lines.push(format!("database \"{}\" as {}", tool.name, tool.id));
    }
    lines.push(String::new());

    for actor in &m.actors {
        for tool_id in &actor.tools {
            lines.push(format!("{} --> {tool_id} : uses", actor.id));
        }
    }

    lines.push(String::new());
    lines.push("' Actions:".to_string());
    for action in &m.actions {
        if let (Some(actor), Some(tool)) = (&action.actor, &action.tool) {
            lines.push(format!("' {}: {actor} -> {tool}", action.name));
        }
    }

    lines.push(String::new());
    lines.push("@enduml".to_string());
    lines.join("\n")
}

fn plantuml_artifacts(m: &Methodology) -> String {
    let mut lines = vec![
        "@startuml".to_string(),
        format!("title {} - Artifact Flow", m.name),
        String::new(),
    ];

    for artifact in &m.artifacts {
        lines.push(format!("artifact \"{}\" as {}", artifact.name, artifact.id));
    }
    lines.push(String::new());

    for state in &m.states {
        lines.push(format!("folder \"{}\" as {}_folder {{", state.name, state.id));
        for artifact in &m.artifacts {
            if creator_states(m, artifact).contains(&state.id.as_str()) {
                lines.push(format!(
                    "  artifact \"{}\" as {}_in_{}",
                    artifact.name, artifact.id, state.id
                ));
            }
        }
        lines.push("}".to_string());
    }
    lines.push(String::new());

    for fact in &m.facts {
        if let Some((from, to)) = fact.edge() {
            if !fact.id.contains("error") {
                lines.push(format!("{from}_folder --> {to}_folder"));
            }
        }
    }

    lines.push(String::new());
    lines.push("@enduml".to_string());
    lines.join("\n")
}

/// States in which the action that creates `artifact` is allowed to run.
fn creator_states<'a>(
    m: &'a Methodology,
    artifact: &crate::types::Artifact,
) -> Vec<&'a str> {
    let Some(created_by) = &artifact.created_by else {
        return Vec::new();
    };
    m.actions
        .iter()
        .find(|a| &a.id == created_by)
        .map(|a| a.allowed_in_states.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
