use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// StateType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    Initial,
    Working,
    Waiting,
    Terminal,
    Error,
}

impl StateType {
    pub fn all() -> &'static [StateType] {
        &[
            StateType::Initial,
            StateType::Working,
            StateType::Waiting,
            StateType::Terminal,
            StateType::Error,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StateType::Initial => "Initial",
            StateType::Working => "Working",
            StateType::Waiting => "Waiting",
            StateType::Terminal => "Terminal",
            StateType::Error => "Error",
        }
    }

    /// Terminal and Error states are expected sinks; everything else must
    /// eventually leave.
    pub fn is_sink(self) -> bool {
        matches!(self, StateType::Terminal | StateType::Error)
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActorType / ToolType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Human,
    #[serde(rename = "AI")]
    Ai,
    System,
}

impl ActorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::Human => "Human",
            ActorType::Ai => "AI",
            ActorType::System => "System",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolType {
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "UI")]
    Ui,
    #[serde(rename = "LLM")]
    Llm,
    Script,
    Manual,
    #[serde(rename = "MCP")]
    Mcp,
}

impl ToolType {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolType::Api => "API",
            ToolType::Ui => "UI",
            ToolType::Llm => "LLM",
            ToolType::Script => "Script",
            ToolType::Manual => "Manual",
            ToolType::Mcp => "MCP",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RuleType / ViolationAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    Precondition,
    Postcondition,
    Guard,
    Invariant,
    Constraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationAction {
    Block,
    Redirect,
    Compensate,
    Alert,
    Retry,
}

// ---------------------------------------------------------------------------
// Document entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_actions: Vec<String>,
    /// Approval gates (Waiting states) should declare one, e.g. "24h".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatible_actors: Vec<ActorType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_in_states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ActionOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub artifact_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// A transition record. Only facts with both `from_state` and `to_state`
/// populated contribute an edge to the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    /// Past tense by convention ("spec_approved").
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

impl Fact {
    pub fn edge(&self) -> Option<(&str, &str)> {
        match (&self.from_state, &self.to_state) {
            (Some(from), Some(to)) => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_violation: Option<ViolationAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

// ---------------------------------------------------------------------------
// SSOT: phase defaults, approval points, declarative processes
// ---------------------------------------------------------------------------

/// Reusable per-phase behavior, keyed by normalized (uppercase) phase id in
/// the methodology document. Also the shape of per-process overrides, hence
/// every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_allowed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPoint {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Approval points come in two on-disk shapes: a legacy list of phase ids
/// (each implicitly granted the "approver" role) and the SSOT map from phase
/// id to `{role}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApprovalPoints {
    Legacy(Vec<String>),
    Roles(BTreeMap<String, ApprovalPoint>),
}

impl ApprovalPoints {
    /// Normalize both shapes to the map form with uppercase keys.
    pub fn normalized(&self) -> BTreeMap<String, ApprovalPoint> {
        match self {
            ApprovalPoints::Legacy(ids) => ids
                .iter()
                .map(|id| {
                    (
                        id.to_uppercase(),
                        ApprovalPoint {
                            role: "approver".to_string(),
                            note: None,
                        },
                    )
                })
                .collect(),
            ApprovalPoints::Roles(map) => map
                .iter()
                .map(|(id, point)| (id.to_uppercase(), point.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub states_sequence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_points: Option<ApprovalPoints>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub phase_overrides: BTreeMap<String, PhaseDefault>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<String, String>,
}

impl Process {
    pub fn approval_points_normalized(&self) -> BTreeMap<String, ApprovalPoint> {
        self.approval_points
            .as_ref()
            .map(ApprovalPoints::normalized)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Methodology document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Methodology {
    #[serde(default)]
    pub methodology_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub phase_defaults: BTreeMap<String, PhaseDefault>,
    #[serde(default)]
    pub processes: Vec<Process>,
}

impl Methodology {
    pub fn initial_state(&self) -> Option<&State> {
        self.states
            .iter()
            .find(|s| s.state_type == StateType::Initial)
    }

    pub fn terminal_states(&self) -> Vec<&State> {
        self.states
            .iter()
            .filter(|s| s.state_type == StateType::Terminal)
            .collect()
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }
}

// ---------------------------------------------------------------------------
// Concrete (generated/persisted) process form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseApproval {
    pub required: bool,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcretePhase {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<PhaseApproval>,
    #[serde(default)]
    pub skip_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteProcess {
    pub process_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub process_type: String,
    #[serde(default)]
    pub phases: Vec<ConcretePhase>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Validation report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
