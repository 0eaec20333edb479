use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::AssetError;
use crate::math::Vec2;
use crate::metadata::{AssetMetadata, AssetType};
use crate::uuid::AssetUuid;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    Float,
    Int,
    Bool,
    /// A bool that is cleared when a transition consumes it.
    Trigger,
}

/// Value of an animator parameter or of a condition threshold.
///
/// Serialized as the bare JSON primitive. Whole numbers without a fractional
/// part deserialize as `Int`, anything with one as `Float`; a loaded
/// controller then coerces each value to its parameter's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Default for ParameterValue {
    fn default() -> Self {
        ParameterValue::Float(0.0)
    }
}

impl ParameterValue {
    /// Zero value of the given parameter type. Triggers default to unset.
    pub fn default_for(ty: ParameterType) -> Self {
        match ty {
            ParameterType::Float => ParameterValue::Float(0.0),
            ParameterType::Int => ParameterValue::Int(0),
            ParameterType::Bool | ParameterType::Trigger => ParameterValue::Bool(false),
        }
    }

    /// Reinterpret a number as `ty`. Integers widen to `Float`, integral
    /// floats narrow to `Int`. Anything else is returned unchanged.
    pub fn coerce_to(self, ty: ParameterType) -> Self {
        match (ty, self) {
            (ParameterType::Float, ParameterValue::Int(v)) => ParameterValue::Float(v as f32),
            (ParameterType::Int, ParameterValue::Float(v)) if v.fract() == 0.0 => {
                ParameterValue::Int(v as i32)
            }
            _ => self,
        }
    }

    pub fn as_float(self) -> Option<f32> {
        match self {
            ParameterValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i32> {
        match self {
            ParameterValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Bool(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatorParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub default_value: ParameterValue,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonType {
    Greater,
    Less,
    Equals,
    NotEquals,
}

/// `parameter <comparison> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCondition {
    pub parameter: String,
    pub comparison: ComparisonType,
    pub value: ParameterValue,
}

impl TransitionCondition {
    pub fn new(
        parameter: impl Into<String>,
        comparison: ComparisonType,
        value: impl Into<ParameterValue>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            comparison,
            value: value.into(),
        }
    }

    /// Compare `current` against the threshold. Values of different kinds
    /// never satisfy a condition; bools only support equality.
    pub fn evaluate(&self, current: ParameterValue) -> bool {
        use ComparisonType::*;
        match (current, self.value) {
            (ParameterValue::Float(a), ParameterValue::Float(b)) => match self.comparison {
                Greater => a > b,
                Less => a < b,
                Equals => a == b,
                NotEquals => a != b,
            },
            (ParameterValue::Int(a), ParameterValue::Int(b)) => match self.comparison {
                Greater => a > b,
                Less => a < b,
                Equals => a == b,
                NotEquals => a != b,
            },
            (ParameterValue::Bool(a), ParameterValue::Bool(b)) => match self.comparison {
                Equals => a == b,
                NotEquals => a != b,
                Greater | Less => false,
            },
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// States and transitions
// ---------------------------------------------------------------------------

fn unit_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub name: String,
    #[serde(default)]
    pub clip_uuid: AssetUuid,
    #[serde(default = "unit_speed")]
    pub speed: f32,
    /// Node position in the graph editor.
    #[serde(default)]
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateTransition {
    pub from_state: String,
    pub to_state: String,
    pub conditions: Vec<TransitionCondition>,
    /// Normalized time in the source state's clip after which the
    /// transition may fire. Only checked when `has_exit_time` is set.
    pub exit_time: f32,
    /// Seconds between the transition firing and the state switch.
    pub transition_duration: f32,
    pub has_exit_time: bool,
}

impl Default for StateTransition {
    fn default() -> Self {
        Self {
            from_state: String::new(),
            to_state: String::new(),
            conditions: Vec::new(),
            exit_time: 1.0,
            transition_duration: 0.0,
            has_exit_time: false,
        }
    }
}

impl StateTransition {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_state: from.into(),
            to_state: to.into(),
            ..Self::default()
        }
    }

    pub fn with_condition(mut self, condition: TransitionCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_exit_time(mut self, exit_time: f32) -> Self {
        self.has_exit_time = true;
        self.exit_time = exit_time;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.transition_duration = seconds;
        self
    }
}

// ---------------------------------------------------------------------------
// AnimatorController
// ---------------------------------------------------------------------------

/// A state machine over animation clips.
///
/// Transitions refer to states by name. Names are not checked against the
/// state list: a transition out of a missing state never fires, and one into
/// a missing state leaves the animator on a state with no clip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimatorController {
    #[serde(skip)]
    metadata: AssetMetadata,
    #[serde(skip)]
    loaded: bool,
    pub parameters: Vec<AnimatorParameter>,
    pub states: Vec<AnimationState>,
    pub transitions: Vec<StateTransition>,
    pub default_state: String,
}

impl AnimatorController {
    pub fn new() -> Self {
        Self::default()
    }

    // -- states -------------------------------------------------------------

    /// Add a state. The first state added becomes the default.
    ///
    /// Returns `false` if a state with this name already exists.
    pub fn add_state(&mut self, name: impl Into<String>, clip_uuid: AssetUuid) -> bool {
        let name = name.into();
        if self.state(&name).is_some() {
            return false;
        }
        if self.default_state.is_empty() {
            self.default_state = name.clone();
        }
        self.states.push(AnimationState {
            name,
            clip_uuid,
            speed: 1.0,
            position: Vec2::ZERO,
        });
        true
    }

    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut AnimationState> {
        self.states.iter_mut().find(|s| s.name == name)
    }

    /// Remove a state and every transition touching it. When it was the
    /// default, the first remaining state takes over.
    pub fn remove_state(&mut self, name: &str) -> bool {
        let before = self.states.len();
        self.states.retain(|s| s.name != name);
        if self.states.len() == before {
            return false;
        }
        self.transitions
            .retain(|t| t.from_state != name && t.to_state != name);
        if self.default_state == name {
            self.default_state = self
                .states
                .first()
                .map(|s| s.name.clone())
                .unwrap_or_default();
        }
        true
    }

    /// Rename a state, updating transitions and the default.
    ///
    /// Fails if `old` is missing or `new` is already taken.
    pub fn rename_state(&mut self, old: &str, new: &str) -> bool {
        if old == new || self.state(new).is_some() {
            return false;
        }
        let Some(state) = self.state_mut(old) else {
            return false;
        };
        state.name = new.to_owned();
        for t in &mut self.transitions {
            if t.from_state == old {
                t.from_state = new.to_owned();
            }
            if t.to_state == old {
                t.to_state = new.to_owned();
            }
        }
        if self.default_state == old {
            self.default_state = new.to_owned();
        }
        true
    }

    // -- transitions --------------------------------------------------------

    pub fn add_transition(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// Transitions leaving `state`, in authored order.
    pub fn transitions_from<'a>(
        &'a self,
        state: &'a str,
    ) -> impl Iterator<Item = &'a StateTransition> + 'a {
        self.transitions.iter().filter(move |t| t.from_state == state)
    }

    // -- parameters ---------------------------------------------------------

    /// Declare a parameter. Returns `false` if the name is taken.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        param_type: ParameterType,
        default_value: ParameterValue,
    ) -> bool {
        let name = name.into();
        if self.parameter(&name).is_some() {
            return false;
        }
        self.parameters.push(AnimatorParameter {
            name,
            param_type,
            default_value: default_value.coerce_to(param_type),
        });
        true
    }

    pub fn parameter(&self, name: &str) -> Option<&AnimatorParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn remove_parameter(&mut self, name: &str) -> bool {
        let before = self.parameters.len();
        self.parameters.retain(|p| p.name != name);
        self.parameters.len() != before
    }

    /// Bring parameter defaults and condition thresholds to the declared
    /// type of the parameter they belong to. Conditions naming an undeclared
    /// parameter keep their authored value.
    fn coerce_values(&mut self) {
        for p in &mut self.parameters {
            p.default_value = p.default_value.coerce_to(p.param_type);
        }
        let conditions = self
            .transitions
            .iter_mut()
            .flat_map(|t| t.conditions.iter_mut());
        for condition in conditions {
            if let Some(p) = self.parameters.iter().find(|p| p.name == condition.parameter) {
                condition.value = condition.value.coerce_to(p.param_type);
            }
        }
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        super::to_json("animator controller", &self.metadata, self)
    }
}

impl Asset for AnimatorController {
    fn asset_type(&self) -> AssetType {
        AssetType::AnimatorController
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        let parsed: AnimatorController =
            super::parse_json("animator controller", data, &mut self.metadata)?;
        self.parameters = parsed.parameters;
        self.states = parsed.states;
        self.transitions = parsed.transitions;
        self.default_state = parsed.default_state;
        self.coerce_values();
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.parameters = Vec::new();
        self.states = Vec::new();
        self.transitions = Vec::new();
        self.default_state.clear();
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.parameters.len() * std::mem::size_of::<AnimatorParameter>()
            + self.states.len() * std::mem::size_of::<AnimationState>()
            + self
                .transitions
                .iter()
                .map(|t| {
                    std::mem::size_of::<StateTransition>()
                        + t.conditions.len() * std::mem::size_of::<TransitionCondition>()
                })
                .sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
