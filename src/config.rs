//! Planner configuration: tunables, defaults, YAML loading, and typed
//! runtime updates.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Motion model driving primary node expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModel {
    /// Expansion over a precomputed motion-primitive lattice.
    StateLattice,
    /// Forward-only circular arcs. Not implemented by this planner.
    Dubins,
    /// Forward and reverse circular arcs. Not implemented by this planner.
    ReedsShepp,
}

impl MotionModel {
    /// Parse a model from its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "state_lattice" => Some(Self::StateLattice),
            "dubins" => Some(Self::Dubins),
            "reeds_shepp" => Some(Self::ReedsShepp),
            _ => None,
        }
    }
}

impl std::fmt::Display for MotionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StateLattice => "state_lattice",
            Self::Dubins => "dubins",
            Self::ReedsShepp => "reeds_shepp",
        };
        write!(f, "{}", name)
    }
}

/// A typed runtime parameter value.
///
/// The closed set of value kinds the configuration surface accepts; each
/// parameter name maps to exactly one kind in
/// [`SearchConfig::apply_update`].
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Floating-point parameter.
    Float(f64),
    /// Integer parameter.
    Int(i64),
    /// Boolean parameter.
    Bool(bool),
    /// String parameter.
    Str(String),
}

mod defaults {
    use super::MotionModel;
    use std::path::PathBuf;

    pub fn motion_model() -> MotionModel {
        MotionModel::StateLattice
    }
    pub fn allow_unknown() -> bool {
        true
    }
    pub fn max_iterations() -> i64 {
        1_000_000
    }
    pub fn max_planning_time() -> f32 {
        5.0
    }
    pub fn lattice_filepath() -> PathBuf {
        PathBuf::from("default_model.json")
    }
    pub fn cache_obstacle_heuristic() -> bool {
        false
    }
    pub fn reverse_penalty() -> f32 {
        2.0
    }
    pub fn change_penalty() -> f32 {
        0.05
    }
    pub fn non_straight_penalty() -> f32 {
        1.05
    }
    pub fn cost_penalty() -> f32 {
        2.0
    }
    pub fn analytic_expansion_ratio() -> f32 {
        3.5
    }
    pub fn lookup_table_size() -> f32 {
        20.0
    }
    pub fn allow_reverse_expansion() -> bool {
        false
    }
}

/// All planner tunables.
///
/// An immutable snapshot of this struct configures one search engine
/// instance; runtime updates build a new snapshot and replace the engine
/// rather than mutating it in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Motion model for node expansion.
    #[serde(default = "defaults::motion_model")]
    pub motion_model: MotionModel,

    /// Permit traversal through unmapped cells.
    #[serde(default = "defaults::allow_unknown")]
    pub allow_unknown: bool,

    /// Maximum search expansions; zero or negative disables the limit.
    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: i64,

    /// Wall-clock planning budget in seconds, including smoothing.
    #[serde(default = "defaults::max_planning_time")]
    pub max_planning_time: f32,

    /// Lattice file describing the motion primitives.
    #[serde(default = "defaults::lattice_filepath")]
    pub lattice_filepath: PathBuf,

    /// Keep the heuristic window across plans with an unchanged goal.
    #[serde(default = "defaults::cache_obstacle_heuristic")]
    pub cache_obstacle_heuristic: bool,

    /// Cost multiplier for reverse primitives.
    #[serde(default = "defaults::reverse_penalty")]
    pub reverse_penalty: f32,

    /// Added cost fraction when travel direction flips.
    #[serde(default = "defaults::change_penalty")]
    pub change_penalty: f32,

    /// Cost multiplier for curved primitives.
    #[serde(default = "defaults::non_straight_penalty")]
    pub non_straight_penalty: f32,

    /// Linear weight of traversed-cell cost in edge pricing.
    #[serde(default = "defaults::cost_penalty")]
    pub cost_penalty: f32,

    /// Analytic expansion frequency divisor; zero disables shortcuts.
    #[serde(default = "defaults::analytic_expansion_ratio")]
    pub analytic_expansion_ratio: f32,

    /// Heuristic window size in meters.
    #[serde(default = "defaults::lookup_table_size")]
    pub lookup_table_size: f32,

    /// Expand reverse motions in addition to forward ones.
    #[serde(default = "defaults::allow_reverse_expansion")]
    pub allow_reverse_expansion: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            motion_model: defaults::motion_model(),
            allow_unknown: defaults::allow_unknown(),
            max_iterations: defaults::max_iterations(),
            max_planning_time: defaults::max_planning_time(),
            lattice_filepath: defaults::lattice_filepath(),
            cache_obstacle_heuristic: defaults::cache_obstacle_heuristic(),
            reverse_penalty: defaults::reverse_penalty(),
            change_penalty: defaults::change_penalty(),
            non_straight_penalty: defaults::non_straight_penalty(),
            cost_penalty: defaults::cost_penalty(),
            analytic_expansion_ratio: defaults::analytic_expansion_ratio(),
            lookup_table_size: defaults::lookup_table_size(),
            allow_reverse_expansion: defaults::allow_reverse_expansion(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PlannerError::InvalidConfiguration(format!(
                "cannot read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SearchConfig = serde_yaml::from_str(yaml)
            .map_err(|e| PlannerError::InvalidConfiguration(format!("bad config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is one this planner can execute.
    pub fn validate(&self) -> Result<()> {
        if self.motion_model != MotionModel::StateLattice {
            return Err(PlannerError::InvalidConfiguration(format!(
                "motion model '{}' is not supported by the lattice planner",
                self.motion_model
            )));
        }
        if self.non_straight_penalty < 1.0 {
            warn!(
                "non_straight_penalty {} < 1.0 discounts turning and can break optimality",
                self.non_straight_penalty
            );
        }
        if self.reverse_penalty < 1.0 {
            warn!(
                "reverse_penalty {} < 1.0 discounts reversing and can break optimality",
                self.reverse_penalty
            );
        }
        if self.change_penalty < 0.0 {
            return Err(PlannerError::InvalidConfiguration(
                "change_penalty must be non-negative".to_string(),
            ));
        }
        if self.cost_penalty < 0.0 {
            return Err(PlannerError::InvalidConfiguration(
                "cost_penalty must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Iteration budget with the unbounded sentinel applied.
    #[inline]
    pub fn effective_max_iterations(&self) -> usize {
        if self.max_iterations <= 0 {
            usize::MAX
        } else {
            self.max_iterations as usize
        }
    }

    /// Heuristic window dimension in cells for a grid resolution; whole
    /// and odd (even counts gain one).
    pub fn lookup_table_dim(&self, resolution: f32) -> usize {
        let dim = (self.lookup_table_size / resolution) as usize;
        if dim % 2 == 0 {
            dim + 1
        } else {
            dim
        }
    }

    /// Apply one named runtime update.
    ///
    /// Returns whether the configuration changed (and dependent objects
    /// need rebuilding). Unknown names and mismatched value kinds are
    /// logged and ignored, leaving the configuration untouched.
    pub fn apply_update(&mut self, name: &str, value: &ParamValue) -> bool {
        use ParamValue::*;
        match (name, value) {
            ("allow_unknown", Bool(v)) => self.allow_unknown = *v,
            ("cache_obstacle_heuristic", Bool(v)) => self.cache_obstacle_heuristic = *v,
            ("allow_reverse_expansion", Bool(v)) => self.allow_reverse_expansion = *v,
            ("max_iterations", Int(v)) => self.max_iterations = *v,
            ("max_planning_time", Float(v)) => self.max_planning_time = *v as f32,
            ("reverse_penalty", Float(v)) => self.reverse_penalty = *v as f32,
            ("change_penalty", Float(v)) => self.change_penalty = *v as f32,
            ("non_straight_penalty", Float(v)) => self.non_straight_penalty = *v as f32,
            ("cost_penalty", Float(v)) => self.cost_penalty = *v as f32,
            ("analytic_expansion_ratio", Float(v)) => self.analytic_expansion_ratio = *v as f32,
            ("lookup_table_size", Float(v)) => self.lookup_table_size = *v as f32,
            ("lattice_filepath", Str(v)) => self.lattice_filepath = PathBuf::from(v),
            ("motion_model", Str(v)) => match MotionModel::from_name(v) {
                Some(model) => self.motion_model = model,
                None => {
                    warn!("unknown motion model '{}', keeping {}", v, self.motion_model);
                    return false;
                }
            },
            _ => {
                warn!("ignoring parameter update '{}' with mismatched or unknown name", name);
                return false;
            }
        }
        true
    }
}
