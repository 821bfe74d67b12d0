//! Planner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strider_core::moves::Move;
use strider_core::settings::PhysicsSettings;

/// Budget used when `timeout` is zero, negative or not a usable duration.
/// A search whose target is unreachable then still stops after about a
/// second.
pub const MIN_SEARCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Immutable configuration for one planner invocation.
///
/// Every field has a default, so a partial JSON object is a valid
/// configuration:
///
/// ```
/// use strider_search::settings::SearchSettings;
///
/// let s: SearchSettings =
///     serde_json::from_str(r#"{ "timeout": 2.5, "allowed_moves": "D WD" }"#).unwrap();
/// assert_eq!(s.moves().len(), 2);
/// assert!(s.always_shift);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Wall-clock budget in seconds. Values that are not a positive, finite
    /// duration get [`MIN_SEARCH_TIMEOUT`] instead; a search always has a
    /// deadline.
    pub timeout: f64,
    /// Expand every move with the run modifier held only.
    pub always_shift: bool,
    /// Never hold the run modifier. Takes precedence over `always_shift`.
    pub disable_shift: bool,
    /// Branching set. `None` (`"all"` in JSON) uses the game mode's default.
    #[serde(with = "move_set")]
    pub allowed_moves: Option<Vec<Move>>,
    /// Weight of the distance term in the frontier priority.
    pub heuristic_weight: f64,
    /// Constant applied to the raw Euclidean distance before weighting.
    pub distance_scale: f64,
    /// Quantize positions to integers for dominance pruning.
    pub simple_geometry: bool,
    /// Frontier nodes popped and expanded together per iteration.
    pub state_batch_size: usize,
    /// Children deeper than this are discarded.
    pub max_ticks: Option<u32>,
    /// Include vertical velocity, push, control and facing in the dominance
    /// key, not just position.
    pub track_velocity: bool,
    /// Transition-function knobs (mode, multipliers, run availability).
    pub physics: PhysicsSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout: 5.0,
            always_shift: true,
            disable_shift: false,
            allowed_moves: None,
            heuristic_weight: 1.0,
            distance_scale: 10.0,
            simple_geometry: false,
            state_batch_size: 1,
            max_ticks: None,
            track_velocity: false,
            physics: PhysicsSettings::default(),
        }
    }
}

impl SearchSettings {
    /// The moves each node is expanded with, in expansion order.
    pub fn moves(&self) -> &[Move] {
        match &self.allowed_moves {
            Some(list) => list,
            None => Move::defaults_for(self.physics.mode),
        }
    }

    /// Run-modifier values to try for `mv`.
    pub fn run_variants(&self, mv: Move) -> &'static [bool] {
        if self.disable_shift {
            &[false]
        } else if self.always_shift {
            &[true]
        } else if mv.benefits_from_run() {
            &[false, true]
        } else {
            &[false]
        }
    }

    /// Wall-clock budget of one search.
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(MIN_SEARCH_TIMEOUT)
    }

    /// Multiplier applied to Euclidean distance in the frontier priority.
    pub fn distance_weight(&self) -> f64 {
        self.heuristic_weight * self.distance_scale
    }

    /// Batch width, never zero.
    pub fn batch_size(&self) -> usize {
        self.state_batch_size.max(1)
    }
}

/// `allowed_moves` is written as a token string (`"all"` or `"D WD A"`).
mod move_set {
    use serde::{Deserialize, Deserializer, Serializer};
    use strider_core::moves::{parse_move_list, Move};

    pub fn serialize<S>(moves: &Option<Vec<Move>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match moves {
            None => serializer.serialize_str("all"),
            Some(list) => {
                let tokens: Vec<&str> = list.iter().map(|m| m.token()).collect();
                serializer.serialize_str(&tokens.join(" "))
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<Move>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(parse_move_list(&raw))
    }
}
