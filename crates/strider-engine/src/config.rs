//! Engine configuration: physics knobs, planner settings and runtime toggles.
//!
//! A configuration is a plain value. The tick loop never reads shared
//! mutable settings; new values are handed to
//! [`Simulation::queue_settings`](crate::simulation::Simulation::queue_settings)
//! and take effect at the next tick boundary.
//!
//! Partial updates use a flat JSON object with the option names below. Keys
//! that are unknown or carry a value of the wrong type are logged and
//! skipped; the rest are applied.
//!
//! | key                    | target                         |
//! |------------------------|--------------------------------|
//! | `timeout`              | `search.timeout` (seconds)     |
//! | `always_shift`         | `search.always_shift`          |
//! | `disable_shift`        | `search.disable_shift`         |
//! | `allowed_moves`        | `search.allowed_moves`         |
//! | `heuristic_weight`     | `search.heuristic_weight`      |
//! | `distance_scale`       | `search.distance_scale`        |
//! | `simple_geometry`      | `search.simple_geometry`       |
//! | `state_batch_size`     | `search.state_batch_size`      |
//! | `max_ticks`            | `search.max_ticks`             |
//! | `track_velocity`       | `search.track_velocity`        |
//! | `extend_deadly_hitbox` | `extend_deadly_hitbox`         |
//! | `validate_transitions` | `validate_transitions`         |
//! | `mode`                 | `physics.mode`                 |
//! | `speed_multiplier`     | `physics.speed_multiplier`     |
//! | `jump_multiplier`      | `physics.jump_multiplier`      |
//! | `run_enabled`          | `physics.run_enabled`          |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strider_core::moves::parse_move_list;
use strider_core::settings::PhysicsSettings;
use strider_search::settings::SearchSettings;

use crate::ConfigError;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Physics used for gameplay ticks and for planning.
    pub physics: PhysicsSettings,
    /// Planner settings. Its `physics` field is replaced by
    /// [`EngineConfig::physics`] whenever the engine plans.
    pub search: SearchSettings,
    /// Units added around hazard bounds in the world the planner sees.
    ///
    /// Defaults to 0 so a planned route is checked against exactly the
    /// hazards gameplay uses; raise it to keep planned routes clear of
    /// hazard edges.
    pub extend_deadly_hitbox: f64,
    /// Diff client-reported transitions against the canonical step.
    ///
    /// Defaults to on: [`Simulation::tick_observed`] is the only way client
    /// state enters the engine, and the check only reports.
    ///
    /// [`Simulation::tick_observed`]: crate::simulation::Simulation::tick_observed
    pub validate_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings::default(),
            search: SearchSettings::default(),
            extend_deadly_hitbox: 0.0,
            validate_transitions: true,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not a finite value >= 0")))
    }
}

/// Deserialize one override value, logging and discarding ill-typed ones.
fn take<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring ill-typed setting");
            None
        }
    }
}

impl EngineConfig {
    /// Parse and validate a full JSON document. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.search;
        finite_non_negative("timeout", s.timeout)?;
        finite_non_negative("heuristic_weight", s.heuristic_weight)?;
        finite_non_negative("distance_scale", s.distance_scale)?;
        if s.state_batch_size == 0 {
            return Err(invalid("state_batch_size", "must be at least 1"));
        }
        finite_non_negative("extend_deadly_hitbox", self.extend_deadly_hitbox)?;
        finite_non_negative("speed_multiplier", self.physics.speed_multiplier)?;
        finite_non_negative("jump_multiplier", self.physics.jump_multiplier)?;
        Ok(())
    }

    /// Apply a flat JSON object of overrides.
    ///
    /// Returns the number of keys applied. If the result fails
    /// [`validate`](Self::validate), `self` is left unchanged and the error is
    /// returned.
    pub fn apply_overrides(&mut self, overrides: &Value) -> Result<usize, ConfigError> {
        let Value::Object(map) = overrides else {
            return Err(ConfigError::NotAnObject);
        };

        let mut next = self.clone();
        let mut applied = 0;
        for (key, value) in map {
            let ok = match key.as_str() {
                "timeout" => take(key, value).map(|v| next.search.timeout = v),
                "always_shift" => take(key, value).map(|v| next.search.always_shift = v),
                "disable_shift" => take(key, value).map(|v| next.search.disable_shift = v),
                "allowed_moves" => take::<String>(key, value)
                    .map(|v| next.search.allowed_moves = parse_move_list(&v)),
                "heuristic_weight" => take(key, value).map(|v| next.search.heuristic_weight = v),
                "distance_scale" => take(key, value).map(|v| next.search.distance_scale = v),
                "simple_geometry" => take(key, value).map(|v| next.search.simple_geometry = v),
                "state_batch_size" => take(key, value).map(|v| next.search.state_batch_size = v),
                "max_ticks" => take(key, value).map(|v| next.search.max_ticks = v),
                "track_velocity" => take(key, value).map(|v| next.search.track_velocity = v),
                "extend_deadly_hitbox" => take(key, value).map(|v| next.extend_deadly_hitbox = v),
                "validate_transitions" => take(key, value).map(|v| next.validate_transitions = v),
                "mode" => take(key, value).map(|v| next.physics.mode = v),
                "speed_multiplier" => take(key, value).map(|v| next.physics.speed_multiplier = v),
                "jump_multiplier" => take(key, value).map(|v| next.physics.jump_multiplier = v),
                "run_enabled" => take(key, value).map(|v| next.physics.run_enabled = v),
                _ => {
                    tracing::warn!(key = %key, "ignoring unknown setting");
                    None
                }
            };
            if ok.is_some() {
                applied += 1;
            }
        }

        next.validate()?;
        *self = next;
        Ok(applied)
    }

    /// Planner settings with this configuration's physics.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            physics: self.physics,
            ..self.search.clone()
        }
    }
}
