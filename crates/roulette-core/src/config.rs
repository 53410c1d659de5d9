//! Engine tuning parameters.
//!
//! All values have defaults matching the stock game; hosts may override
//! any subset from JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning parameters shared by the orchestrator, marbles, camera and renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed simulation step in milliseconds.
    pub update_interval_ms: f32,
    /// Elapsed-time buffer cap; anything beyond is wrapped away after a stall.
    pub max_elapsed_ms: f32,
    /// Distance from the zoom line at which slow motion and zoom kick in.
    pub zoom_threshold: f32,
    /// Lower bound of the slow-motion time scale.
    pub min_time_scale: f32,
    /// How long a marble may stay motionless before it is shaken loose.
    pub stuck_delay_ms: f32,
    /// World units to pixels at camera zoom 1.
    pub initial_zoom: f32,
    /// Simulated time a finished marble stays in the physics world.
    pub goal_removal_delay_ms: f32,
    /// Whether marbles roll for the Impact skill.
    pub use_skills: bool,
    /// Rank tracked by the goal event when a race starts.
    pub winning_rank: usize,
    /// Surface size used until the host reports a real one.
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 10.0,
            max_elapsed_ms: 100.0,
            zoom_threshold: 5.0,
            min_time_scale: 0.2,
            stuck_delay_ms: 5000.0,
            initial_zoom: 30.0,
            goal_removal_delay_ms: 500.0,
            use_skills: true,
            winning_rank: 0,
            canvas_width: 1600.0,
            canvas_height: 900.0,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON string. Missing keys keep their
    /// defaults; the result is validated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the fixed-step loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, value: f32, reason: &'static str| ConfigError::InvalidValue { field, value, reason };
        let positive = [
            ("update_interval_ms", self.update_interval_ms),
            ("max_elapsed_ms", self.max_elapsed_ms),
            ("zoom_threshold", self.zoom_threshold),
            ("min_time_scale", self.min_time_scale),
            ("stuck_delay_ms", self.stuck_delay_ms),
            ("initial_zoom", self.initial_zoom),
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, value, "must be finite and larger than 0"));
            }
        }
        if !self.goal_removal_delay_ms.is_finite() || self.goal_removal_delay_ms < 0.0 {
            return Err(invalid(
                "goal_removal_delay_ms",
                self.goal_removal_delay_ms,
                "must be finite and not negative",
            ));
        }
        if self.max_elapsed_ms < self.update_interval_ms {
            return Err(invalid(
                "max_elapsed_ms",
                self.max_elapsed_ms,
                "must be at least update_interval_ms",
            ));
        }
        if self.min_time_scale > 1.0 {
            return Err(invalid("min_time_scale", self.min_time_scale, "must be at most 1"));
        }
        Ok(())
    }

    /// Serializes the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Physics step length in seconds before time scaling.
    pub fn step_seconds(&self) -> f32 {
        self.update_interval_ms / 1000.0
    }
}
