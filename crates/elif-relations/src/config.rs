//! Relation layer configuration and builders

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use service_builder::builder;

use crate::error::{RelationError, RelationResult};

/// Environment variable toggling validation on save
pub const VALIDATE_ON_SAVE_ENV: &str = "ELIF_RELATIONS_VALIDATE_ON_SAVE";

/// Environment variable selecting the propagation mode
pub const PROPAGATION_ENV: &str = "ELIF_RELATIONS_PROPAGATION";

/// How delete propagation reacts to blocking references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Dry-run the delete before mutating anything; a `check` blocker the
    /// delete would run into aborts it with no side effects
    #[default]
    Preflight,
    /// Apply policies relation by relation; a `check` blocker aborts the
    /// delete but cascades already applied stay applied
    BestEffort,
}

impl FromStr for PropagationMode {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preflight" | "all_or_nothing" => Ok(PropagationMode::Preflight),
            "best_effort" | "best-effort" => Ok(PropagationMode::BestEffort),
            _ => Err(RelationError::Configuration(format!(
                "invalid propagation mode '{}', expected preflight or best_effort",
                s
            ))),
        }
    }
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationMode::Preflight => write!(f, "preflight"),
            PropagationMode::BestEffort => write!(f, "best_effort"),
        }
    }
}

/// Configuration for relation validation and delete propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[builder]
pub struct RelationConfig {
    /// Validate relations before every save unless disabled per call
    #[builder(default = "true", getter)]
    pub validate_on_save: bool,

    /// Delete propagation strategy
    #[builder(default = "PropagationMode::Preflight", getter)]
    pub propagation: PropagationMode,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            validate_on_save: true,
            propagation: PropagationMode::Preflight,
        }
    }
}

impl RelationConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> RelationResult<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var(VALIDATE_ON_SAVE_ENV) {
            config.validate_on_save = parse_bool(VALIDATE_ON_SAVE_ENV, &value)?;
        }

        if let Ok(value) = env::var(PROPAGATION_ENV) {
            config.propagation = value.parse()?;
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> RelationResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(RelationError::Configuration(format!(
            "invalid boolean '{}' for {}",
            value, name
        ))),
    }
}

impl RelationConfigBuilder {
    /// Validation on save and all-or-nothing propagation
    pub fn strict() -> Self {
        RelationConfigBuilder::new()
            .validate_on_save(true)
            .propagation(PropagationMode::Preflight)
    }

    /// Relation-by-relation propagation without a preflight pass
    pub fn best_effort() -> Self {
        RelationConfigBuilder::new()
            .validate_on_save(true)
            .propagation(PropagationMode::BestEffort)
    }
}
