use serde::{Deserialize, Serialize};

use super::pattern::{PhaseKind, PhasePattern};
use crate::error::ValidationError;

/// Everything the engine needs to run one session.
///
/// Built by the host from its settings and handed to `start()`; the engine
/// keeps its own copy, so later settings edits never reach a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub pattern: PhasePattern,
    pub cycle_target: u32,
    /// When set, `cycle_target` is display-only and the session never auto-stops.
    #[serde(default)]
    pub is_infinite: bool,
}

impl SessionConfig {
    pub fn new(pattern: PhasePattern, cycle_target: u32) -> Self {
        Self {
            pattern,
            cycle_target,
            is_infinite: false,
        }
    }

    pub fn infinite(pattern: PhasePattern) -> Self {
        Self {
            pattern,
            cycle_target: 1,
            is_infinite: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pattern.validate()?;
        if !self.is_infinite && self.cycle_target < 1 {
            return Err(ValidationError::ZeroCycleTarget);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Only meaningful while Running (and frozen once Stopped).
    pub current_phase_index: usize,
    pub phase_elapsed_secs: f64,
    pub completed_cycles: u32,
    pub total_elapsed_secs: u64,
}

impl SessionState {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_elapsed_secs: self.total_elapsed_secs,
            completed_cycles: self.completed_cycles,
        }
    }
}

/// What a finished session reports: whole seconds and fully completed cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_elapsed_secs: u64,
    pub completed_cycles: u32,
}

/// State published to subscribers after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub phase: Option<PhaseKind>,
    pub phase_index: usize,
    /// 0.0 ..= 1.0 progress within the current phase.
    pub phase_progress: f64,
    pub total_elapsed_secs: u64,
    pub completed_cycles: u32,
    pub cycle_target: u32,
    pub is_infinite: bool,
}

impl SessionSnapshot {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_elapsed_secs: self.total_elapsed_secs,
            completed_cycles: self.completed_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_config_requires_a_cycle() {
        let cfg = SessionConfig::new(PhasePattern::four_seven_eight(), 0);
        assert_eq!(cfg.validate(), Err(ValidationError::ZeroCycleTarget));
    }

    #[test]
    fn infinite_config_ignores_cycle_target() {
        let mut cfg = SessionConfig::infinite(PhasePattern::four_seven_eight());
        cfg.cycle_target = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialized_empty_pattern_is_rejected() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"pattern":{"phases":[]},"cycle_target":3}"#).unwrap();
        assert_eq!(cfg.validate(), Err(ValidationError::EmptyPattern));
    }

    #[test]
    fn default_state_is_idle_and_zeroed() {
        let state = SessionState::default();
        assert_eq!(state.status, SessionStatus::Idle);
        assert_eq!(state.summary(), SessionSummary::default());
    }
}
