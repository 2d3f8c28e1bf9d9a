use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Allowed side length for box breathing, in seconds.
pub const BOX_SIDE_RANGE: (u64, u64) = (2, 16);
/// Allowed length of each custom phase, in seconds.
pub const CUSTOM_PHASE_RANGE: (u64, u64) = (1, 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
}

impl PhaseKind {
    /// Display name, also used as the cue name.
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Inhale => "Inhale",
            PhaseKind::Hold => "Hold",
            PhaseKind::Exhale => "Exhale",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl Phase {
    pub fn secs(kind: PhaseKind, secs: u64) -> Self {
        Self {
            kind,
            duration_ms: secs.saturating_mul(1000),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Ordered phases making up one breathing cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePattern {
    phases: Vec<Phase>,
}

impl PhasePattern {
    /// Build a pattern, rejecting empty patterns and zero-length phases.
    pub fn new(phases: Vec<Phase>) -> Result<Self, ValidationError> {
        let pattern = Self { phases };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Inhale, Hold, Exhale, Hold, each `side_secs` long.
    pub fn box_breathing(side_secs: u64) -> Result<Self, ValidationError> {
        ValidationError::check_range("side_secs", side_secs, BOX_SIDE_RANGE.0, BOX_SIDE_RANGE.1)?;
        Self::new(vec![
            Phase::secs(PhaseKind::Inhale, side_secs),
            Phase::secs(PhaseKind::Hold, side_secs),
            Phase::secs(PhaseKind::Exhale, side_secs),
            Phase::secs(PhaseKind::Hold, side_secs),
        ])
    }

    /// The fixed 4-7-8 pattern.
    pub fn four_seven_eight() -> Self {
        Self {
            phases: vec![
                Phase::secs(PhaseKind::Inhale, 4),
                Phase::secs(PhaseKind::Hold, 7),
                Phase::secs(PhaseKind::Exhale, 8),
            ],
        }
    }

    pub fn custom(inhale_secs: u64, hold_secs: u64, exhale_secs: u64) -> Result<Self, ValidationError> {
        let (min, max) = CUSTOM_PHASE_RANGE;
        ValidationError::check_range("inhale_secs", inhale_secs, min, max)?;
        ValidationError::check_range("hold_secs", hold_secs, min, max)?;
        ValidationError::check_range("exhale_secs", exhale_secs, min, max)?;
        Self::new(vec![
            Phase::secs(PhaseKind::Inhale, inhale_secs),
            Phase::secs(PhaseKind::Hold, hold_secs),
            Phase::secs(PhaseKind::Exhale, exhale_secs),
        ])
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phases.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        if let Some(index) = self.phases.iter().position(|p| p.duration_ms == 0) {
            return Err(ValidationError::ZeroDuration { index });
        }
        Ok(())
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn cycle_duration(&self) -> Duration {
        Duration::from_millis(self.phases.iter().map(|p| p.duration_ms).sum())
    }

    pub fn breaths_per_minute(&self) -> f64 {
        let secs = self.cycle_duration().as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        60.0 / secs
    }

    /// Expected wall-clock length of a session of `cycles` full cycles.
    pub fn session_duration(&self, cycles: u32) -> Duration {
        self.cycle_duration().saturating_mul(cycles)
    }
}

/// The exercises offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    Box,
    #[serde(rename = "4-7-8")]
    FourSevenEight,
    Custom,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::Box, Exercise::FourSevenEight, Exercise::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Exercise::Box => "box",
            Exercise::FourSevenEight => "4-7-8",
            Exercise::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Exercise::Box => "Box Breathing",
            Exercise::FourSevenEight => "4-7-8 Breathing",
            Exercise::Custom => "Custom Breathing",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(Exercise::Box),
            "4-7-8" | "478" => Ok(Exercise::FourSevenEight),
            "custom" => Ok(Exercise::Custom),
            other => Err(format!("unknown exercise: {other} (expected box, 4-7-8 or custom)")),
        }
    }
}
