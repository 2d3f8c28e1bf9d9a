mod driver;
mod engine;
mod pattern;
mod state;

pub use driver::{BreathingSession, TickSettings};
pub use engine::BreathEngine;
pub use pattern::{Exercise, Phase, PhaseKind, PhasePattern, BOX_SIDE_RANGE, CUSTOM_PHASE_RANGE};
pub use state::{SessionConfig, SessionSnapshot, SessionState, SessionStatus, SessionSummary};
