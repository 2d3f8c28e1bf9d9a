//! # Breathe Core Library
//!
//! This library provides the core logic for Breathe, a guided breathing
//! exercise timer. Hosts (the `breathe` CLI, or any GUI) build a
//! [`SessionConfig`] from their settings, run it on a [`BreathingSession`],
//! and render the [`SessionSnapshot`]s it publishes.
//!
//! ## Architecture
//!
//! - **Engine**: A wall-clock-based state machine ([`BreathEngine`]) that
//!   advances through the phases of a [`PhasePattern`] and counts cycles
//!   against a target
//! - **Driver**: [`BreathingSession`] runs the engine on two tokio tickers and
//!   dispatches cues at phase boundaries
//! - **Cues**: [`CuePlayer`] trait for fire-and-forget audio prompts
//! - **Storage**: TOML-based user settings ([`Config`])
//!
//! Box breathing, 4-7-8 and custom patterns are all plain [`PhasePattern`]
//! data driven by the same engine.

pub mod cue;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use cue::{CuePlayer, SharedCuePlayer, SilentCuePlayer};
#[cfg(feature = "audio")]
pub use cue::SoundCuePlayer;
pub use error::{ConfigError, CoreError, CueError, Result, SessionError, ValidationError};
pub use events::{Event, FinishReason};
pub use storage::Config;
pub use timer::{
    BreathEngine, BreathingSession, Exercise, Phase, PhaseKind, PhasePattern, SessionConfig,
    SessionSnapshot, SessionState, SessionStatus, SessionSummary, TickSettings,
};
