//! Breathing session engine.
//!
//! The engine is a wall-clock-based state machine. It owns no threads or
//! timers: the caller passes the current monotonic `Instant` to every
//! command, which lets the driver run it on tokio tickers and lets tests run
//! it on virtual time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Stopped -> Running -> ...
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathEngine::new();
//! let events = engine.start(config, Instant::now())?;
//! let generation = engine.generation();
//! // On the progress ticker:
//! engine.tick_progress(generation, Instant::now());
//! // On the one-second ticker:
//! engine.tick_elapsed(generation, Instant::now());
//! ```
//!
//! ## Timing
//!
//! Phase progress is measured against the phase anchor, the monotonic
//! instant the current phase began. A phase's anchor is the previous
//! anchor plus the previous duration, so a late tick never shifts the
//! schedule. A very late tick (host suspended) walks the boundaries one by
//! one, so each boundary is crossed exactly once.

use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::state::{SessionConfig, SessionSnapshot, SessionState, SessionStatus, SessionSummary};
use crate::error::SessionError;
use crate::events::{Event, FinishReason};

#[derive(Debug, Clone, Default)]
pub struct BreathEngine {
    config: Option<SessionConfig>,
    state: SessionState,
    session_id: Option<Uuid>,
    session_anchor: Option<Instant>,
    phase_anchor: Option<Instant>,
    /// Bumped on every start and stop. Tick callbacks carry the generation
    /// they were spawned for and are ignored once it is stale.
    generation: u64,
}

impl BreathEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while `generation` belongs to the running session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.state.status == SessionStatus::Running && self.generation == generation
    }

    /// Summary of the current or most recent session.
    pub fn summary(&self) -> SessionSummary {
        self.state.summary()
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let Some(duration) = self.current_phase_duration() else {
            return 0.0;
        };
        let total = duration.as_secs_f64();
        if total == 0.0 {
            return 0.0;
        }
        (self.state.phase_elapsed_secs / total).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = match self.state.status {
            SessionStatus::Idle => None,
            SessionStatus::Running | SessionStatus::Stopped => self
                .config
                .as_ref()
                .and_then(|c| c.pattern.get(self.state.current_phase_index))
                .map(|p| p.kind),
        };
        SessionSnapshot {
            status: self.state.status,
            phase,
            phase_index: self.state.current_phase_index,
            phase_progress: if phase.is_some() { self.phase_progress() } else { 0.0 },
            total_elapsed_secs: self.state.total_elapsed_secs,
            completed_cycles: self.state.completed_cycles,
            cycle_target: self.config.as_ref().map(|c| c.cycle_target).unwrap_or(0),
            is_infinite: self.config.as_ref().map(|c| c.is_infinite).unwrap_or(false),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session in phase 0.
    ///
    /// Returns `SessionStarted` followed by the `PhaseEntered` event for the
    /// first phase, whose cue the caller should play immediately.
    pub fn start(&mut self, config: SessionConfig, now: Instant) -> Result<Vec<Event>, SessionError> {
        if self.state.status == SessionStatus::Running {
            return Err(SessionError::AlreadyRunning);
        }
        config.validate()?;

        let session_id = Uuid::new_v4();
        self.generation = self.generation.wrapping_add(1);
        self.state = SessionState {
            status: SessionStatus::Running,
            ..SessionState::default()
        };
        self.session_id = Some(session_id);
        self.session_anchor = Some(now);
        self.phase_anchor = Some(now);

        let started = Event::SessionStarted {
            session_id,
            phase_count: config.pattern.len(),
            cycle_target: config.cycle_target,
            is_infinite: config.is_infinite,
            at: Utc::now(),
        };
        info!(
            %session_id,
            phases = config.pattern.len(),
            cycle_target = config.cycle_target,
            infinite = config.is_infinite,
            "breathing session started"
        );
        self.config = Some(config);

        let mut events = vec![started];
        events.extend(self.phase_entered_event());
        Ok(events)
    }

    /// Recompute phase progress from the phase anchor and perform any phase
    /// transitions whose boundary lies at or before `now`.
    pub fn tick_progress(&mut self, generation: u64, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.is_current(generation) {
            return events;
        }
        let Some(mut anchor) = self.phase_anchor else {
            return events;
        };

        while let Some(duration) = self.current_phase_duration() {
            let elapsed = now.saturating_duration_since(anchor);
            if elapsed < duration {
                self.state.phase_elapsed_secs = elapsed.as_secs_f64();
                break;
            }

            let boundary = anchor + duration;
            let next = (self.state.current_phase_index + 1) % self.pattern_len();
            if next == 0 {
                self.state.completed_cycles += 1;
                events.extend(self.cycle_completed_event());
                if self.target_reached() {
                    // Leave the final phase on screen as complete.
                    self.state.phase_elapsed_secs = duration.as_secs_f64();
                    events.extend(self.finish(boundary, FinishReason::TargetReached));
                    return events;
                }
            }

            self.state.current_phase_index = next;
            self.state.phase_elapsed_secs = 0.0;
            anchor = boundary;
            self.phase_anchor = Some(anchor);
            events.extend(self.phase_entered_event());
        }
        events
    }

    /// Sync whole elapsed seconds from the session anchor.
    ///
    /// Returns the new value when it changed.
    pub fn tick_elapsed(&mut self, generation: u64, now: Instant) -> Option<u64> {
        if !self.is_current(generation) {
            return None;
        }
        let secs = self.elapsed_secs_at(now)?;
        if secs <= self.state.total_elapsed_secs {
            return None;
        }
        self.state.total_elapsed_secs = secs;
        Some(secs)
    }

    /// Stop the session, returning its summary.
    ///
    /// Idempotent: once stopped, returns the same summary and no event.
    /// Before any session has run, returns a zeroed summary.
    pub fn stop(&mut self, now: Instant) -> (SessionSummary, Option<Event>) {
        if self.state.status != SessionStatus::Running {
            return (self.state.summary(), None);
        }
        let event = self.finish(now, FinishReason::Stopped);
        (self.state.summary(), event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, at: Instant, reason: FinishReason) -> Option<Event> {
        if let Some(secs) = self.elapsed_secs_at(at) {
            self.state.total_elapsed_secs = self.state.total_elapsed_secs.max(secs);
        }
        self.state.status = SessionStatus::Stopped;
        self.generation = self.generation.wrapping_add(1);
        self.session_anchor = None;
        self.phase_anchor = None;

        let summary = self.state.summary();
        let session_id = self.session_id?;
        info!(
            %session_id,
            ?reason,
            total_elapsed_secs = summary.total_elapsed_secs,
            completed_cycles = summary.completed_cycles,
            "breathing session finished"
        );
        Some(Event::SessionFinished {
            session_id,
            reason,
            summary,
            at: Utc::now(),
        })
    }

    /// Whole seconds since the session anchor, capped at the scheduled end
    /// of a finite session.
    fn elapsed_secs_at(&self, now: Instant) -> Option<u64> {
        let anchor = self.session_anchor?;
        let now = match self.config.as_ref() {
            Some(c) if !c.is_infinite => now.min(anchor + c.pattern.session_duration(c.cycle_target)),
            _ => now,
        };
        Some(now.saturating_duration_since(anchor).as_secs())
    }

    fn target_reached(&self) -> bool {
        self.config
            .as_ref()
            .map(|c| !c.is_infinite && self.state.completed_cycles >= c.cycle_target)
            .unwrap_or(false)
    }

    fn current_phase_duration(&self) -> Option<Duration> {
        self.config
            .as_ref()?
            .pattern
            .get(self.state.current_phase_index)
            .map(|p| p.duration())
    }

    fn pattern_len(&self) -> usize {
        self.config.as_ref().map(|c| c.pattern.len()).unwrap_or(1).max(1)
    }

    fn phase_entered_event(&self) -> Option<Event> {
        let session_id = self.session_id?;
        let index = self.state.current_phase_index;
        let phase = self.config.as_ref()?.pattern.get(index)?;
        debug!(%session_id, phase_index = index, phase = %phase.kind, "phase entered");
        Some(Event::PhaseEntered {
            session_id,
            phase_index: index,
            phase: phase.kind,
            duration_ms: phase.duration_ms,
            at: Utc::now(),
        })
    }

    fn cycle_completed_event(&self) -> Option<Event> {
        let session_id = self.session_id?;
        debug!(%session_id, completed = self.state.completed_cycles, "cycle completed");
        Some(Event::CycleCompleted {
            session_id,
            completed_cycles: self.state.completed_cycles,
            at: Utc::now(),
        })
    }
}
