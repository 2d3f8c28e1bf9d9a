use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{PhaseKind, SessionSummary};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The configured number of cycles was completed.
    TargetReached,
    /// The user stopped the session.
    Stopped,
}

/// Every state change of a session produces an Event.
/// Hosts subscribe to them; snapshots carry the continuous progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        phase_count: usize,
        cycle_target: u32,
        is_infinite: bool,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        session_id: Uuid,
        phase_index: usize,
        phase: PhaseKind,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        session_id: Uuid,
        completed_cycles: u32,
        at: DateTime<Utc>,
    },
    SessionFinished {
        session_id: Uuid,
        reason: FinishReason,
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The cue to play for this event, if any.
    pub fn cue(&self) -> Option<PhaseKind> {
        match self {
            Event::PhaseEntered { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            Event::SessionStarted { session_id, .. }
            | Event::PhaseEntered { session_id, .. }
            | Event::CycleCompleted { session_id, .. }
            | Event::SessionFinished { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::SessionFinished {
            session_id: Uuid::nil(),
            reason: FinishReason::TargetReached,
            summary: SessionSummary {
                total_elapsed_secs: 19,
                completed_cycles: 1,
            },
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionFinished");
        assert_eq!(json["reason"], "target_reached");
        assert_eq!(json["summary"]["total_elapsed_secs"], 19);
    }

    #[test]
    fn only_phase_entries_carry_cues() {
        let entered = Event::PhaseEntered {
            session_id: Uuid::nil(),
            phase_index: 1,
            phase: PhaseKind::Hold,
            duration_ms: 7000,
            at: Utc::now(),
        };
        assert_eq!(entered.cue(), Some(PhaseKind::Hold));

        let cycle = Event::CycleCompleted {
            session_id: Uuid::nil(),
            completed_cycles: 1,
            at: Utc::now(),
        };
        assert_eq!(cycle.cue(), None);
    }
}
