//! Integration tests for breathing sessions.
//!
//! These tests drive sessions through the public API the way a host does:
//! settings on disk become a session configuration, the session runs on
//! paused tokio time, and the host observes events and snapshots.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use breathe_core::{
    BreathEngine, BreathingSession, Config, CueError, CuePlayer, Event, Exercise, FinishReason,
    PhaseKind, PhasePattern, SessionConfig, SessionStatus, SilentCuePlayer,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

#[derive(Default)]
struct CueLog(Mutex<Vec<String>>);

impl CuePlayer for CueLog {
    fn play(&self, cue: &str) -> Result<(), CueError> {
        self.0.lock().unwrap().push(cue.to_string());
        Ok(())
    }
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_settings_file_drives_a_custom_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.set("custom.inhale_secs", "2").unwrap();
    config.set("custom.hold_secs", "1").unwrap();
    config.set("custom.exhale_secs", "3").unwrap();
    config.set("session.cycle_target", "2").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    let session_config = loaded.session_config(Exercise::Custom).unwrap();
    assert_eq!(session_config.pattern.cycle_duration(), Duration::from_secs(6));

    let cues = Arc::new(CueLog::default());
    let session = BreathingSession::with_timing(cues.clone(), loaded.tick_settings());
    let mut events = session.events();
    session.start(session_config).await.unwrap();

    let summary = session.finished().await;
    assert_eq!(summary.completed_cycles, 2);
    assert_eq!(summary.total_elapsed_secs, 12);

    let events = drain(&mut events);
    assert!(matches!(events.first(), Some(Event::SessionStarted { cycle_target: 2, .. })));
    assert!(matches!(
        events.last(),
        Some(Event::SessionFinished { reason: FinishReason::TargetReached, .. })
    ));
    let session_id = events[0].session_id();
    assert!(events.iter().all(|e| e.session_id() == session_id));

    let entered = events
        .iter()
        .filter(|e| matches!(e, Event::PhaseEntered { .. }))
        .count();
    let cycles: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::CycleCompleted { completed_cycles, .. } => Some(*completed_cycles),
            _ => None,
        })
        .collect();
    assert_eq!(entered, 6);
    assert_eq!(cycles, vec![1, 2]);
    assert_eq!(
        *cues.0.lock().unwrap(),
        vec!["Inhale", "Hold", "Exhale", "Inhale", "Hold", "Exhale"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_phase_discards_partial_progress() {
    let session = BreathingSession::new(Arc::new(SilentCuePlayer));
    let mut events = session.events();
    session
        .start(SessionConfig::new(PhasePattern::box_breathing(4).unwrap(), 2))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let running = session.snapshot().await;
    assert_eq!(running.status, SessionStatus::Running);
    assert_eq!(running.phase, Some(PhaseKind::Exhale));
    assert_eq!(running.total_elapsed_secs, 10);

    let summary = session.stop().await;
    assert_eq!(summary.completed_cycles, 0);
    assert_eq!(summary.total_elapsed_secs, 10);
    assert!(matches!(
        drain(&mut events).last(),
        Some(Event::SessionFinished { reason: FinishReason::Stopped, .. })
    ));

    tokio::time::sleep(Duration::from_secs(30)).await;
    let after = session.snapshot().await;
    assert_eq!(after.status, SessionStatus::Stopped);
    assert_eq!(after.total_elapsed_secs, 10);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_watchers_observe_the_final_snapshot() {
    let session = BreathingSession::new(Arc::new(SilentCuePlayer));
    let mut snapshots = session.subscribe();
    session
        .start(SessionConfig::new(PhasePattern::four_seven_eight(), 1))
        .await
        .unwrap();

    let last = snapshots
        .wait_for(|s| s.status == SessionStatus::Stopped)
        .await
        .unwrap()
        .clone();
    assert_eq!(last.phase, Some(PhaseKind::Exhale));
    assert_eq!(last.phase_progress, 1.0);
    assert_eq!(last.completed_cycles, 1);
    assert_eq!(last.total_elapsed_secs, 19);
}

#[test]
fn test_engine_catches_up_after_host_suspension() {
    let mut engine = BreathEngine::new();
    let t0 = Instant::now();
    engine
        .start(SessionConfig::infinite(PhasePattern::box_breathing(4).unwrap()), t0)
        .unwrap();
    let generation = engine.generation();

    // Nothing ticked for 37 seconds.
    let resumed = t0 + Duration::from_secs(37);
    let events = engine.tick_progress(generation, resumed);
    let entered = events
        .iter()
        .filter(|e| matches!(e, Event::PhaseEntered { .. }))
        .count();
    assert_eq!(entered, 9);
    assert_eq!(engine.state().completed_cycles, 2);
    assert_eq!(engine.state().current_phase_index, 1);
    assert_eq!(engine.tick_elapsed(generation, resumed), Some(37));

    let snap = engine.snapshot();
    assert_eq!(snap.phase, Some(PhaseKind::Hold));
    assert!((snap.phase_progress - 0.25).abs() < 1e-9);
}

#[test]
fn test_suspended_finite_session_stops_at_its_last_boundary() {
    let mut engine = BreathEngine::new();
    let t0 = Instant::now();
    engine
        .start(SessionConfig::new(PhasePattern::box_breathing(4).unwrap(), 2), t0)
        .unwrap();
    let generation = engine.generation();

    let events = engine.tick_progress(generation, t0 + Duration::from_secs(90));
    assert!(matches!(
        events.last(),
        Some(Event::SessionFinished { reason: FinishReason::TargetReached, .. })
    ));
    assert_eq!(engine.status(), SessionStatus::Stopped);
    assert_eq!(engine.summary().completed_cycles, 2);
    assert_eq!(engine.summary().total_elapsed_secs, 32);

    // Stale ticks from the finished session change nothing.
    assert!(engine.tick_progress(generation, t0 + Duration::from_secs(120)).is_empty());
    assert_eq!(engine.tick_elapsed(generation, t0 + Duration::from_secs(120)), None);
    assert_eq!(engine.summary().total_elapsed_secs, 32);
}
