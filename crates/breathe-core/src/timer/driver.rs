//! Async session driver.
//!
//! Runs a [`BreathEngine`] on two tokio tickers: a one-second elapsed ticker
//! and a fine-grained progress ticker. Every engine mutation, snapshot
//! publication and cue dispatch happens under the engine mutex, so once
//! `stop()` has returned no ticker can touch the session again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::warn;

use super::engine::BreathEngine;
use super::state::{SessionConfig, SessionSnapshot, SessionStatus, SessionSummary};
use crate::cue::SharedCuePlayer;
use crate::error::Result;
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

/// Ticker periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    pub progress_interval: Duration,
    pub elapsed_interval: Duration,
}

impl TickSettings {
    pub fn with_progress_ms(progress_ms: u64) -> Self {
        Self {
            progress_interval: Duration::from_millis(progress_ms.max(1)),
            ..Self::default()
        }
    }
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(16),
            elapsed_interval: Duration::from_secs(1),
        }
    }
}

struct Shared {
    engine: Mutex<BreathEngine>,
    cues: SharedCuePlayer,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<Event>,
}

impl Shared {
    /// Must be called with the engine lock held.
    fn publish(&self, engine: &BreathEngine, events: Vec<Event>) {
        // After a catch-up only the phase actually being entered is cued.
        if let Some(cue) = events.iter().rev().find_map(Event::cue) {
            if let Err(e) = self.cues.play(cue.as_str()) {
                warn!(cue = %cue, error = %e, "cue playback failed; continuing");
            }
        }
        self.snapshots.send_replace(engine.snapshot());
        for event in events {
            let _ = self.events.send(event);
        }
    }
}

/// A breathing session host: owns the engine and its tickers.
#[derive(Clone)]
pub struct BreathingSession {
    shared: Arc<Shared>,
    tickers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    timing: TickSettings,
}

impl BreathingSession {
    pub fn new(cues: SharedCuePlayer) -> Self {
        Self::with_timing(cues, TickSettings::default())
    }

    pub fn with_timing(cues: SharedCuePlayer, timing: TickSettings) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(BreathEngine::new()),
                cues,
                snapshots,
                events,
            }),
            tickers: Arc::new(Mutex::new(Vec::new())),
            timing,
        }
    }

    pub fn timing(&self) -> TickSettings {
        self.timing
    }

    /// Snapshots published after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.engine.lock().await.snapshot()
    }

    /// Start a session. Returns once the tickers are scheduled; the first
    /// phase's cue has already been dispatched.
    pub async fn start(&self, config: SessionConfig) -> Result<()> {
        // Tickers before engine, here and in `stop`, so a concurrent stop can
        // never abort the tickers of a newer session.
        let mut tickers = self.tickers.lock().await;

        let now = Instant::now();
        let generation = {
            let mut engine = self.shared.engine.lock().await;
            let events = engine.start(config, now)?;
            self.shared.publish(&engine, events);
            engine.generation()
        };

        for handle in tickers.drain(..) {
            handle.abort();
        }
        tickers.push(spawn_elapsed_ticker(
            self.shared.clone(),
            generation,
            now,
            self.timing.elapsed_interval,
        ));
        tickers.push(spawn_progress_ticker(
            self.shared.clone(),
            generation,
            self.timing.progress_interval,
        ));
        Ok(())
    }

    /// Stop the session and return its summary. Idempotent.
    pub async fn stop(&self) -> SessionSummary {
        // Same lock order as `start`: tickers, then engine.
        let mut tickers = self.tickers.lock().await;
        let summary = {
            let mut engine = self.shared.engine.lock().await;
            let (summary, event) = engine.stop(Instant::now());
            if let Some(event) = event {
                self.shared.publish(&engine, vec![event]);
            }
            summary
        };

        for handle in tickers.drain(..) {
            handle.abort();
        }
        summary
    }

    /// Wait until the current (or most recent) session has stopped.
    pub async fn finished(&self) -> SessionSummary {
        let mut rx = self.subscribe();
        let done = rx
            .wait_for(|s| s.status == SessionStatus::Stopped)
            .await
            .map(|s| s.summary());
        match done {
            Ok(summary) => summary,
            Err(_) => self.shared.engine.lock().await.summary(),
        }
    }
}

fn spawn_elapsed_ticker(
    shared: Arc<Shared>,
    generation: u64,
    started_at: Instant,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(started_at + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let mut engine = shared.engine.lock().await;
            if !engine.is_current(generation) {
                break;
            }
            if engine.tick_elapsed(generation, Instant::now()).is_some() {
                shared.publish(&engine, Vec::new());
            }
        }
    })
}

fn spawn_progress_ticker(shared: Arc<Shared>, generation: u64, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let mut engine = shared.engine.lock().await;
            if !engine.is_current(generation) {
                break;
            }
            let events = engine.tick_progress(generation, Instant::now());
            shared.publish(&engine, events);
        }
    })
}
