use std::io::Write;
use std::sync::Arc;

use breathe_core::{
    BreathingSession, Config, CueError, CuePlayer, Event, Exercise, Result, SessionConfig,
    SessionSnapshot, SessionStatus, SessionSummary, SharedCuePlayer, SilentCuePlayer,
};
use clap::Args;
use tracing::debug;

const BAR_WIDTH: usize = 20;

#[derive(Args)]
pub struct RunArgs {
    /// Exercise to run: box, 4-7-8 or custom
    pub exercise: Exercise,
    /// Number of cycles before the session stops
    #[arg(long)]
    pub cycles: Option<u32>,
    /// Keep going until interrupted
    #[arg(long, conflicts_with = "cycles")]
    pub infinite: bool,
    /// Box breathing side length in seconds (2-16)
    #[arg(long)]
    pub side_secs: Option<u64>,
    /// Custom inhale length in seconds (1-30)
    #[arg(long)]
    pub inhale: Option<u64>,
    /// Custom hold length in seconds (1-30)
    #[arg(long)]
    pub hold: Option<u64>,
    /// Custom exhale length in seconds (1-30)
    #[arg(long)]
    pub exhale: Option<u64>,
    /// Disable cues
    #[arg(long)]
    pub mute: bool,
    /// Print events and the summary as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Rings the terminal bell on each cue, or does nothing.
struct TerminalCuePlayer {
    bell: bool,
}

impl CuePlayer for TerminalCuePlayer {
    fn play(&self, cue: &str) -> Result<(), CueError> {
        debug!(cue, "cue");
        if self.bell {
            let mut err = std::io::stderr();
            err.write_all(b"\x07")
                .and_then(|_| err.flush())
                .map_err(|e| CueError::Playback {
                    cue: cue.to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Apply command-line overrides on top of the stored settings.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(cycles) = args.cycles {
        config.session.cycle_target = cycles;
        config.session.infinite = false;
    }
    if args.infinite {
        config.session.infinite = true;
    }
    if let Some(side) = args.side_secs {
        config.box_breathing.side_secs = side;
    }
    if let Some(inhale) = args.inhale {
        config.custom.inhale_secs = inhale;
    }
    if let Some(hold) = args.hold {
        config.custom.hold_secs = hold;
    }
    if let Some(exhale) = args.exhale {
        config.custom.exhale_secs = exhale;
    }
}

fn cue_player(config: &Config, mute: bool) -> SharedCuePlayer {
    if mute || !config.cues.enabled {
        return Arc::new(SilentCuePlayer);
    }

    if let Some(player) = sound_player(config) {
        return player;
    }
    Arc::new(TerminalCuePlayer {
        bell: config.cues.bell,
    })
}

#[cfg(feature = "audio")]
fn sound_player(config: &Config) -> Option<SharedCuePlayer> {
    if config.cues.sounds.is_empty() {
        return None;
    }
    match breathe_core::SoundCuePlayer::new(config.sound_map(), config.cue_volume()) {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            tracing::warn!(error = %e, "sound cues unavailable; falling back to terminal");
            None
        }
    }
}

#[cfg(not(feature = "audio"))]
fn sound_player(_config: &Config) -> Option<SharedCuePlayer> {
    None
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &args);
    let session_config = config.session_config(args.exercise)?;

    let session = BreathingSession::with_timing(cue_player(&config, args.mute), config.tick_settings());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(drive(&session, session_config, args.exercise, args.json))?;

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!(
            "Session complete: {} {} in {}",
            summary.completed_cycles,
            if summary.completed_cycles == 1 { "cycle" } else { "cycles" },
            format_clock(summary.total_elapsed_secs)
        );
    }
    Ok(())
}

async fn drive(
    session: &BreathingSession,
    config: SessionConfig,
    exercise: Exercise,
    json: bool,
) -> Result<SessionSummary> {
    let mut snapshots = session.subscribe();
    let mut events = session.events();

    if !json {
        println!("{} - press Ctrl-C to stop", exercise.label());
    }
    session.start(config).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_line = String::new();

    let summary = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                break session.stop().await;
            }
            Ok(event) = events.recv() => {
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                }
                if let Event::SessionFinished { summary, .. } = event {
                    break summary;
                }
            }
            Ok(()) = snapshots.changed() => {
                let snap = snapshots.borrow_and_update().clone();
                if !json {
                    let line = status_line(&snap);
                    if line != last_line {
                        print!("\r{line}");
                        std::io::stdout().flush()?;
                        last_line = line;
                    }
                }
                if snap.status == SessionStatus::Stopped {
                    break snap.summary();
                }
            }
        }
    };

    if json {
        while let Ok(event) = events.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(summary)
}

fn status_line(snap: &SessionSnapshot) -> String {
    let phase = snap.phase.map(|p| p.as_str()).unwrap_or("-");
    let filled = (snap.phase_progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let target = if snap.is_infinite {
        "inf".to_string()
    } else {
        snap.cycle_target.to_string()
    };
    format!(
        "{phase:<6} [{bar}]  cycle {}/{target}  {}",
        snap.completed_cycles,
        format_clock(snap.total_elapsed_secs)
    )
}

fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use breathe_core::PhaseKind;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(32), "00:32");
        assert_eq!(format_clock(19 * 60 + 5), "19:05");
    }

    #[test]
    fn status_line_shows_phase_progress_and_cycles() {
        let snap = SessionSnapshot {
            status: SessionStatus::Running,
            phase: Some(PhaseKind::Hold),
            phase_index: 1,
            phase_progress: 0.5,
            total_elapsed_secs: 65,
            completed_cycles: 1,
            cycle_target: 4,
            is_infinite: false,
        };
        assert_eq!(
            status_line(&snap),
            "Hold   [##########..........]  cycle 1/4  01:05"
        );
    }

    #[test]
    fn overrides_replace_stored_settings() {
        let cli = TestCli::parse_from(["breathe", "custom", "--cycles", "2", "--hold", "7"]);
        let mut config = Config::default();
        config.session.infinite = true;
        apply_overrides(&mut config, &cli.args);
        assert_eq!(config.session.cycle_target, 2);
        assert!(!config.session.infinite);
        assert_eq!(config.custom.hold_secs, 7);
        assert_eq!(config.custom.inhale_secs, 4);
    }

    #[test]
    fn infinite_conflicts_with_cycles() {
        assert!(TestCli::try_parse_from(["breathe", "box", "--cycles", "2", "--infinite"]).is_err());
    }

    #[test]
    fn muted_runs_use_the_silent_player() {
        let player = cue_player(&Config::default(), true);
        assert!(player.play("Inhale").is_ok());
    }
}
