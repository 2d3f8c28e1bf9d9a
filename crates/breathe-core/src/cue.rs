//! Audio cues played at phase boundaries.
//!
//! The session driver calls [`CuePlayer::play`] with the name of the phase
//! being entered ("Inhale", "Hold" or "Exhale") and never waits on the
//! result. Implementations must return immediately; anything slow belongs on
//! a worker. Errors are logged by the driver and otherwise ignored.

use std::sync::Arc;

use crate::error::CueError;

pub trait CuePlayer: Send + Sync {
    /// Dispatch `cue` and return without waiting for playback.
    ///
    /// Called while the session holds its engine lock: both tickers and
    /// `stop()` wait until this returns, so a blocking implementation
    /// delays every phase transition behind it.
    fn play(&self, cue: &str) -> Result<(), CueError>;
}

/// Cue player shared between the session driver and its ticker tasks.
pub type SharedCuePlayer = Arc<dyn CuePlayer>;

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCuePlayer;

impl CuePlayer for SilentCuePlayer {
    fn play(&self, _cue: &str) -> Result<(), CueError> {
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use sound::SoundCuePlayer;

#[cfg(feature = "audio")]
mod sound {
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Sender};
    use std::thread;

    use rodio::{Decoder, OutputStream, Sink};
    use tracing::warn;

    use super::CuePlayer;
    use crate::error::CueError;

    enum CueCommand {
        Play(PathBuf, String),
    }

    /// Plays cue sounds from files on the default output device.
    ///
    /// The rodio output stream is not `Send`, so it lives on a dedicated
    /// thread fed over a channel.
    pub struct SoundCuePlayer {
        sounds: HashMap<String, PathBuf>,
        tx: Sender<CueCommand>,
    }

    impl SoundCuePlayer {
        /// `volume` is 0.0 ..= 1.0.
        pub fn new(sounds: HashMap<String, PathBuf>, volume: f32) -> Result<Self, CueError> {
            let (tx, rx) = mpsc::channel::<CueCommand>();
            let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
            let volume = volume.clamp(0.0, 1.0);

            thread::Builder::new()
                .name("cue-player".to_string())
                .spawn(move || {
                    let (_stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => pair,
                        Err(e) => {
                            let _ = ready_tx.send(Err(format!("no audio output: {e}")));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));

                    // A new cue cuts off the previous one.
                    let mut current: Option<Sink> = None;
                    while let Ok(CueCommand::Play(path, cue)) = rx.recv() {
                        let source = File::open(&path)
                            .map_err(|e| e.to_string())
                            .and_then(|f| Decoder::new(BufReader::new(f)).map_err(|e| e.to_string()));
                        let sink = Sink::try_new(&handle).map_err(|e| e.to_string());
                        match (source, sink) {
                            (Ok(source), Ok(sink)) => {
                                sink.set_volume(volume);
                                sink.append(source);
                                if let Some(previous) = current.replace(sink) {
                                    previous.stop();
                                }
                            }
                            (Err(message), _) | (_, Err(message)) => {
                                warn!(cue = %cue, path = %path.display(), %message, "cue playback failed");
                            }
                        }
                    }
                })
                .map_err(|e| CueError::Unavailable(e.to_string()))?;

            match ready_rx.recv() {
                Ok(Ok(())) => Ok(Self { sounds, tx }),
                Ok(Err(message)) => Err(CueError::Unavailable(message)),
                Err(e) => Err(CueError::Unavailable(e.to_string())),
            }
        }
    }

    impl CuePlayer for SoundCuePlayer {
        fn play(&self, cue: &str) -> Result<(), CueError> {
            let path = self
                .sounds
                .get(cue)
                .cloned()
                .ok_or_else(|| CueError::UnknownCue(cue.to_string()))?;
            self.tx
                .send(CueCommand::Play(path, cue.to_string()))
                .map_err(|e| CueError::Unavailable(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl CuePlayer for Recorder {
        fn play(&self, cue: &str) -> Result<(), CueError> {
            self.0.lock().unwrap().push(cue.to_string());
            Ok(())
        }
    }

    #[test]
    fn silent_player_accepts_any_cue() {
        assert!(SilentCuePlayer.play("Inhale").is_ok());
        assert!(SilentCuePlayer.play("anything").is_ok());
    }

    #[test]
    fn shared_player_dispatches_to_inner() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let shared: SharedCuePlayer = recorder.clone();
        shared.play("Hold").unwrap();
        shared.play("Exhale").unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec!["Hold", "Exhale"]);
    }
}
