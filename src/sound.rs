use std::io::Write;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Launch,
    Explosion,
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("audio output unavailable")]
    Unavailable,
    #[error("failed to emit sound cue: {0}")]
    Io(#[from] std::io::Error),
}

/// Fire-and-forget sound sink. Implementations must return promptly.
pub trait SoundCue {
    fn play(&mut self, cue: Cue) -> Result<(), SoundError>;
}

pub struct Silent;

impl SoundCue for Silent {
    fn play(&mut self, _cue: Cue) -> Result<(), SoundError> {
        Ok(())
    }
}

/// Rings the terminal bell on explosions. Launches stay quiet.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SoundCue for TerminalBell<W> {
    fn play(&mut self, cue: Cue) -> Result<(), SoundError> {
        if cue == Cue::Explosion {
            self.out.write_all(b"\x07")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Plays a cue, logging and discarding any failure so the frame carries on.
pub fn play_cue(sound: &mut dyn SoundCue, cue: Cue) {
    if let Err(err) = sound.play(cue) {
        log::warn!("sound cue {:?} failed: {}", cue, err);
    }
}
