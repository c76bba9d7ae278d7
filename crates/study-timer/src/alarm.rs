//! Completion alarm
//!
//! The controller rings `BEEP_COUNT` beeps `BEEP_SPACING_MS` apart when a
//! countdown finishes. A beep that cannot be played is logged and the rest of
//! the sequence is skipped; the session has already been stored by then.

use std::io::{self, Write};
use thiserror::Error;

/// Beeps per completion
pub const BEEP_COUNT: u8 = 3;

/// Gap between beep starts
pub const BEEP_SPACING_MS: u64 = 600;

#[derive(Error, Debug)]
pub enum AlarmError {
    #[error("audio output unavailable: {0}")]
    Unavailable(#[from] io::Error),
}

/// Something that can make one short sound
pub trait Alarm {
    fn beep(&mut self) -> Result<(), AlarmError>;
}

impl<A: Alarm + ?Sized> Alarm for Box<A> {
    fn beep(&mut self) -> Result<(), AlarmError> {
        (**self).beep()
    }
}

/// Rings the terminal bell (BEL) on the wrapped writer
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Alarm for TerminalBell<W> {
    fn beep(&mut self) -> Result<(), AlarmError> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// No sound at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Alarm for Silent {
    fn beep(&mut self) -> Result<(), AlarmError> {
        Ok(())
    }
}
