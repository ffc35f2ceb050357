//! Playback type definitions

use std::time::Duration;

/// How often the player advances the scheduler.
pub const TICK_PERIOD: Duration = Duration::from_millis(10);

/// Transport parameters fixed for one playback session.
///
/// # Fields
/// - `tempo_bpm`: Quarter-note beats per minute
/// - `channel`: Output channel (1-16)
/// - `octave_shift`: Whole octaves added to every pitch (may be negative)
/// - `looping`: Wrap to the start at the end of the last note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub tempo_bpm: f64,
    pub channel: u8,
    pub octave_shift: i8,
    pub looping: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            channel: 1,
            octave_shift: 0,
            looping: false,
        }
    }
}

impl PlaybackSettings {
    pub fn beats_per_second(&self) -> f64 {
        self.tempo_bpm / 60.0
    }
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Running,
}

/// What a single scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scheduler was not running; nothing was sent.
    Idle,
    /// Still running.
    Continue,
    /// Reached the end without looping. The stop sweep has been sent.
    Finished,
}

/// How a player session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Played to the end of the last note.
    Completed,
    /// Stopped on request.
    Stopped,
}
