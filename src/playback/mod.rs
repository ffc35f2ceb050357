//! # Playback Module
//!
//! Play a note list in real time against a MIDI output.
//!
//! ## Purpose
//! Turns notes measured in beats into note-on/note-off calls at the right
//! wall-clock moments:
//! 1. **Scheduling** - which notes start and stop at a given time
//! 2. **Looping** - wrap to the start without drift
//! 3. **Silencing** - every session ends with a note-off for all 128 pitches
//!
//! ## Sub-modules
//! - `types` - PlaybackSettings, TickOutcome, PlaybackEnd, TICK_PERIOD
//! - `sink` - Output traits plus the logging, recording and byte-level sinks
//! - `scheduler` - Clock-agnostic state machine; every tick is explicit
//! - `player` - Runs a scheduler on a thread, ticking every 10 ms
//! - `transport` - Play/stop on one output, with track context changes
//!
//! ## Key Types
//! - [`Scheduler`] - Deterministic core, driven by `tick(now, sink)`
//! - [`Player`] - Background thread around a scheduler
//! - [`Transport`] - What an application holds on to
//! - [`NoteSink`] / [`ChannelControl`] - Where messages go
//!
//! ## Example
//! ```rust
//! use midiseq::playback::{PlaybackSettings, RecordingSink, Scheduler, TickOutcome};
//! use midiseq::Note;
//!
//! let notes = vec![Note::new(60, 0.0, 1.0, 100)];
//! let mut scheduler = Scheduler::new(notes, PlaybackSettings::default())?;
//! let mut sink = RecordingSink::new();
//!
//! scheduler.start(0.0, &mut sink)?;
//! assert_eq!(scheduler.tick(0.4, &mut sink)?, TickOutcome::Continue);
//! assert_eq!(sink.note_ons(), vec![60]);
//!
//! // 0.6 s at 120 BPM is beat 1.2, past the end
//! assert_eq!(scheduler.tick(0.6, &mut sink)?, TickOutcome::Finished);
//! # Ok::<(), midiseq::SeqError>(())
//! ```
//!
//! ## Timing
//!
//! Positions are derived from elapsed time on every tick rather than
//! accumulated, so a late tick only delays events, it never shifts later ones.
//! A note sounds while `start <= position < start + duration`. A note shorter
//! than one tick can fall between two ticks and never sound.
//!
//! ## Related Modules
//! - `note` - Note, NoteId, TrackContext
//! - `message` - Wire bytes behind [`WireSink`]
//! - `device` - Hardware output (with the `midir` feature)

mod player;
mod scheduler;
mod sink;
mod transport;
mod types;


pub use player::{Player, SinkTask};
pub use scheduler::Scheduler;
pub use sink::{
    ChannelControl, LogSink, MidiOut, NoteSink, RecordingSink, SinkEvent, WireSink,
};
pub use transport::Transport;
pub use types::{PlaybackEnd, PlaybackSettings, TickOutcome, TransportState, TICK_PERIOD};
