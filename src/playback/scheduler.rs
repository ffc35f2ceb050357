//! Real-time note scheduler
//!
//! The scheduler is a plain state object. It owns no timer: something else
//! (the [`Player`](super::Player) thread, or a test) calls [`Scheduler::tick`]
//! with the current time, and the scheduler works out which notes start and
//! stop at that moment.

use super::sink::NoteSink;
use super::types::{PlaybackSettings, TickOutcome, TransportState};
use crate::error::{SeqError, SinkError};
use crate::note::{max_time, Note, NoteId};
use log::{debug, trace};
use std::collections::HashMap;

/// Plays a note list against a [`NoteSink`].
///
/// # Timing
/// `now` values passed to [`start`](Self::start) and [`tick`](Self::tick) are
/// seconds on any monotonic clock. The playhead is
/// `(now - anchor) * tempo / 60` beats, where `anchor` is the `now` of
/// `start`. When looping, the anchor moves back by one loop length at each
/// wrap, so rounding never accumulates across loops.
///
/// # Voices
/// Sounding notes are tracked by [`NoteId`], with the pitch they were started
/// at. The note-off always uses that pitch, so changing the octave shift
/// mid-note cannot leave a note hanging.
///
/// # Example
/// ```rust
/// use midiseq::playback::{PlaybackSettings, RecordingSink, Scheduler};
/// use midiseq::Note;
///
/// let notes = vec![Note::new(60, 0.0, 1.0, 100)];
/// let mut scheduler = Scheduler::new(notes, PlaybackSettings::default())?;
/// let mut sink = RecordingSink::new();
///
/// scheduler.start(0.0, &mut sink)?;
/// scheduler.tick(0.25, &mut sink)?; // 120 BPM: beat 0.5
///
/// assert_eq!(sink.note_ons(), vec![60]);
/// # Ok::<(), midiseq::SeqError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    notes: Vec<Note>,
    settings: PlaybackSettings,
    max_time: f64,
    state: TransportState,
    anchor: f64,
    position: f64,
    voices: HashMap<NoteId, u8>,
}

impl Scheduler {
    /// Create an idle scheduler.
    ///
    /// # Errors
    /// [`SeqError::InvalidTempo`] if the tempo is not a positive, finite number.
    pub fn new(notes: Vec<Note>, settings: PlaybackSettings) -> Result<Self, SeqError> {
        if !settings.tempo_bpm.is_finite() || settings.tempo_bpm <= 0.0 {
            return Err(SeqError::InvalidTempo(settings.tempo_bpm));
        }

        Ok(Self {
            max_time: max_time(&notes),
            notes,
            settings,
            state: TransportState::Idle,
            anchor: 0.0,
            position: 0.0,
            voices: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// End of the last note, in beats.
    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    /// Playhead reported by the latest tick.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Number of notes currently sounding.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Change the transposition for notes that start from now on.
    pub fn set_octave_shift(&mut self, octave_shift: i8) {
        self.settings.octave_shift = octave_shift;
    }

    /// Begin playback at `now`.
    ///
    /// A session that is already running is stopped first, sweep included, so
    /// nothing from it can keep sounding.
    pub fn start<S: NoteSink + ?Sized>(&mut self, now: f64, sink: &mut S) -> Result<(), SeqError> {
        if self.is_running() {
            self.stop(sink)?;
        }

        debug!(
            "Starting playback: {} notes, {:.3} beats, {} BPM, channel {}, octave {:+}, loop {}",
            self.notes.len(),
            self.max_time,
            self.settings.tempo_bpm,
            self.settings.channel,
            self.settings.octave_shift,
            self.settings.looping
        );

        self.voices.clear();
        self.anchor = now;
        self.position = 0.0;
        self.state = TransportState::Running;
        Ok(())
    }

    /// Advance to `now`.
    ///
    /// # Per Tick
    /// 1. Compute the playhead (wrapping when looping)
    /// 2. Report it through `position_update`
    /// 3. Start unmuted notes the playhead has entered, stop the ones it left
    /// 4. Without looping, stop everything once the playhead passes the end
    ///
    /// # Errors
    /// If the sink fails, the session is stopped (sweep included, best
    /// effort) and [`SeqError::PlaybackAborted`] is returned.
    pub fn tick<S: NoteSink + ?Sized>(
        &mut self,
        now: f64,
        sink: &mut S,
    ) -> Result<TickOutcome, SeqError> {
        if !self.is_running() {
            return Ok(TickOutcome::Idle);
        }

        let position = self.advance(now);
        self.position = position;

        if let Err(source) = self.dispatch(position, sink) {
            debug!("Sink failed at beat {:.3}: {}", position, source);
            let _ = self.halt(sink);
            return Err(SeqError::PlaybackAborted { position, source });
        }

        let at_end = if self.max_time <= 0.0 {
            // Nothing to play, and nothing to loop
            true
        } else {
            !self.settings.looping && position >= self.max_time
        };

        if at_end {
            debug!("Playback reached beat {:.3}, stopping", position);
            self.halt(sink)
                .map_err(|source| SeqError::PlaybackAborted { position, source })?;
            return Ok(TickOutcome::Finished);
        }

        Ok(TickOutcome::Continue)
    }

    /// Stop playback and release every pitch on the channel.
    ///
    /// Sends a note-off for each pitch 0-127 whether or not the scheduler
    /// thinks it is sounding, even when already idle.
    pub fn stop<S: NoteSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SeqError> {
        self.halt(sink).map_err(SeqError::Sink)
    }

    fn advance(&mut self, now: f64) -> f64 {
        if self.max_time <= 0.0 {
            return 0.0;
        }

        let beats_per_second = self.settings.beats_per_second();
        let mut position = ((now - self.anchor) * beats_per_second).max(0.0);

        if self.settings.looping && position >= self.max_time {
            position %= self.max_time;
            self.anchor = now - position / beats_per_second;
            trace!("Looped to beat {:.3}", position);
        }

        position
    }

    fn dispatch<S: NoteSink + ?Sized>(&mut self, position: f64, sink: &mut S) -> Result<(), SinkError> {
        sink.position_update(position)?;

        let channel = self.settings.channel;
        let shift = self.settings.octave_shift as i16 * 12;

        for note in &self.notes {
            if note.muted {
                continue;
            }

            match (note.sounds_at(position), self.voices.get(&note.id).copied()) {
                (true, None) => {
                    let adjusted = note.pitch as i16 + shift;
                    if (0..=127).contains(&adjusted) {
                        sink.note_on(adjusted as u8, note.velocity, channel)?;
                        self.voices.insert(note.id.clone(), adjusted as u8);
                    } else {
                        trace!("Skipping note {}: pitch {} out of range", note.id, adjusted);
                    }
                }
                (false, Some(pitch)) => {
                    sink.note_off(pitch, channel)?;
                    self.voices.remove(&note.id);
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Go idle and sweep. Keeps sweeping past errors, returns the first.
    fn halt<S: NoteSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SinkError> {
        self.state = TransportState::Idle;
        self.voices.clear();

        let channel = self.settings.channel;
        let mut first_error = None;
        for pitch in 0..=127u8 {
            if let Err(e) = sink.note_off(pitch, channel) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
