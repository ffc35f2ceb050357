//! SMF encoding
//!
//! Writes a note list as a Format 0 (single track) Standard MIDI File at
//! 480 ticks per beat, with one tempo meta-event at the start.

use super::vlq::{write_vlq, MAX_VLQ};
use super::{HEADER_CHUNK, TICKS_PER_BEAT, TRACK_CHUNK};
use crate::error::SeqError;
use crate::note::{Note, Track};
use log::debug;

/// Ticks beyond this cannot be trusted to survive the f64 -> i64 conversion.
const MAX_ABS_TICK: f64 = (1u64 << 53) as f64;

/// One track event before serialization.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Tempo { micros_per_beat: u32 },
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    EndOfTrack,
}

impl Event {
    fn write(&self, out: &mut Vec<u8>) {
        match *self {
            Event::Tempo { micros_per_beat } => out.extend_from_slice(&[
                0xFF,
                0x51,
                0x03,
                (micros_per_beat >> 16) as u8,
                (micros_per_beat >> 8) as u8,
                micros_per_beat as u8,
            ]),
            // Channel 0 only
            Event::NoteOn { pitch, velocity } => {
                out.extend_from_slice(&[0x90, pitch & 0x7F, velocity & 0x7F])
            }
            Event::NoteOff { pitch } => out.extend_from_slice(&[0x80, pitch & 0x7F, 0x00]),
            Event::EndOfTrack => out.extend_from_slice(&[0xFF, 0x2F, 0x00]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TimedEvent {
    tick: i64,
    event: Event,
}

/// Encode notes as a single-track Standard MIDI File.
///
/// # Parameters
/// - `notes`: Notes in any order; muted notes are left out
/// - `tempo_bpm`: Written as a tempo meta-event at tick 0
///
/// # Output Layout
/// ```text
/// MThd 00000006 0000 0001 01E0
/// MTrk <length>
///   00 FF 51 03 <µs per beat>
///   <delta> 90 pitch velocity    (one per note, at round(start * 480))
///   <delta> 80 pitch 00          (one per note, at round(end * 480))
///   00 FF 2F 00                  (at the tick of the last event)
/// ```
///
/// Events are sorted by tick; events on the same tick keep their input order.
///
/// # Errors
/// - [`SeqError::InvalidTempo`] if the tempo is not a positive, finite number
/// - [`SeqError::UnrepresentableDuration`] if a note lands too far from its
///   predecessor for a delta-time
///
/// # Example
/// ```rust
/// use midiseq::{smf, Note};
///
/// let notes = vec![Note::new(60, 0.0, 1.0, 100)];
/// let bytes = smf::encode(&notes, 120.0)?;
///
/// assert_eq!(&bytes[0..4], b"MThd");
/// assert_eq!(smf::decode(&bytes).notes[0].pitch, 60);
/// # Ok::<(), midiseq::SeqError>(())
/// ```
pub fn encode(notes: &[Note], tempo_bpm: f64) -> Result<Vec<u8>, SeqError> {
    if !tempo_bpm.is_finite() || tempo_bpm <= 0.0 {
        return Err(SeqError::InvalidTempo(tempo_bpm));
    }

    let micros_per_beat = (60_000_000.0 / tempo_bpm).round().min(0xFF_FFFF as f64) as u32;
    let mut events = vec![TimedEvent {
        tick: 0,
        event: Event::Tempo { micros_per_beat },
    }];

    let mut skipped = 0;
    for note in notes {
        if note.muted {
            skipped += 1;
            continue;
        }
        events.push(TimedEvent {
            tick: beats_to_tick(note.start_time)?,
            event: Event::NoteOn {
                pitch: note.pitch,
                velocity: note.velocity,
            },
        });
        events.push(TimedEvent {
            tick: beats_to_tick(note.end_time())?,
            event: Event::NoteOff { pitch: note.pitch },
        });
    }

    // sort_by_key is stable, so same-tick events keep insertion order
    events.sort_by_key(|e| e.tick);

    let last_tick = events.last().map_or(0, |e| e.tick);
    events.push(TimedEvent {
        tick: last_tick,
        event: Event::EndOfTrack,
    });

    let mut track = Vec::with_capacity(events.len() * 4);
    let mut previous_tick: i64 = 0;
    for timed in &events {
        // Negative deltas (notes before beat 0) are written as zero
        let delta = (timed.tick - previous_tick).max(0);
        if delta > MAX_VLQ as i64 {
            return Err(SeqError::UnrepresentableDuration {
                beats: timed.tick as f64 / TICKS_PER_BEAT as f64,
            });
        }
        write_vlq(delta as u32, &mut track);
        timed.event.write(&mut track);
        previous_tick = timed.tick;
    }

    debug!(
        "Encoded {} notes ({} muted skipped) into {} track bytes",
        (events.len() - 2) / 2,
        skipped,
        track.len()
    );

    let mut smf = Vec::with_capacity(22 + track.len());
    smf.extend_from_slice(HEADER_CHUNK);
    smf.extend_from_slice(&6u32.to_be_bytes());
    smf.extend_from_slice(&0u16.to_be_bytes()); // format 0
    smf.extend_from_slice(&1u16.to_be_bytes()); // one track
    smf.extend_from_slice(&TICKS_PER_BEAT.to_be_bytes());
    smf.extend_from_slice(TRACK_CHUNK);
    smf.extend_from_slice(&(track.len() as u32).to_be_bytes());
    smf.extend_from_slice(&track);

    Ok(smf)
}

/// Encode a track's notes. Channel, bank and program are not written.
pub fn encode_track(track: &Track, tempo_bpm: f64) -> Result<Vec<u8>, SeqError> {
    encode(&track.notes, tempo_bpm)
}

fn beats_to_tick(beats: f64) -> Result<i64, SeqError> {
    let tick = (beats * TICKS_PER_BEAT as f64).round();
    if !tick.is_finite() || tick.abs() > MAX_ABS_TICK {
        return Err(SeqError::UnrepresentableDuration { beats });
    }
    Ok(tick as i64)
}
