//! # Note Data Model
//!
//! This module defines the types exchanged between the SMF codec, the playback
//! scheduler and project persistence.
//!
//! ## Type Hierarchy
//! ```text
//! Track
//!   ├── id, name
//!   ├── channel / bank / program (1-16)
//!   └── Vec<Note>
//!         ├── id: NoteId (stable, never reused)
//!         ├── pitch: u8 (0-127)
//!         ├── start_time: f64 (beats)
//!         ├── duration: f64 (beats, > 0)
//!         ├── velocity: u8 (0-127)
//!         └── muted: bool (playback only, never written to SMF)
//! ```
//!
//! ## Key Concepts
//!
//! ### Beats
//! All times are in beats, where one beat is a quarter note. The tempo only
//! matters when beats are turned into wall-clock time (playback) or into a
//! tempo meta-event (encoding).
//!
//! ### Ordering
//! A note list carries no ordering guarantee. Notes may overlap, even on the
//! same pitch; everything that tracks sounding notes keys them by [`NoteId`].
//!
//! ### Channels
//! Channel, bank and program are 1-based here. They become 0-based 4- and
//! 7-bit values only when written to the wire (see [`crate::message`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque note identifier.
///
/// Generated ids are random UUIDs; ids read from project files are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a fresh, never-before-seen id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single note.
///
/// # Fields
/// - `id`: Stable identifier, survives mute toggles
/// - `pitch`: MIDI note number (60 = middle C)
/// - `start_time`: Start in beats from the beginning of the piece
/// - `duration`: Length in beats, always positive
/// - `velocity`: Note-on velocity
/// - `muted`: Suppressed during playback and skipped by the encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: u8,
    #[serde(default)]
    pub muted: bool,
}

impl Note {
    /// Create an unmuted note with a fresh id.
    pub fn new(pitch: u8, start_time: f64, duration: f64, velocity: u8) -> Self {
        Self {
            id: NoteId::generate(),
            pitch,
            start_time,
            duration,
            velocity,
            muted: false,
        }
    }

    /// Same note, different id. Used for fixtures and project files.
    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// End of the note in beats (exclusive).
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `position` (beats) falls inside `[start_time, end_time)`.
    pub fn sounds_at(&self, position: f64) -> bool {
        position >= self.start_time && position < self.end_time()
    }
}

/// Latest end time over all notes, or 0 for an empty list.
pub fn max_time(notes: &[Note]) -> f64 {
    notes.iter().map(Note::end_time).fold(0.0, f64::max)
}

/// Flip the mute flag of the note with the given id.
///
/// Returns the new flag, or `None` if no note has that id.
pub fn toggle_mute(notes: &mut [Note], id: &NoteId) -> Option<bool> {
    let note = notes.iter_mut().find(|n| &n.id == id)?;
    note.muted = !note.muted;
    Some(note.muted)
}

/// Channel, bank and program for a track (all 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackContext {
    pub channel: u8,
    pub bank: u8,
    pub program: u8,
}

impl Default for TrackContext {
    fn default() -> Self {
        Self {
            channel: 1,
            bank: 1,
            program: 1,
        }
    }
}

/// A named note list plus the channel settings it plays on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub notes: Vec<Note>,
    pub channel: u8,
    pub bank: u8,
    pub program: u8,
}

impl Track {
    /// Empty track on channel 1 with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let ctx = TrackContext::default();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            notes: Vec::new(),
            channel: ctx.channel,
            bank: ctx.bank,
            program: ctx.program,
        }
    }

    /// The twelve-note phrase loaded when nothing else is.
    pub fn demo() -> Self {
        // (pitch, start, duration, velocity)
        const DEMO: [(u8, f64, f64, u8); 12] = [
            (60, 0.0, 0.5, 100),
            (62, 0.5, 0.5, 90),
            (64, 1.0, 1.0, 110),
            (65, 2.0, 0.5, 85),
            (67, 2.5, 0.5, 95),
            (69, 3.0, 1.0, 100),
            (64, 4.0, 0.5, 80),
            (62, 4.5, 0.5, 75),
            (60, 5.0, 1.0, 100),
            (72, 6.0, 0.5, 110),
            (71, 6.5, 0.5, 90),
            (69, 7.0, 1.0, 85),
        ];

        let notes = DEMO
            .iter()
            .enumerate()
            .map(|(i, &(pitch, start, duration, velocity))| {
                Note::new(pitch, start, duration, velocity).with_id((i + 1).to_string())
            })
            .collect();

        Self {
            id: "demo".to_string(),
            name: "Demo Track".to_string(),
            notes,
            ..Self::new("")
        }
    }

    pub fn context(&self) -> TrackContext {
        TrackContext {
            channel: self.channel,
            bank: self.bank,
            program: self.program,
        }
    }

    pub fn set_context(&mut self, ctx: TrackContext) {
        self.channel = ctx.channel;
        self.bank = ctx.bank;
        self.program = ctx.program;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_time_empty() {
        assert_eq!(max_time(&[]), 0.0);
    }

    #[test]
    fn test_max_time_unordered() {
        let notes = vec![
            Note::new(60, 4.0, 1.0, 100),
            Note::new(62, 0.0, 8.5, 100),
            Note::new(64, 2.0, 0.5, 100),
        ];
        assert_eq!(max_time(&notes), 8.5);
    }

    #[test]
    fn test_sounds_at_is_half_open() {
        let note = Note::new(60, 1.0, 1.0, 100);
        assert!(!note.sounds_at(0.99));
        assert!(note.sounds_at(1.0));
        assert!(note.sounds_at(1.5));
        assert!(!note.sounds_at(2.0));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Note::new(60, 0.0, 1.0, 100);
        let b = Note::new(60, 0.0, 1.0, 100);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_toggle_mute_keeps_id() {
        let mut notes = Track::demo().notes;
        let id = notes[2].id.clone();

        assert_eq!(toggle_mute(&mut notes, &id), Some(true));
        assert_eq!(notes[2].id, id);
        assert!(notes[2].muted);

        assert_eq!(toggle_mute(&mut notes, &id), Some(false));
        assert_eq!(toggle_mute(&mut notes, &NoteId::from("missing")), None);
    }

    #[test]
    fn test_note_json_uses_camel_case() {
        let note = Note::new(60, 0.5, 1.0, 90).with_id("n1");
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"startTime\":0.5"));
        assert!(json.contains("\"id\":\"n1\""));
    }

    #[test]
    fn test_note_json_muted_defaults_to_false() {
        let json = r#"{"id":"7","pitch":64,"startTime":1,"duration":0.5,"velocity":80}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id, NoteId::from("7"));
        assert!(!note.muted);
        assert_eq!(note.end_time(), 1.5);
    }

    #[test]
    fn test_demo_track() {
        let track = Track::demo();
        assert_eq!(track.id, "demo");
        assert_eq!(track.notes.len(), 12);
        assert_eq!(track.context(), TrackContext::default());
        assert_eq!(max_time(&track.notes), 8.0);
    }
}
