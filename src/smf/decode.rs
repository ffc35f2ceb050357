//! SMF decoding
//!
//! Turns a Standard MIDI File byte stream into a flat note list. The decoder
//! never rejects a file. It scans for track chunks instead of trusting chunk
//! boundaries and reports a truncated buffer as data, not as an error.

use super::vlq::read_vlq;
use super::{DEFAULT_TICKS_PER_BEAT, HEADER_CHUNK, MIN_NOTE_BEATS, TRACK_CHUNK};
use crate::error::SeqError;
use crate::note::Note;
use log::{debug, warn};

/// Result of decoding an SMF byte stream.
///
/// # Fields
/// - `notes`: Notes in the order their Note Off was read (not time-sorted)
/// - `ticks_per_beat`: Resolution used for the tick to beat conversion
/// - `tracks`: Number of `MTrk` chunks found
/// - `truncated`: Byte offset where the data ran out, if it did
#[derive(Debug, Clone)]
pub struct Decoded {
    pub notes: Vec<Note>,
    pub ticks_per_beat: u16,
    pub tracks: usize,
    pub truncated: Option<usize>,
}

impl Decoded {
    /// Whether the whole buffer was parsed without running off its end.
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }

    /// The notes, whether or not the input was truncated.
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// The notes, or [`SeqError::TruncatedInput`] if the input was cut short.
    pub fn strict(self) -> Result<Vec<Note>, SeqError> {
        match self.truncated {
            Some(offset) => Err(SeqError::TruncatedInput { offset }),
            None => Ok(self.notes),
        }
    }
}

/// Decode an SMF byte stream into notes.
///
/// # Algorithm
/// 1. If the data starts with `MThd`, take ticks-per-beat from bytes 12-13;
///    otherwise assume 480 and start scanning at byte 0
/// 2. Scan byte by byte for `MTrk`, then read events up to the chunk length
/// 3. Pair Note On / Note Off (or Note On with velocity 0) by pitch
/// 4. Skip every other channel, meta and sysex event
///
/// Channel numbers are ignored and all tracks merge into one list. A Note On
/// still open when its track ends is dropped.
///
/// # Example
/// ```rust
/// use midiseq::smf::decode;
///
/// // Headerless track: Note On C4, one beat later Note Off via running status
/// let bytes = [
///     0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x08,
///     0x00, 0x90, 0x3C, 0x64,
///     0x83, 0x60, 0x3C, 0x00,
/// ];
/// let decoded = decode(&bytes);
///
/// assert!(decoded.is_complete());
/// assert_eq!(decoded.notes.len(), 1);
/// assert_eq!(decoded.notes[0].pitch, 60);
/// assert_eq!(decoded.notes[0].duration, 1.0);
/// ```
pub fn decode(bytes: &[u8]) -> Decoded {
    let mut decoder = Decoder::new(bytes);
    decoder.run();

    debug!(
        "Decoded {} notes from {} track(s) at {} ticks/beat",
        decoder.notes.len(),
        decoder.tracks,
        decoder.ticks_per_beat
    );
    if let Some(offset) = decoder.truncated {
        warn!(
            "MIDI data truncated at byte {} of {}; keeping {} notes read so far",
            offset,
            bytes.len(),
            decoder.notes.len()
        );
    }

    Decoded {
        notes: decoder.notes,
        ticks_per_beat: decoder.ticks_per_beat,
        tracks: decoder.tracks,
        truncated: decoder.truncated,
    }
}

/// A Note On waiting for its Note Off.
#[derive(Clone, Copy)]
struct Pending {
    start: f64,
    velocity: u8,
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    ticks_per_beat: u16,
    notes: Vec<Note>,
    tracks: usize,
    truncated: Option<usize>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            notes: Vec::new(),
            tracks: 0,
            truncated: None,
        }
    }

    fn run(&mut self) {
        if self.at_signature(HEADER_CHUNK) && self.read_header().is_none() {
            self.truncated = Some(self.bytes.len());
            return;
        }

        while self.pos < self.bytes.len() {
            if self.at_signature(TRACK_CHUNK) {
                self.pos += TRACK_CHUNK.len();
                if self.read_track().is_none() {
                    // Ran off the end mid-event; nothing further to scan
                    self.truncated = Some(self.bytes.len());
                    return;
                }
            } else {
                self.pos += 1;
            }
        }
    }

    fn at_signature(&self, signature: &[u8; 4]) -> bool {
        self.bytes[self.pos..].starts_with(signature)
    }

    // Cursor helpers: `None` means the read would pass the end of the buffer.

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn read_u16(&mut self) -> Option<u16> {
        let hi = self.read_u8()? as u16;
        let lo = self.read_u8()? as u16;
        Some((hi << 8) | lo)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let hi = self.read_u16()? as u32;
        let lo = self.read_u16()? as u32;
        Some((hi << 16) | lo)
    }

    fn read_vlq(&mut self) -> Option<u32> {
        read_vlq(self.bytes, &mut self.pos)
    }

    fn skip(&mut self, count: usize) -> Option<()> {
        let target = self.pos.checked_add(count)?;
        if target > self.bytes.len() {
            return None;
        }
        self.pos = target;
        Some(())
    }

    /// Header layout: "MThd", length (4), format (2), track count (2),
    /// division (2). Only the division is used.
    fn read_header(&mut self) -> Option<()> {
        self.skip(HEADER_CHUNK.len() + 8)?;
        let division = self.read_u16()?;
        if division == 0 {
            warn!(
                "MIDI header declares 0 ticks per beat; using {}",
                DEFAULT_TICKS_PER_BEAT
            );
        } else {
            self.ticks_per_beat = division;
        }
        Some(())
    }

    fn read_track(&mut self) -> Option<()> {
        let length = self.read_u32()? as usize;
        let mut end = self.pos.saturating_add(length);
        if end > self.bytes.len() {
            // Length field overruns the buffer; parse what is there
            self.truncated = Some(self.bytes.len());
            end = self.bytes.len();
        }
        self.tracks += 1;

        let ticks_per_beat = self.ticks_per_beat as f64;
        let mut pending: [Option<Pending>; 128] = [None; 128];
        let mut current_tick: u64 = 0;
        let mut running_status: u8 = 0;

        while self.pos < end {
            current_tick += self.read_vlq()? as u64;
            let time_in_beats = current_tick as f64 / ticks_per_beat;

            // A data byte here means the status was omitted (running status);
            // leave it for the message to read.
            let status = match self.peek()? {
                byte if byte & 0x80 != 0 => {
                    self.pos += 1;
                    running_status = byte;
                    byte
                }
                _ => running_status,
            };

            match status & 0xF0 {
                0x90 => {
                    let pitch = self.read_u8()? & 0x7F;
                    let velocity = self.read_u8()? & 0x7F;
                    if velocity > 0 {
                        pending[pitch as usize] = Some(Pending {
                            start: time_in_beats,
                            velocity,
                        });
                    } else {
                        self.close_note(&mut pending, pitch, time_in_beats);
                    }
                }
                0x80 => {
                    let pitch = self.read_u8()? & 0x7F;
                    self.read_u8()?;
                    self.close_note(&mut pending, pitch, time_in_beats);
                }
                0xA0 | 0xB0 | 0xE0 => self.skip(2)?,
                0xC0 | 0xD0 => self.skip(1)?,
                _ => match status {
                    0xFF => {
                        self.read_u8()?;
                        let length = self.read_vlq()? as usize;
                        self.skip(length)?;
                    }
                    0xF0 | 0xF7 => {
                        let length = self.read_vlq()? as usize;
                        self.skip(length)?;
                    }
                    _ => {}
                },
            }
        }

        let unterminated = pending.iter().filter(|p| p.is_some()).count();
        if unterminated > 0 {
            debug!(
                "Dropping {} note(s) left sounding at end of track {}",
                unterminated, self.tracks
            );
        }

        Some(())
    }

    fn close_note(&mut self, pending: &mut [Option<Pending>; 128], pitch: u8, time_in_beats: f64) {
        if let Some(open) = pending[pitch as usize].take() {
            self.notes.push(Note::new(
                pitch,
                open.start,
                (time_in_beats - open.start).max(MIN_NOTE_BEATS),
                open.velocity,
            ));
        }
    }
}
