//! # Standard MIDI File Codec
//!
//! Read and write Standard MIDI Files (SMF) as flat note lists.
//!
//! ## Sub-modules
//! - `decode` - Lenient SMF reader producing [`Note`](crate::Note)s
//! - `encode` - Format 0 SMF writer
//! - `vlq` - Variable-length quantity reader/writer shared by both
//!
//! ## Entry Points
//! - [`decode()`] - bytes to notes (never fails; see [`Decoded`])
//! - [`encode()`] - notes + tempo to bytes
//!
//! ## Example
//! ```rust
//! use midiseq::{smf, Note};
//!
//! let notes = vec![
//!     Note::new(60, 0.0, 1.0, 100),
//!     Note::new(64, 1.0, 0.5, 90),
//! ];
//!
//! let bytes = smf::encode(&notes, 120.0)?;
//! let decoded = smf::decode(&bytes);
//!
//! assert_eq!(decoded.ticks_per_beat, 480);
//! assert_eq!(decoded.notes.len(), 2);
//! # Ok::<(), midiseq::SeqError>(())
//! ```
//!
//! ## Wire Format
//!
//! ### Header chunk
//! `MThd`, length 6, format, track count, ticks per beat (all big endian).
//! The encoder always writes format 0, one track, 480 ticks per beat. The
//! decoder only reads the ticks-per-beat field and falls back to 480 when
//! the header is missing.
//!
//! ### Track chunk
//! `MTrk`, 32-bit length, then `(delta-time, event)` pairs. Delta-times are
//! variable-length quantities counted in ticks.
//!
//! ## What Is Not Round-Tripped
//! - Channel numbers (the encoder writes channel 1; the decoder ignores them)
//! - Tempo changes after the first (the decoder skips all meta-events)
//! - Muted notes (never written)
//! - Note ids (the decoder assigns new ones)
//!
//! ## Related Modules
//! - `note` - The `Note` type produced and consumed here
//! - `playback` - Plays decoded notes

mod decode;
mod encode;
mod vlq;


pub use decode::{decode, Decoded};
pub use encode::{encode, encode_track};
pub use vlq::{encode_vlq, read_vlq, write_vlq, MAX_VLQ};

/// Resolution written by the encoder.
pub const TICKS_PER_BEAT: u16 = 480;

/// Resolution assumed when a file has no usable header.
pub const DEFAULT_TICKS_PER_BEAT: u16 = 480;

/// Shortest note the decoder produces, in beats.
pub const MIN_NOTE_BEATS: f64 = 0.1;

pub(crate) const HEADER_CHUNK: &[u8; 4] = b"MThd";
pub(crate) const TRACK_CHUNK: &[u8; 4] = b"MTrk";
