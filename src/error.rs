//! # Error Types
//!
//! This module defines all error types for the sequencer.
//!
//! The SMF decoder is lenient and reports problems as data (see
//! [`Decoded`](crate::smf::Decoded)); the variants here surface when a caller
//! asks for strict behavior, when encoding cannot represent a note, or when a
//! playback session has to be torn down.
//!
//! ## Error Types
//! - `TruncatedInput` - SMF data ended in the middle of a chunk or event
//! - `UnrepresentableDuration` - a note position does not fit in a delta-time
//! - `InvalidTempo` - tempo is zero, negative or not finite
//! - `PlaybackAborted` - the note sink failed while a session was running
//! - `Sink` - the note sink failed outside of a session
//! - `Project` - a project document could not be read
//! - `Io` - file access failed
//!
//! ## Usage
//! ```rust
//! use midiseq::{smf, SeqError};
//!
//! let bytes = [0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x40, 0x00, 0x90];
//! match smf::decode(&bytes).strict() {
//!     Ok(notes) => println!("{} notes", notes.len()),
//!     Err(SeqError::TruncatedInput { offset }) => {
//!         eprintln!("file ends early at byte {}", offset);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqError {
    /// SMF data ended before a chunk or event was complete.
    ///
    /// # Example
    /// ```
    /// # use midiseq::SeqError;
    /// let err = SeqError::TruncatedInput { offset: 42 };
    /// assert_eq!(err.to_string(), "Truncated MIDI input at byte 42");
    /// ```
    #[error("Truncated MIDI input at byte {offset}")]
    TruncatedInput { offset: usize },

    /// A note position (in beats) lands on a tick beyond what a
    /// variable-length quantity can carry.
    #[error("Note position {beats} beats cannot be represented as a MIDI delta-time")]
    UnrepresentableDuration { beats: f64 },

    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    /// The note sink failed mid-session. The session has already been
    /// stopped and the all-notes-off sweep has been sent.
    #[error("Playback aborted at beat {position:.3}: {source}")]
    PlaybackAborted {
        position: f64,
        #[source]
        source: SinkError,
    },

    #[error("MIDI output error: {0}")]
    Sink(#[from] SinkError),

    /// Invalid project document.
    ///
    /// # Example
    /// ```
    /// # use midiseq::SeqError;
    /// let err = SeqError::Project("expected an object".to_string());
    /// assert_eq!(err.to_string(), "Invalid project: expected an object");
    /// ```
    #[error("Invalid project: {0}")]
    Project(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`NoteSink`](crate::playback::NoteSink) or
/// [`ChannelControl`](crate::playback::ChannelControl) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
