pub mod error;
pub mod message;
pub mod note;
pub mod playback;
pub mod project;
pub mod smf;

#[cfg(feature = "midir")]
pub mod device;

pub use error::*;
pub use message::ChannelMessage;
pub use note::{max_time, toggle_mute, Note, NoteId, Track, TrackContext};
pub use project::{Project, SyncMode};

use std::fs;
use std::path::Path;

/// Read a Standard MIDI File leniently.
/// Whatever could be decoded is returned; a truncated file logs a warning.
pub fn read_midi_file(path: impl AsRef<Path>) -> Result<Vec<Note>, SeqError> {
    let bytes = fs::read(path)?;
    Ok(smf::decode(&bytes).into_notes())
}

/// Write unmuted `notes` as a format-0 Standard MIDI File.
pub fn write_midi_file(
    path: impl AsRef<Path>,
    notes: &[Note],
    tempo_bpm: f64,
) -> Result<(), SeqError> {
    let bytes = smf::encode(notes, tempo_bpm)?;
    fs::write(path, bytes)?;
    Ok(())
}
