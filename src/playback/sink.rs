//! Output capabilities
//!
//! The scheduler never talks to a device. It is handed a [`NoteSink`], and the
//! transport additionally needs [`ChannelControl`] for channel setup. Anything
//! that can send raw MIDI bytes becomes both through [`WireSink`].

use crate::error::SinkError;
use crate::message::ChannelMessage;
use log::{info, trace};

/// Receives note events and playhead positions from the scheduler.
///
/// `channel` is 1-based. Any error ends the current playback session.
pub trait NoteSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<(), SinkError>;

    fn note_off(&mut self, pitch: u8, channel: u8) -> Result<(), SinkError>;

    /// Called once per scheduler tick with the playhead in beats.
    fn position_update(&mut self, position: f64) -> Result<(), SinkError>;
}

/// Channel setup messages sent outside the note stream.
///
/// `bank` and `program` are 1-based, like `channel`.
pub trait ChannelControl {
    fn bank_select(&mut self, bank: u8, channel: u8) -> Result<(), SinkError>;

    fn program_change(&mut self, program: u8, channel: u8) -> Result<(), SinkError>;

    fn all_notes_off(&mut self, channel: u8) -> Result<(), SinkError>;
}

impl<T: NoteSink + ?Sized> NoteSink for &mut T {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<(), SinkError> {
        (**self).note_on(pitch, velocity, channel)
    }

    fn note_off(&mut self, pitch: u8, channel: u8) -> Result<(), SinkError> {
        (**self).note_off(pitch, channel)
    }

    fn position_update(&mut self, position: f64) -> Result<(), SinkError> {
        (**self).position_update(position)
    }
}

/// A byte-level MIDI output, such as a hardware port.
pub trait MidiOut {
    fn send(&mut self, message: &[u8]) -> Result<(), SinkError>;
}

impl MidiOut for Vec<Vec<u8>> {
    fn send(&mut self, message: &[u8]) -> Result<(), SinkError> {
        self.push(message.to_vec());
        Ok(())
    }
}

/// Adapts a [`MidiOut`] to the sink traits by writing [`ChannelMessage`] bytes.
///
/// Positions are not MIDI messages; they are only traced.
#[derive(Debug)]
pub struct WireSink<O> {
    out: O,
}

impl<O: MidiOut> WireSink<O> {
    pub fn new(out: O) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &O {
        &self.out
    }

    pub fn into_inner(self) -> O {
        self.out
    }

    fn send(&mut self, message: ChannelMessage, channel: u8) -> Result<(), SinkError> {
        let bytes = message.to_bytes(channel);
        trace!("MIDI out {:02X?}", bytes);
        self.out.send(&bytes)
    }
}

impl<O: MidiOut> NoteSink for WireSink<O> {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<(), SinkError> {
        self.send(ChannelMessage::NoteOn { pitch, velocity }, channel)
    }

    fn note_off(&mut self, pitch: u8, channel: u8) -> Result<(), SinkError> {
        self.send(ChannelMessage::NoteOff { pitch }, channel)
    }

    fn position_update(&mut self, position: f64) -> Result<(), SinkError> {
        trace!("Playhead at beat {:.3}", position);
        Ok(())
    }
}

impl<O: MidiOut> ChannelControl for WireSink<O> {
    fn bank_select(&mut self, bank: u8, channel: u8) -> Result<(), SinkError> {
        self.send(ChannelMessage::BankSelect { bank }, channel)
    }

    fn program_change(&mut self, program: u8, channel: u8) -> Result<(), SinkError> {
        self.send(ChannelMessage::ProgramChange { program }, channel)
    }

    fn all_notes_off(&mut self, channel: u8) -> Result<(), SinkError> {
        self.send(ChannelMessage::AllNotesOff, channel)
    }
}

/// Logs note traffic instead of playing it.
///
/// Note events go to `info`, positions to `trace`. The sweep of 128 note-offs
/// at the end of a session is summarized in one line.
#[derive(Debug, Default)]
pub struct LogSink {
    sounding: usize,
    silent_offs: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteSink for LogSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<(), SinkError> {
        self.flush_silent_offs();
        self.sounding += 1;
        info!("ch{:<2} note on  {:>3} vel {:>3}", channel, pitch, velocity);
        Ok(())
    }

    fn note_off(&mut self, pitch: u8, channel: u8) -> Result<(), SinkError> {
        if self.sounding > 0 {
            self.sounding -= 1;
            info!("ch{:<2} note off {:>3}", channel, pitch);
        } else {
            self.silent_offs += 1;
            if self.silent_offs == 128 {
                self.flush_silent_offs();
            }
        }
        Ok(())
    }

    fn position_update(&mut self, position: f64) -> Result<(), SinkError> {
        trace!("beat {:.3}", position);
        Ok(())
    }
}

impl LogSink {
    fn flush_silent_offs(&mut self) {
        if self.silent_offs > 0 {
            info!("sent {} note-offs (all notes released)", self.silent_offs);
            self.silent_offs = 0;
        }
    }
}

impl ChannelControl for LogSink {
    fn bank_select(&mut self, bank: u8, channel: u8) -> Result<(), SinkError> {
        info!("ch{:<2} bank {}", channel, bank);
        Ok(())
    }

    fn program_change(&mut self, program: u8, channel: u8) -> Result<(), SinkError> {
        info!("ch{:<2} program {}", channel, program);
        Ok(())
    }

    fn all_notes_off(&mut self, channel: u8) -> Result<(), SinkError> {
        self.sounding = 0;
        info!("ch{:<2} all notes off", channel);
        Ok(())
    }
}

/// Everything a [`RecordingSink`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    NoteOn { pitch: u8, velocity: u8, channel: u8 },
    NoteOff { pitch: u8, channel: u8 },
    Position(f64),
    BankSelect { bank: u8, channel: u8 },
    ProgramChange { program: u8, channel: u8 },
    AllNotesOff { channel: u8 },
}

/// Records every call, in order. Stands in for a device in tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pitches of every note-on, in order.
    pub fn note_ons(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::NoteOn { pitch, .. } => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    /// Pitches of every note-off, in order.
    pub fn note_offs(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::NoteOff { pitch, .. } => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Position(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl NoteSink for RecordingSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<(), SinkError> {
        self.events.push(SinkEvent::NoteOn {
            pitch,
            velocity,
            channel,
        });
        Ok(())
    }

    fn note_off(&mut self, pitch: u8, channel: u8) -> Result<(), SinkError> {
        self.events.push(SinkEvent::NoteOff { pitch, channel });
        Ok(())
    }

    fn position_update(&mut self, position: f64) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Position(position));
        Ok(())
    }
}

impl ChannelControl for RecordingSink {
    fn bank_select(&mut self, bank: u8, channel: u8) -> Result<(), SinkError> {
        self.events.push(SinkEvent::BankSelect { bank, channel });
        Ok(())
    }

    fn program_change(&mut self, program: u8, channel: u8) -> Result<(), SinkError> {
        self.events.push(SinkEvent::ProgramChange { program, channel });
        Ok(())
    }

    fn all_notes_off(&mut self, channel: u8) -> Result<(), SinkError> {
        self.events.push(SinkEvent::AllNotesOff { channel });
        Ok(())
    }
}
