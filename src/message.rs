//! Live MIDI channel messages
//!
//! The raw bytes a device layer sends for note and channel-setup messages.
//! Channels, banks and programs are 1-based in the API and written 0-based on
//! the wire: channel 1 is status nibble 0, program 1 is data byte 0.

/// Controller number for Bank Select (MSB).
pub const CC_BANK_SELECT: u8 = 0;

/// Controller number for All Notes Off.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// A channel-voice message without its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    ProgramChange { program: u8 },
    BankSelect { bank: u8 },
    AllNotesOff,
}

impl ChannelMessage {
    /// Wire bytes for this message on `channel` (1-16).
    ///
    /// Channels outside 1-16 wrap: only the low 4 bits of `channel - 1`
    /// reach the status byte.
    ///
    /// # Example
    /// ```rust
    /// use midiseq::ChannelMessage;
    ///
    /// let on = ChannelMessage::NoteOn { pitch: 60, velocity: 100 };
    /// assert_eq!(on.to_bytes(10), vec![0x99, 60, 100]);
    ///
    /// let program = ChannelMessage::ProgramChange { program: 1 };
    /// assert_eq!(program.to_bytes(1), vec![0xC0, 0]);
    /// ```
    pub fn to_bytes(&self, channel: u8) -> Vec<u8> {
        let nibble = channel.wrapping_sub(1) & 0x0F;
        match *self {
            ChannelMessage::NoteOn { pitch, velocity } => {
                vec![0x90 | nibble, pitch & 0x7F, velocity & 0x7F]
            }
            ChannelMessage::NoteOff { pitch } => vec![0x80 | nibble, pitch & 0x7F, 0],
            ChannelMessage::ProgramChange { program } => {
                vec![0xC0 | nibble, program.wrapping_sub(1) & 0x7F]
            }
            ChannelMessage::BankSelect { bank } => {
                vec![0xB0 | nibble, CC_BANK_SELECT, bank.wrapping_sub(1) & 0x7F]
            }
            ChannelMessage::AllNotesOff => vec![0xB0 | nibble, CC_ALL_NOTES_OFF, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_messages() {
        assert_eq!(
            ChannelMessage::NoteOn { pitch: 60, velocity: 100 }.to_bytes(1),
            vec![0x90, 0x3C, 0x64]
        );
        assert_eq!(
            ChannelMessage::NoteOff { pitch: 60 }.to_bytes(16),
            vec![0x8F, 0x3C, 0x00]
        );
    }

    #[test]
    fn test_channel_wraps_to_four_bits() {
        assert_eq!(ChannelMessage::NoteOff { pitch: 1 }.to_bytes(17)[0], 0x80);
        assert_eq!(ChannelMessage::NoteOff { pitch: 1 }.to_bytes(0)[0], 0x8F);
    }

    #[test]
    fn test_data_bytes_are_seven_bit() {
        assert_eq!(
            ChannelMessage::NoteOn { pitch: 200, velocity: 255 }.to_bytes(1),
            vec![0x90, 200 & 0x7F, 0x7F]
        );
    }

    #[test]
    fn test_setup_messages() {
        assert_eq!(
            ChannelMessage::BankSelect { bank: 3 }.to_bytes(2),
            vec![0xB1, 0x00, 0x02]
        );
        assert_eq!(
            ChannelMessage::ProgramChange { program: 16 }.to_bytes(2),
            vec![0xC1, 0x0F]
        );
        assert_eq!(ChannelMessage::AllNotesOff.to_bytes(4), vec![0xB3, 123, 0]);
    }
}
