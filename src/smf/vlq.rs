//! Variable-length quantities
//!
//! SMF delta-times and meta/sysex lengths are stored as big-endian groups of
//! 7 bits. Every byte but the last has bit 7 set.

/// Largest value a 4-byte quantity can hold.
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Append `value` to `out` as a variable-length quantity.
///
/// # Example
/// ```rust
/// use midiseq::smf::write_vlq;
///
/// let mut out = Vec::new();
/// write_vlq(480, &mut out);
/// assert_eq!(out, vec![0x83, 0x60]);
/// ```
pub fn write_vlq(value: u32, out: &mut Vec<u8>) {
    // Filled from the back: the last byte carries the low 7 bits.
    let mut buffer = [0u8; 5];
    let mut start = buffer.len() - 1;
    buffer[start] = (value & 0x7F) as u8;

    let mut rest = value >> 7;
    while rest > 0 {
        start -= 1;
        buffer[start] = (rest & 0x7F) as u8 | 0x80;
        rest >>= 7;
    }

    out.extend_from_slice(&buffer[start..]);
}

/// Encode `value` into a fresh buffer.
pub fn encode_vlq(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    write_vlq(value, &mut out);
    out
}

/// Read a variable-length quantity starting at `*pos`, advancing `*pos` past it.
///
/// Returns `None` if the buffer ends before a byte with bit 7 clear. Overlong
/// quantities keep only their low 32 bits.
pub fn read_vlq(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let mut value: u32 = 0;
    loop {
        let byte = *bytes.get(*pos)?;
        *pos += 1;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_single_byte() {
        assert_eq!(encode_vlq(0), vec![0x00]);
    }

    #[test]
    fn test_known_encodings() {
        // Sample values from the Standard MIDI File 1.0 document
        assert_eq!(encode_vlq(0x40), vec![0x40]);
        assert_eq!(encode_vlq(0x7F), vec![0x7F]);
        assert_eq!(encode_vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(encode_vlq(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encode_vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encode_vlq(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encode_vlq(0x1F_FFFF), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(encode_vlq(0x20_0000), vec![0x81, 0x80, 0x80, 0x00]);
        assert_eq!(encode_vlq(MAX_VLQ), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_read_back_across_range() {
        let mut value = 0u32;
        while value <= MAX_VLQ {
            let bytes = encode_vlq(value);
            assert!(bytes.len() <= 4, "{} took {} bytes", value, bytes.len());

            let mut pos = 0;
            assert_eq!(read_vlq(&bytes, &mut pos), Some(value));
            assert_eq!(pos, bytes.len());

            value = value * 3 + 1;
        }
    }

    #[test]
    fn test_read_stops_at_final_byte() {
        let bytes = [0x81, 0x00, 0x90, 0x3C];
        let mut pos = 0;
        assert_eq!(read_vlq(&bytes, &mut pos), Some(0x80));
        assert_eq!(pos, 2);
    }

    #[test]
    fn test_read_unterminated() {
        let bytes = [0x81, 0x80];
        let mut pos = 0;
        assert_eq!(read_vlq(&bytes, &mut pos), None);
    }
}
