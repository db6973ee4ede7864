use super::TicParseError;

pub const HISTORIC_BAUD_RATE: u32 = 1200;
pub const STANDARD_BAUD_RATE: u32 = 9600;

pub const HISTORIC_FIELD_SEPARATOR: u8 = b' ';
pub const STANDARD_FIELD_SEPARATOR: u8 = b'\t';

pub const LINE_FEED: u8 = 0x0A;
pub const CARRIAGE_RETURN: u8 = 0x0D;
pub const FRAME_START: u8 = 0x02;
pub const FRAME_END: u8 = 0x03;

pub const CHECKSUM_MASK: u32 = 0x3F;
pub const CHECKSUM_OFFSET: u32 = 0x20;

/// Longest line kept by the framer, real groups stay well under 100 bytes
pub const MAX_GROUP_LENGTH: usize = 1024;

/// Removes line and frame terminators from the end of a raw line.
///
/// A group is `LF payload CR`, and the last group of a frame is followed by
/// `ETX STX` before the next `LF`, so a line split on `LF` may end with any of
/// those bytes.
pub fn strip_terminators(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && is_terminator(line[end - 1]) {
        end -= 1;
    }
    &line[..end]
}

fn is_terminator(byte: u8) -> bool {
    matches!(byte, LINE_FEED | CARRIAGE_RETURN | FRAME_START | FRAME_END)
}

/// Splits on every separator, keeping empty fields
pub fn split_fields(line: &[u8], separator: u8) -> Vec<&[u8]> {
    line.split(|b| *b == separator).collect()
}

pub fn decode_ascii(field: &'static str, bytes: &[u8]) -> Result<String, TicParseError> {
    if !bytes.is_ascii() {
        return Err(TicParseError::NotAscii { field });
    }
    Ok(bytes.iter().map(|b| *b as char).collect())
}

pub fn sum_bytes(frame: &[u8]) -> u32 {
    // only the low 6 bits matter, wrapping keeps them intact
    frame.iter().fold(0u32, |sum, b| sum.wrapping_add(*b as u32))
}

/// Returns (truncated, computed) for a raw sum
pub fn checksum_from_sum(s1: u32) -> (u32, u32) {
    let truncated = s1 & CHECKSUM_MASK;
    (truncated, truncated + CHECKSUM_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_terminators() {
        assert_eq!(strip_terminators(b"PAPP 00750 -\r\n"), b"PAPP 00750 -");
        assert_eq!(strip_terminators(b"MOTDETAT 000000 B\r\x03\x02\n"), b"MOTDETAT 000000 B");
        assert_eq!(strip_terminators(b"IMAX 98  \r\n"), b"IMAX 98  ");
        assert_eq!(strip_terminators(b"\r\n"), b"");
    }

    #[test]
    fn test_split_fields_keeps_empty() {
        let fields = split_fields(b"IMAX 98  ", b' ');
        assert_eq!(fields, vec![&b"IMAX"[..], &b"98"[..], &b""[..], &b""[..]]);
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_ascii("value", b"BASE").unwrap(), "BASE");
        assert!(matches!(
            decode_ascii("value", &[0x42, 0xC3, 0xA9]),
            Err(TicParseError::NotAscii { field: "value" })
        ));
    }

    #[test]
    fn test_checksum_from_sum() {
        // "OPTARIF BASE"
        assert_eq!(sum_bytes(b"OPTARIF BASE"), 848);
        assert_eq!(checksum_from_sum(848), (16, 0x30));
        assert_eq!(checksum_from_sum(0), (0, 0x20));
    }

    #[test]
    fn test_sum_bytes_wraps_on_huge_input() {
        let frame = vec![0xFFu8; 17_000_000];
        let expected = (17_000_000u64 * 0xFF) & CHECKSUM_MASK as u64;
        assert_eq!(sum_bytes(&frame) & CHECKSUM_MASK, expected as u32);
    }
}
