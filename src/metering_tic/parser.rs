use super::{structs::{DecodedField, WireMode}, utils, InvalidChecksum, TicParseError};
use log::debug;

/// Raw fields of a line, before validation
struct RawFields<'a> {
    tag: &'a [u8],
    timestamp: Option<&'a [u8]>,
    value: &'a [u8],
    checksum: u8,
}

pub fn parse_line(line: &[u8], mode: WireMode) -> Result<DecodedField, TicParseError> {
    let raw = extract_fields(line, mode)?;

    validate_checksum(raw.tag, raw.timestamp, raw.value, raw.checksum, mode)?;
    debug!("line checksum is valid");

    let timestamp = match raw.timestamp {
        Some(ts) => Some(utils::decode_ascii("timestamp", ts)?),
        None => None,
    };

    Ok(DecodedField {
        tag: utils::decode_ascii("tag", raw.tag)?,
        value: utils::decode_ascii("value", raw.value)?,
        timestamp,
    })
}

fn extract_fields(line: &[u8], mode: WireMode) -> Result<RawFields<'_>, TicParseError> {
    let separator = mode.separator();
    let fields = utils::split_fields(line, separator);

    let raw = match (mode, fields.len()) {
        (WireMode::Standard, 4) => RawFields {
            tag: fields[0],
            timestamp: Some(fields[1]),
            value: fields[2],
            checksum: single_byte(fields[3], mode, fields.len())?,
        },
        (WireMode::Standard, 3) | (WireMode::Historic, 3) => RawFields {
            tag: fields[0],
            timestamp: None,
            value: fields[1],
            checksum: single_byte(fields[2], mode, fields.len())?,
        },
        // The checksum byte is the separator itself, the split leaves two empty fields behind
        (WireMode::Historic, 4) => RawFields {
            tag: fields[0],
            timestamp: None,
            value: fields[1],
            checksum: separator,
        },
        (_, count) => return Err(TicParseError::FieldCount { mode, count }),
    };

    Ok(raw)
}

fn single_byte(field: &[u8], mode: WireMode, count: usize) -> Result<u8, TicParseError> {
    match field {
        [checksum] => Ok(*checksum),
        _ => Err(TicParseError::FieldCount { mode, count }),
    }
}

/// Rebuilds the checksummed frame of a group.
///
/// The standard mode frame always ends with a separator, the historic one never does.
pub fn build_frame(tag: &[u8], timestamp: Option<&[u8]>, value: &[u8], mode: WireMode) -> Vec<u8> {
    let sep = mode.separator();
    let mut frame = Vec::with_capacity(tag.len() + value.len() + 24);

    frame.extend_from_slice(tag);
    frame.push(sep);
    match mode {
        WireMode::Standard => {
            if let Some(ts) = timestamp {
                frame.extend_from_slice(ts);
                frame.push(sep);
            }
            frame.extend_from_slice(value);
            frame.push(sep);
        }
        WireMode::Historic => {
            frame.extend_from_slice(value);
        }
    }

    frame
}

pub fn compute_checksum(tag: &[u8], timestamp: Option<&[u8]>, value: &[u8], mode: WireMode) -> u8 {
    let s1 = utils::sum_bytes(&build_frame(tag, timestamp, value, mode));
    let (_, computed) = utils::checksum_from_sum(s1);
    computed as u8
}

pub fn validate_checksum(
    tag: &[u8],
    timestamp: Option<&[u8]>,
    value: &[u8],
    checksum: u8,
    mode: WireMode,
) -> Result<(), InvalidChecksum> {
    let s1 = utils::sum_bytes(&build_frame(tag, timestamp, value, mode));
    let (truncated, computed) = utils::checksum_from_sum(s1);

    if computed != checksum as u32 {
        return Err(InvalidChecksum {
            tag: String::from_utf8_lossy(tag).into_owned(),
            timestamp: timestamp.map(|ts| String::from_utf8_lossy(ts).into_owned()),
            value: String::from_utf8_lossy(value).into_owned(),
            s1,
            truncated,
            computed,
            expected: checksum,
        });
    }

    Ok(())
}
