//! This module contains the kernel for variable-length text columns.
//!
//! Each record is the UTF-8 bytes of the value followed by a single 0x00. A null is
//! the two bytes `0x80 0x00`; a lone 0x80 byte is never valid UTF-8, so no real
//! string can produce it. The empty string is just the terminator.

use crate::error::CopybinError;

pub const TERMINATOR: u8 = 0x00;
pub const NULL_MARKER: [u8; 2] = [0x80, TERMINATOR];

/// Encodes optional strings as NUL-terminated UTF-8 records.
///
/// Values that themselves contain a 0x00 byte cannot be framed and are rejected.
pub fn encode<S: AsRef<str>>(values: &[Option<S>]) -> Result<Vec<u8>, CopybinError> {
    let payload: usize = values
        .iter()
        .map(|v| v.as_ref().map_or(NULL_MARKER.len(), |s| s.as_ref().len() + 1))
        .sum();
    let mut out = Vec::with_capacity(payload);

    for (row, value) in values.iter().enumerate() {
        match value {
            None => out.extend_from_slice(&NULL_MARKER),
            Some(s) => {
                let bytes = s.as_ref().as_bytes();
                if bytes.contains(&TERMINATOR) {
                    return Err(CopybinError::InvalidValue(format!(
                        "row {}: text value contains a NUL byte",
                        row
                    )));
                }
                out.extend_from_slice(bytes);
                out.push(TERMINATOR);
            }
        }
    }
    Ok(out)
}

/// Splits a text column file into raw records without validating UTF-8.
///
/// Fails with `CorruptData` if the file does not end with a terminator.
pub fn split_records(bytes: &[u8]) -> Result<Vec<Option<&[u8]>>, CopybinError> {
    let mut records = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let Some(end) = rest.iter().position(|b| *b == TERMINATOR) else {
            return Err(CopybinError::CorruptData(format!(
                "text column file has {} unterminated trailing bytes after {} records",
                rest.len(),
                records.len()
            )));
        };
        let segment = &rest[..end];
        records.push(if segment == &NULL_MARKER[..1] {
            None
        } else {
            Some(segment)
        });
        rest = &rest[end + 1..];
    }
    Ok(records)
}

/// Decodes a text column file.
pub fn decode(bytes: &[u8]) -> Result<Vec<Option<String>>, CopybinError> {
    split_records(bytes)?
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            record
                .map(|raw| {
                    String::from_utf8(raw.to_vec()).map_err(|e| {
                        CopybinError::CorruptData(format!(
                            "row {}: text is not valid UTF-8: {}",
                            row, e
                        ))
                    })
                })
                .transpose()
        })
        .collect()
}

/// Cuts every value longer than `max_bytes` down to the longest prefix that fits and
/// ends on a character boundary. Returns the number of values shortened.
pub fn truncate_to(values: &mut [Option<String>], max_bytes: usize) -> usize {
    let mut shortened = 0;
    for value in values.iter_mut().flatten() {
        if value.len() > max_bytes {
            let mut end = max_bytes;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            value.truncate(end);
            shortened += 1;
        }
    }
    shortened
}
