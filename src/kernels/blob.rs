//! This module contains the kernel for binary (blob) columns.
//!
//! Each record is a u64 little-endian length followed by that many raw bytes. A null
//! is the length `u64::MAX` with no payload.

use crate::error::CopybinError;

pub const NULL_LENGTH: u64 = u64::MAX;
const LENGTH_BYTES: usize = std::mem::size_of::<u64>();

pub fn encode<B: AsRef<[u8]>>(values: &[Option<B>]) -> Vec<u8> {
    let payload: usize = values
        .iter()
        .map(|v| LENGTH_BYTES + v.as_ref().map_or(0, |b| b.as_ref().len()))
        .sum();
    let mut out = Vec::with_capacity(payload);
    for value in values {
        match value {
            None => out.extend_from_slice(&NULL_LENGTH.to_le_bytes()),
            Some(b) => {
                let b = b.as_ref();
                out.extend_from_slice(&(b.len() as u64).to_le_bytes());
                out.extend_from_slice(b);
            }
        }
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Option<Vec<u8>>>, CopybinError> {
    let mut values = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let row = values.len();
        let prefix: [u8; LENGTH_BYTES] = bytes
            .get(offset..offset + LENGTH_BYTES)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                CopybinError::CorruptData(format!(
                    "row {}: blob length prefix truncated at byte {}",
                    row, offset
                ))
            })?;
        offset += LENGTH_BYTES;

        let len = u64::from_le_bytes(prefix);
        if len == NULL_LENGTH {
            values.push(None);
            continue;
        }

        let end = usize::try_from(len)
            .ok()
            .and_then(|len| offset.checked_add(len))
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                CopybinError::CorruptData(format!(
                    "row {}: blob of {} bytes overruns the {}-byte file",
                    row,
                    len,
                    bytes.len()
                ))
            })?;
        values.push(Some(bytes[offset..end].to_vec()));
        offset = end;
    }
    Ok(values)
}
