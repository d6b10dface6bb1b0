//! This module contains the kernels for date, time and datetime columns.
//!
//! The wire records are packed C structs (no padding), cast to and from bytes with
//! `bytemuck`. Multi-byte fields are stored little-endian:
//!
//! | type     | record                                                   | bytes |
//! |----------|----------------------------------------------------------|-------|
//! | date     | `{day: u8, month: u8, year: i16}`                        | 4     |
//! | time     | `{ms: u32, seconds: u8, minutes: u8, hours: u8, pad: u8}` | 8     |
//! | datetime | time record followed by date record                      | 12    |

use bytemuck::{Pod, Zeroable};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::CopybinError;
use crate::kernels::fixed_width::record_count;

//==================================================================================
// 1. Record Layouts
//==================================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DateRecord {
    pub day: u8,
    pub month: u8,
    pub year: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TimeRecord {
    pub ms: u32,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub padding: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DatetimeRecord {
    pub time: TimeRecord,
    pub date: DateRecord,
}

pub const DATE_NULL: DateRecord = DateRecord {
    day: 255,
    month: 255,
    year: -1,
};

pub const TIME_NULL: TimeRecord = TimeRecord {
    ms: 0xFFFF_FFFF,
    seconds: 255,
    minutes: 255,
    hours: 255,
    padding: 255,
};

pub const DATETIME_NULL: DatetimeRecord = DatetimeRecord {
    time: TIME_NULL,
    date: DATE_NULL,
};

impl DateRecord {
    fn to_wire(self) -> Self {
        Self {
            year: self.year.to_le(),
            ..self
        }
    }

    fn to_native(self) -> Self {
        Self {
            year: i16::from_le(self.year),
            ..self
        }
    }

    fn is_null(&self) -> bool {
        self.year == -1
    }

    fn from_date(date: &NaiveDate, row: usize) -> Result<Self, CopybinError> {
        let year = i16::try_from(date.year())
            .ok()
            .filter(|y| *y != DATE_NULL.year)
            .ok_or_else(|| {
                CopybinError::InvalidValue(format!(
                    "row {}: year {} cannot be stored in a date record",
                    row,
                    date.year()
                ))
            })?;
        Ok(Self {
            // Both fit a byte: day is 1..=31, month 1..=12.
            day: date.day() as u8,
            month: date.month() as u8,
            year,
        })
    }

    fn to_date(self, row: usize) -> Result<NaiveDate, CopybinError> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
            .ok_or_else(|| {
                CopybinError::CorruptData(format!(
                    "row {}: invalid date record {}-{}-{}",
                    row, self.year, self.month, self.day
                ))
            })
    }
}

impl TimeRecord {
    fn to_wire(self) -> Self {
        Self {
            ms: self.ms.to_le(),
            ..self
        }
    }

    fn to_native(self) -> Self {
        Self {
            ms: u32::from_le(self.ms),
            ..self
        }
    }

    fn is_null(&self) -> bool {
        self.ms == TIME_NULL.ms || self.seconds >= 60 || self.minutes >= 60 || self.hours >= 24
    }

    fn from_time(time: &NaiveTime, row: usize) -> Result<Self, CopybinError> {
        // Leap seconds surface as 1000..=1999 ms, which the record cannot hold.
        let ms = time.nanosecond() / 1_000_000;
        if ms >= 1000 {
            return Err(CopybinError::InvalidValue(format!(
                "row {}: leap second {} cannot be stored in a time record",
                row, time
            )));
        }
        Ok(Self {
            ms,
            seconds: time.second() as u8,
            minutes: time.minute() as u8,
            hours: time.hour() as u8,
            padding: 0,
        })
    }

    fn to_time(self, row: usize) -> Result<NaiveTime, CopybinError> {
        NaiveTime::from_hms_milli_opt(
            u32::from(self.hours),
            u32::from(self.minutes),
            u32::from(self.seconds),
            self.ms,
        )
        .ok_or_else(|| {
            CopybinError::CorruptData(format!(
                "row {}: invalid time record {:02}:{:02}:{:02}.{:03}",
                row, self.hours, self.minutes, self.seconds, self.ms
            ))
        })
    }
}

//==================================================================================
// 2. Generic Record Plumbing
//==================================================================================

fn encode_records<T, R, F>(
    values: &[Option<T>],
    null: R,
    mut to_record: F,
) -> Result<Vec<u8>, CopybinError>
where
    R: Pod,
    F: FnMut(&T, usize) -> Result<R, CopybinError>,
{
    let records = values
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Ok(null),
            Some(value) => to_record(value, row),
        })
        .collect::<Result<Vec<R>, _>>()?;
    Ok(bytemuck::cast_slice::<R, u8>(&records).to_vec())
}

fn decode_records<T, R, F>(
    bytes: &[u8],
    what: &str,
    mut from_record: F,
) -> Result<Vec<Option<T>>, CopybinError>
where
    R: Pod,
    F: FnMut(R, usize) -> Result<Option<T>, CopybinError>,
{
    let width = std::mem::size_of::<R>();
    let count = record_count(bytes, width, what)?;
    let mut values = Vec::with_capacity(count);
    for (row, chunk) in bytes.chunks_exact(width).enumerate() {
        values.push(from_record(bytemuck::pod_read_unaligned::<R>(chunk), row)?);
    }
    Ok(values)
}

//==================================================================================
// 3. Public API
//==================================================================================

pub fn encode_date(values: &[Option<NaiveDate>]) -> Result<Vec<u8>, CopybinError> {
    encode_records(values, DATE_NULL, |d, row| {
        Ok(DateRecord::from_date(d, row)?.to_wire())
    })
}

pub fn decode_date(bytes: &[u8]) -> Result<Vec<Option<NaiveDate>>, CopybinError> {
    decode_records(bytes, "date", |r: DateRecord, row| {
        let r = r.to_native();
        if r.is_null() {
            Ok(None)
        } else {
            r.to_date(row).map(Some)
        }
    })
}

pub fn encode_time(values: &[Option<NaiveTime>]) -> Result<Vec<u8>, CopybinError> {
    encode_records(values, TIME_NULL, |t, row| {
        Ok(TimeRecord::from_time(t, row)?.to_wire())
    })
}

pub fn decode_time(bytes: &[u8]) -> Result<Vec<Option<NaiveTime>>, CopybinError> {
    decode_records(bytes, "time", |r: TimeRecord, row| {
        let r = r.to_native();
        if r.is_null() {
            Ok(None)
        } else {
            r.to_time(row).map(Some)
        }
    })
}

/// Datetimes are truncated to millisecond resolution.
pub fn encode_datetime(values: &[Option<NaiveDateTime>]) -> Result<Vec<u8>, CopybinError> {
    encode_records(values, DATETIME_NULL, |dt, row| {
        Ok(DatetimeRecord {
            time: TimeRecord::from_time(&dt.time(), row)?.to_wire(),
            date: DateRecord::from_date(&dt.date(), row)?.to_wire(),
        })
    })
}

pub fn decode_datetime(bytes: &[u8]) -> Result<Vec<Option<NaiveDateTime>>, CopybinError> {
    decode_records(bytes, "datetime", |r: DatetimeRecord, row| {
        let date = r.date.to_native();
        if date.is_null() {
            return Ok(None);
        }
        let time = r.time.to_native().to_time(row)?;
        Ok(Some(NaiveDateTime::new(date.to_date(row)?, time)))
    })
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
