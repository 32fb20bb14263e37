//! Oracle DATE codec.
//!
//! Oracle DATE is encoded as 7 bytes (big-endian):
//! - byte[0]: century + 100
//! - byte[1]: year (in century) + 100
//! - byte[2]: month (1-12)
//! - byte[3]: day (1-31)
//! - byte[4]: hour + 1 (0-23)
//! - byte[5]: minute + 1 (0-59)
//! - byte[6]: second + 1 (0-59)

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Decode an Oracle DATE from 7 bytes.
///
/// Returns a `NaiveDateTime` representing the date/time value.
///
/// # Arguments
/// * `data` - 7-byte DATE value from Oracle
///
/// # Errors
/// Returns `Error::Protocol` if data is not exactly 7 bytes or contains invalid values.
///
pub fn decode_oracle_date(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 7 {
        return Err(Error::protocol(format!(
            "DATE value must be exactly 7 bytes, got {}",
            data.len()
        )));
    }

    // Decode century and year
    let century = data[0] as i32 - 100;
    let year_in_century = data[1] as i32 - 100;
    let year = century * 100 + year_in_century;

    // Month and day are direct values
    let month = data[2];
    let day = data[3];

    // Hour, minute, second are stored as value + 1
    let hour = data[4].wrapping_sub(1);
    let minute = data[5].wrapping_sub(1);
    let second = data[6].wrapping_sub(1);

    // Validate ranges
    if !(1..=12).contains(&month) {
        return Err(Error::protocol(format!("Invalid month: {}", month)));
    }
    if !(1..=31).contains(&day) {
        return Err(Error::protocol(format!("Invalid day: {}", day)));
    }
    if hour > 23 {
        return Err(Error::protocol(format!("Invalid hour: {}", hour)));
    }
    if minute > 59 {
        return Err(Error::protocol(format!("Invalid minute: {}", minute)));
    }
    if second > 59 {
        return Err(Error::protocol(format!("Invalid second: {}", second)));
    }

    // Create NaiveDate and NaiveTime, then combine
    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
        Error::protocol(format!(
            "Invalid DATE: year={}, month={}, day={}",
            year, month, day
        ))
    })?;
    let time =
        NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32).ok_or_else(|| {
            Error::protocol(format!(
                "Invalid TIME: hour={}, minute={}, second={}",
                hour, minute, second
            ))
        })?;
    Ok(NaiveDateTime::new(date, time))
}

/// Encode a `NaiveDateTime` as a 7-byte Oracle DATE.
///
/// Fractional seconds are dropped. Years outside 1..=9999 are rejected.
pub fn encode_oracle_date(value: &NaiveDateTime) -> Result<[u8; 7]> {
    let year = value.year();
    if !(1..=9999).contains(&year) {
        return Err(Error::type_conversion(format!(
            "DATE year {} is out of range",
            year
        )));
    }
    Ok([
        (year / 100 + 100) as u8,
        (year % 100 + 100) as u8,
        value.month() as u8,
        value.day() as u8,
        value.hour() as u8 + 1,
        value.minute() as u8 + 1,
        value.second() as u8 + 1,
    ])
}
