//! conversion between integer seconds and `hh:mm:ss` display strings
//!
//! hours are unbounded (`100:00:00` is fine), so the same functions serve the
//! live timers and aggregated weekly/monthly sums

use crate::error::{Error, Result};

/// seconds to zero padded `hh:mm:ss`; hours get at least two digits
pub fn to_clock(seconds : i64) -> Result<String>
{
    u64::try_from(seconds)
        .map(fmt_clock)
        .map_err(|_| Error::validation(
            "duration", format!("{seconds} is negative")))
}

/// infallible variant of to_clock for values that can't be negative
pub fn fmt_clock(seconds : u64) -> String
{
    let hh = seconds / 3600;
    let mm = seconds % 3600 / 60;
    let ss = seconds % 60;

    format!("{:02}:{:02}:{:02}", hh, mm, ss)
}

/// inverse of to_clock
pub fn from_clock(s : &str) -> Result<i64>
{
    let s = s.trim();
    let parts : Vec<&str> = s.split(':').collect();

    if parts.len() != 3
    {
        return Err(Error::validation(
            "clock string", format!("'{s}' is not of the form hh:mm:ss")));
    }

    let mut fields = [0i64; 3];

    for (field, part) in fields.iter_mut().zip(&parts)
    {
        if part.starts_with('-')
        {
            return Err(Error::validation(
                "clock string", format!("'{s}' has a negative field")));
        }
        // parse() alone would accept a leading '+'
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::validation(
                "clock string", format!("'{part}' is not a number")));
        }

        *field = part.parse().map_err(|_| Error::validation(
                "clock string", format!("'{part}' is out of range")))?;
    }

    let [hh, mm, ss] = fields;

    if mm >= 60 || ss >= 60
    {
        return Err(Error::validation(
            "clock string", format!("'{s}' has minutes or seconds >= 60")));
    }

    hh.checked_mul(3600)
        .and_then(|h| h.checked_add(mm * 60 + ss))
        .ok_or_else(|| Error::validation(
            "clock string", format!("'{s}' is out of range")))
}

pub fn from_hms(hours : i64, minutes : i64, seconds : i64) -> i64
{
    hours * 3600 + minutes * 60 + seconds
}

/// validates a countdown goal entered as separate fields;
/// 0-24 hours, 0-59 minutes/seconds, and not all zero
pub fn goal_from_hms(hours : i64, minutes : i64, seconds : i64) -> Result<i64>
{
    if !(0..=24).contains(&hours)
    {
        return Err(Error::validation("hours", "enter hours between 0 and 24"));
    }
    if !(0..60).contains(&minutes)
    {
        return Err(Error::validation("minutes", "enter minutes between 0 and 59"));
    }
    if !(0..60).contains(&seconds)
    {
        return Err(Error::validation("seconds", "enter seconds between 0 and 59"));
    }
    if hours == 0 && minutes == 0 && seconds == 0
    {
        return Err(Error::validation("goal", "enter a time above 00:00:00"));
    }

    Ok(from_hms(hours, minutes, seconds))
}
