use std::sync::OnceLock;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, SubsecRound};
use regex::Regex;
use rusqlite::types::Type;

/// wall-clock timestamps are stored as TEXT in this layout;
/// lexicographic order equals chronological order
pub const TS_FORMAT : &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT : &str = "%Y-%m-%d";

// helper function to clean a sql query
pub fn clean(input : String) -> String
{
    static WS : OnceLock<Regex> = OnceLock::new();

    let s = input.replace("\n", " ").replace("\t", " ");
    let r = WS.get_or_init(|| Regex::new(r"\s{2,}").expect("valid regex"));
    r.replace_all(&s, " ").trim().to_string()
}

/// local wall-clock now, truncated to whole seconds
pub fn now() -> NaiveDateTime
{
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn today() -> NaiveDate
{
    Local::now().date_naive()
}

pub fn fmt_ts(ts : &NaiveDateTime) -> String
{
    ts.format(TS_FORMAT).to_string()
}

pub fn fmt_date(date : &NaiveDate) -> String
{
    date.format(DATE_FORMAT).to_string()
}

/// parse a stored timestamp; meant to be called from within row closures
pub fn parse_ts(idx : usize, s : &str) -> rusqlite::Result<NaiveDateTime>
{
    NaiveDateTime::parse_from_str(s, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

// helper function to compute number of days in a given month
pub fn days_in_month(year : i32, month : u32) -> u32
{
    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year + 1, 1, 1))
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// monday of the iso week `date` falls into
pub fn week_start(date : NaiveDate) -> NaiveDate
{
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// inclusive list of `n` consecutive dates ending at `last`;
/// dates before chrono's supported range are left out
pub fn trailing_days(last : NaiveDate, n : u32) -> Vec<NaiveDate>
{
    (0..i64::from(n))
        .rev()
        .filter_map(|back| last.checked_sub_signed(Duration::days(back)))
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn clean_works()
    {
        let s = "Test\tstring\nfor cleaning\t".to_string();
        assert_eq!(clean(s), "Test string for cleaning".to_string());
    }

    #[test]
    fn days_in_month_works()
    {
        assert_eq!(days_in_month(2024, 01), 31);
        assert_eq!(days_in_month(2024, 02), 29);
        assert_eq!(days_in_month(2025, 02), 28);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn timestamp_format_round_trips()
    {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
            .and_hms_opt(7, 5, 9).unwrap();

        assert_eq!(fmt_ts(&ts), "2024-03-04 07:05:09");
        assert_eq!(parse_ts(0, &fmt_ts(&ts)).unwrap(), ts);
        assert!(parse_ts(0, "yesterday").is_err());
    }

    #[test]
    fn week_start_is_monday()
    {
        // 2024-01-04 was a Thursday
        let thu = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let mon = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_start(thu), mon);
        assert_eq!(week_start(mon), mon);
    }

    #[test]
    fn trailing_days_inclusive()
    {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = trailing_days(d, 3);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!(days[2], d);
        assert!(trailing_days(d, 0).is_empty());

        // nothing before the earliest representable date
        assert_eq!(trailing_days(NaiveDate::MIN, 3), vec![NaiveDate::MIN]);
    }
}
