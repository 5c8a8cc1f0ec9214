//! pure bucketing of sessions; every function here works on sessions
//! already read from the db and keeps a running sum per bucket key

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};

use super::{CategoryTotal, DayTotal, MonthTotal, WeekTotal, WeekdayProfile};
use crate::db::helpers::{days_in_month, week_start};
use crate::db::Session;

/// sum of all completed session durations; open sessions don't count
pub fn sum_seconds(sessions : &[Session]) -> i64
{
    sessions.iter().filter_map(Session::duration).sum()
}

/// completed seconds per start date, only dates w/ sessions appear
pub fn by_day(sessions : &[Session]) -> BTreeMap<NaiveDate, i64>
{
    let mut days = BTreeMap::new();

    for s in sessions
    {
        if let Some(secs) = s.duration()
        {
            *days.entry(s.date()).or_insert(0) += secs;
        }
    }

    days
}

/// one entry per date in `dates`, zero where nothing was logged
pub fn zero_filled(
    totals : &BTreeMap<NaiveDate, i64>,
    dates  : &[NaiveDate],
    ) -> Vec<DayTotal>
{
    dates.iter()
        .map(|d| DayTotal::new(*d, totals.get(d).copied().unwrap_or(0)))
        .collect()
}

/// days w/ logged time, ascending
pub fn daily(sessions : &[Session]) -> Vec<DayTotal>
{
    by_day(sessions)
        .into_iter()
        .map(|(date, seconds)| DayTotal::new(date, seconds))
        .collect()
}

/// per iso week, keyed by the monday it starts on, ascending
pub fn weekly(sessions : &[Session]) -> Vec<WeekTotal>
{
    let mut weeks : BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for (date, secs) in by_day(sessions)
    {
        *weeks.entry(week_start(date)).or_insert(0) += secs;
    }

    weeks.into_iter()
        .map(|(week_start, seconds)| WeekTotal {
            week_start,
            isoweek : week_start.iso_week().week(),
            seconds,
        })
        .collect()
}

/// per calendar month, ascending
pub fn monthly(sessions : &[Session]) -> Vec<MonthTotal>
{
    let mut months : BTreeMap<(i32, u32), i64> = BTreeMap::new();

    for (date, secs) in by_day(sessions)
    {
        *months.entry((date.year(), date.month())).or_insert(0) += secs;
    }

    months.into_iter()
        .map(|((year, month), seconds)| MonthTotal {
            year,
            month,
            name    : month_abbrev(year, month),
            days    : days_in_month(year, month),
            seconds,
        })
        .collect()
}

fn month_abbrev(year : i32, month : u32) -> String
{
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}

/// per category, largest first; ties ordered by name
pub fn by_category(
    sessions    : &[Session],
    category_of : &HashMap<String, String>,
    ) -> Vec<CategoryTotal>
{
    let mut cats : BTreeMap<&str, i64> = BTreeMap::new();

    for s in sessions
    {
        let (Some(secs), Some(cat)) = (s.duration(), category_of.get(&s.activity))
            else { continue };

        *cats.entry(cat.as_str()).or_insert(0) += secs;
    }

    let mut totals : Vec<CategoryTotal> = cats.into_iter()
        .map(|(category, seconds)| CategoryTotal {
            category : category.to_string(),
            seconds,
        })
        .collect();

    // stable sort keeps the name order among equal sums
    totals.sort_by(|a, b| b.seconds.cmp(&a.seconds));
    totals
}

/// min/mean/max of the daily totals per weekday, monday first;
/// weekdays w/o any day in `days` are left out
pub fn weekday_profile(days : &[DayTotal]) -> Vec<WeekdayProfile>
{
    let mut per_wd : BTreeMap<u32, (Weekday, Vec<i64>)> = BTreeMap::new();

    for d in days
    {
        let wd = d.date.weekday();
        per_wd.entry(wd.num_days_from_monday())
            .or_insert_with(|| (wd, Vec::new()))
            .1.push(d.seconds);
    }

    per_wd.into_values()
        .filter_map(|(weekday, secs)| {
            let min = *secs.iter().min()?;
            let max = *secs.iter().max()?;
            let mean = secs.iter().sum::<i64>() as f64 / secs.len() as f64;

            Some(WeekdayProfile {
                weekday,
                days : secs.len() as u32,
                min,
                mean,
                max,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::test::{at, day};

    fn s(act : &str, ymd : (i32, u32, u32), hh : u32, secs : Option<i64>) -> Session
    {
        let start = at(ymd, (hh, 0, 0));
        Session {
            activity : act.to_string(),
            start,
            end : secs.map(|x| start + chrono::Duration::seconds(x)),
        }
    }

    #[test]
    fn open_sessions_dont_count()
    {
        let v = [
            s("A", (2024, 1, 1), 8, Some(100)),
            s("A", (2024, 1, 1), 9, None),
        ];

        assert_eq!(sum_seconds(&v), 100);
        assert_eq!(by_day(&v).len(), 1);
    }

    #[test]
    fn zero_fill_has_no_gaps()
    {
        let v = [s("A", (2024, 1, 2), 8, Some(60))];
        let dates = [day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)];
        let filled = zero_filled(&by_day(&v), &dates);

        assert_eq!(filled.len(), 3);
        assert_eq!(
            filled.iter().map(|d| d.seconds).collect::<Vec<_>>(),
            vec![0, 60, 0]);
        assert_eq!(filled[1].weekday, Weekday::Tue);
    }

    #[test]
    fn weeks_start_monday()
    {
        // 2023-12-31 is a Sunday, 2024-01-01 a Monday
        let v = [
            s("A", (2023, 12, 31), 8, Some(10)),
            s("A", (2024, 1, 1), 8, Some(20)),
            s("A", (2024, 1, 7), 8, Some(30)),
        ];
        let w = weekly(&v);

        assert_eq!(w.len(), 2);
        assert_eq!(w[0].week_start, day(2023, 12, 25));
        assert_eq!(w[0].seconds, 10);
        assert_eq!(w[1].week_start, day(2024, 1, 1));
        assert_eq!(w[1].isoweek, 1);
        assert_eq!(w[1].seconds, 50);
    }

    #[test]
    fn months_named_and_sized()
    {
        let v = [
            s("A", (2024, 2, 1), 8, Some(10)),
            s("A", (2024, 2, 29), 8, Some(10)),
            s("A", (2024, 3, 1), 8, Some(5)),
        ];
        let m = monthly(&v);

        assert_eq!(m.len(), 2);
        assert_eq!((m[0].year, m[0].month, m[0].days), (2024, 2, 29));
        assert_eq!(m[0].name, "Feb");
        assert_eq!(m[0].seconds, 20);
        assert_eq!(m[1].name, "Mar");
    }

    #[test]
    fn categories_sorted_by_total()
    {
        let category_of : HashMap<String, String> = [
            ("A", "X"), ("B", "Y"), ("C", "Y"),
        ].into_iter().map(|(a, c)| (a.to_string(), c.to_string())).collect();

        let v = [
            s("A", (2024, 1, 1), 8, Some(50)),
            s("B", (2024, 1, 1), 9, Some(40)),
            s("C", (2024, 1, 1), 10, Some(30)),
            s("C", (2024, 1, 1), 11, None),
        ];
        let c = by_category(&v, &category_of);

        assert_eq!(c.len(), 2);
        assert_eq!((c[0].category.as_str(), c[0].seconds), ("Y", 70));
        assert_eq!((c[1].category.as_str(), c[1].seconds), ("X", 50));
    }

    #[test]
    fn weekday_profile_stats()
    {
        // two mondays, one tuesday
        let days = [
            DayTotal::new(day(2024, 1, 1), 100),
            DayTotal::new(day(2024, 1, 2), 0),
            DayTotal::new(day(2024, 1, 8), 300),
        ];
        let p = weekday_profile(&days);

        assert_eq!(p.len(), 2);
        assert_eq!(p[0].weekday, Weekday::Mon);
        assert_eq!((p[0].days, p[0].min, p[0].max), (2, 100, 300));
        assert!((p[0].mean - 200.).abs() < 1e-9);
        assert_eq!(p[1].weekday, Weekday::Tue);
        assert_eq!(p[1].max, 0);
    }
}
