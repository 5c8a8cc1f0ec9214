//! submodule dealing with statistics
//! reads completed sessions from the log and buckets them per day, week,
//! month and category; every function is a pure read, the reference date
//! is passed in by the caller

pub mod helpers;

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rusqlite::{params, Connection};
use serde::Serialize;

use super::events::{pair_events, row_to_event};
use super::goal::DailyGoal;
use super::helpers::{fmt_date, trailing_days, DATE_FORMAT};
use super::queries::{SQL_TABLEN_ACT, SQL_TABLEN_LOG};
use super::setup::{activities, require_activity, require_category};
use super::{LogEvent, Session};
use crate::error::{Error, Result};

/// what a sum is computed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Activity(String),
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub seconds: i64,
}

impl DayTotal {
    pub fn new(date: NaiveDate, seconds: i64) -> Self {
        DayTotal {
            date,
            weekday: date.weekday(),
            seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekTotal {
    /// monday of the week
    pub week_start: NaiveDate,
    pub isoweek: u32,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    /// abbreviated month name, e.g. "Feb"
    pub name: String,
    /// number of days in that month
    pub days: u32,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayProfile {
    pub weekday: Weekday,
    pub days: u32,
    pub min: i64,
    pub mean: f64,
    pub max: i64,
}

/// countdown state for a day; `remaining` never drops below zero,
/// anything past the goal shows up as `overshoot`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub goal: i64,
    pub logged: i64,
    pub remaining: i64,
    pub overshoot: i64,
}

impl Countdown {
    pub fn new(goal: DailyGoal, logged: i64) -> Self {
        Countdown {
            goal: goal.seconds,
            logged,
            remaining: (goal.seconds - logged).max(0),
            overshoot: (logged - goal.seconds).max(0),
        }
    }

    pub fn reached(&self) -> bool {
        self.remaining == 0
    }

    /// share of the goal achieved, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.goal == 0 {
            return 1.0;
        }
        (self.logged as f64 / self.goal as f64).min(1.0)
    }
}

/// completed sessions in scope that started on a day in [from, to];
/// None leaves that end of the range open
fn scoped_sessions(
    db: &Connection,
    scope: &Scope,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<Session>> {
    let (activity, category) = match scope {
        Scope::All => (None, None),
        Scope::Activity(name) => {
            require_activity(db, name)?;
            (Some(name.as_str()), None)
        }
        Scope::Category(name) => {
            require_category(db, name)?;
            (None, Some(name.as_str()))
        }
    };

    let mut stmt = db.prepare(&format!(
        "SELECT l.id, l.activity, l.event, l.timestamp
         FROM {} l JOIN {} a ON a.name = l.activity
         WHERE (?1 IS NULL OR l.activity = ?1)
           AND (?2 IS NULL OR a.category = ?2)
           AND (?3 IS NULL OR date(l.timestamp) >= ?3)
         ORDER BY l.id ASC",
        SQL_TABLEN_LOG, SQL_TABLEN_ACT
    ))?;

    let from_str = from.map(|d| fmt_date(&d));
    let rows = stmt.query_map(params![activity, category, from_str], row_to_event)?;

    // pairing is per activity, events of different activities interleave
    let mut streams: BTreeMap<String, Vec<LogEvent>> = BTreeMap::new();
    for ev in rows {
        let ev = ev?;
        streams.entry(ev.activity.clone()).or_default().push(ev);
    }

    let mut sessions: Vec<Session> = streams
        .values()
        .flat_map(|events| pair_events(events))
        .filter(|s| !s.is_open())
        .filter(|s| to.map_or(true, |to| s.date() <= to))
        .collect();

    sessions.sort_by(|a, b| a.start.cmp(&b.start));
    Ok(sessions)
}

/// completed sessions in scope starting on a day in [from, to]
pub fn completed_sessions(
    db: &Connection,
    scope: &Scope,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Session>> {
    if from > to {
        return Err(Error::validation("date range", format!("{from} lies after {to}")));
    }
    scoped_sessions(db, scope, Some(from), Some(to))
}

/// sum of completed session durations in scope that started on `day`
pub fn sum_duration(db: &Connection, scope: &Scope, day: NaiveDate) -> Result<i64> {
    let sessions = completed_sessions(db, scope, day, day)?;
    Ok(helpers::sum_seconds(&sessions))
}

/// longest window of days any aggregate is computed over
pub const MAX_WINDOW_DAYS: u32 = 100 * 366;

/// first day of the `n` days ending `today`; `n` of 0 yields `today`
pub fn window_start(n: u32, today: NaiveDate) -> Result<NaiveDate> {
    if n > MAX_WINDOW_DAYS {
        return Err(Error::validation(
            "day count",
            format!("{n} exceeds {MAX_WINDOW_DAYS} days"),
        ));
    }

    today
        .checked_sub_signed(Duration::days(i64::from(n.max(1)) - 1))
        .ok_or_else(|| Error::validation("day count", format!("{n} days before {today}")))
}

/// daily totals over all activities for the `n` days ending `today`,
/// zero-filled, oldest first
pub fn last_n_days(db: &Connection, n: u32, today: NaiveDate) -> Result<Vec<DayTotal>> {
    last_n_days_for(db, &Scope::All, n, today)
}

pub fn last_n_days_for(
    db: &Connection,
    scope: &Scope,
    n: u32,
    today: NaiveDate,
) -> Result<Vec<DayTotal>> {
    window_start(n, today)?;
    let dates = trailing_days(today, n);

    let Some(first) = dates.first() else {
        return Ok(Vec::new());
    };

    let sessions = completed_sessions(db, scope, *first, today)?;
    Ok(helpers::zero_filled(&helpers::by_day(&sessions), &dates))
}

/// mean daily total over the trailing `n_weeks * 7` days, today included
pub fn weekly_average(db: &Connection, n_weeks: u32, today: NaiveDate) -> Result<f64> {
    if n_weeks == 0 {
        return Err(Error::validation("week count", "needs at least one week"));
    }

    let n_days = n_weeks
        .checked_mul(7)
        .ok_or_else(|| Error::validation("week count", format!("{n_weeks} weeks is too many")))?;

    let days = last_n_days(db, n_days, today)?;
    let total: i64 = days.iter().map(|d| d.seconds).sum();

    Ok(total as f64 / days.len() as f64)
}

/// what's left of the daily goal after today's completed sessions
pub fn remaining_today(db: &Connection, goal: DailyGoal, today: NaiveDate) -> Result<Countdown> {
    let logged = sum_duration(db, &Scope::All, today)?;
    Ok(Countdown::new(goal, logged))
}

/// every day w/ logged time, oldest first
pub fn daily_summary(db: &Connection) -> Result<Vec<DayTotal>> {
    Ok(helpers::daily(&scoped_sessions(db, &Scope::All, None, None)?))
}

pub fn weekly_summary(db: &Connection) -> Result<Vec<WeekTotal>> {
    Ok(helpers::weekly(&scoped_sessions(db, &Scope::All, None, None)?))
}

pub fn monthly_summary(db: &Connection) -> Result<Vec<MonthTotal>> {
    Ok(helpers::monthly(&scoped_sessions(db, &Scope::All, None, None)?))
}

/// seconds per category for sessions starting in [from, to], largest first
pub fn category_totals(
    db: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CategoryTotal>> {
    let sessions = completed_sessions(db, &Scope::All, from, to)?;

    let category_of: HashMap<String, String> = activities(db)?
        .into_iter()
        .map(|a| (a.name, a.category))
        .collect();

    Ok(helpers::by_category(&sessions, &category_of))
}

/// daily totals of the trailing `days` grouped by weekday, zero days included
pub fn weekday_profile(db: &Connection, days: u32, today: NaiveDate) -> Result<Vec<WeekdayProfile>> {
    let totals = last_n_days(db, days, today)?;
    Ok(helpers::weekday_profile(&totals))
}

/// date of the earliest logged event, if any
pub fn first_entry_date(db: &Connection) -> Result<Option<NaiveDate>> {
    let first: Option<String> = db.query_row(
        &format!("SELECT date(MIN(timestamp)) FROM {}", SQL_TABLEN_LOG),
        (),
        |row| row.get(0),
    )?;

    Ok(first.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()))
}

/// days between the first entry and `today`, both included; at most `cap`
pub fn relevant_days(db: &Connection, today: NaiveDate, cap: u32) -> Result<u32> {
    let Some(first) = first_entry_date(db)? else {
        return Ok(0);
    };

    let span = (today - first + Duration::days(1)).num_days().max(0);
    Ok(u32::try_from(span).unwrap_or(u32::MAX).min(cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{events, goal};
    use crate::test::{self, at, day, POPULATED_SECS_PER_ACTIVITY};

    #[test]
    fn goal_minus_logged() {
        let mut db = test::setup_db();
        test::session(&mut db, "Reading", (2024, 5, 6), (9, 0, 0), 1500);

        let goal = goal::set_goal(&mut db, 3600).unwrap();
        let cd = remaining_today(&db, goal, day(2024, 5, 6)).unwrap();

        assert_eq!(cd.remaining, 2100);
        assert_eq!(cd.overshoot, 0);
        assert!(!cd.reached());
    }

    #[test]
    fn overshoot_reported() {
        let mut db = test::setup_db();
        test::session(&mut db, "Reading", (2024, 5, 6), (9, 0, 0), 4000);

        let cd = remaining_today(&db, DailyGoal { seconds: 3600 }, day(2024, 5, 6)).unwrap();

        assert_eq!(cd.remaining, 0);
        assert_eq!(cd.overshoot, 400);
        assert!(cd.reached());
        assert_eq!(cd.progress(), 1.0);
    }

    #[test]
    fn open_session_not_counted_today() {
        let mut db = test::setup_db();
        test::session(&mut db, "Reading", (2024, 5, 6), (9, 0, 0), 600);
        events::start_at(&mut db, "Writing", at((2024, 5, 6), (10, 0, 0))).unwrap();

        let cd = remaining_today(&db, DailyGoal { seconds: 3600 }, day(2024, 5, 6)).unwrap();
        assert_eq!(cd.logged, 600);
    }

    #[test]
    fn sum_duration_scopes() {
        let mut db = test::setup_db();
        let d = (2024, 5, 6);
        test::session(&mut db, "Reading", d, (8, 0, 0), 100);
        test::session(&mut db, "Reading", d, (9, 0, 0), 200);
        test::session(&mut db, "Writing", d, (10, 0, 0), 400);
        test::session(&mut db, "Coding", d, (11, 0, 0), 800);
        // next day, must not leak in
        test::session(&mut db, "Coding", (2024, 5, 7), (11, 0, 0), 1600);

        let day = day(2024, 5, 6);
        let reading = Scope::Activity("Reading".into());

        assert_eq!(sum_duration(&db, &reading, day).unwrap(), 300);
        assert_eq!(sum_duration(&db, &Scope::Category("Study".into()), day).unwrap(), 700);
        assert_eq!(sum_duration(&db, &Scope::Category("Work".into()), day).unwrap(), 800);
        assert_eq!(sum_duration(&db, &Scope::All, day).unwrap(), 1500);

        // additive over the sessions of the day
        let per_session: i64 = events::sessions(&db, "Reading", day, day)
            .unwrap()
            .iter()
            .filter_map(Session::duration)
            .sum();
        assert_eq!(sum_duration(&db, &reading, day).unwrap(), per_session);

        assert!(matches!(
            sum_duration(&db, &Scope::Category("Nope".into()), day),
            Err(Error::Reference(_))
        ));
    }

    #[test]
    fn midnight_session_counts_for_start_day() {
        let mut db = test::setup_db();
        test::session(&mut db, "Reading", (2024, 1, 1), (23, 30, 0), 3600);

        assert_eq!(sum_duration(&db, &Scope::All, day(2024, 1, 1)).unwrap(), 3600);
        assert_eq!(sum_duration(&db, &Scope::All, day(2024, 1, 2)).unwrap(), 0);
    }

    #[test]
    fn last_seven_days_no_gaps() {
        let mut db = test::setup_db();
        // outside the window
        test::session(&mut db, "Coding", (2024, 4, 29), (9, 0, 0), 999);
        test::session(&mut db, "Reading", (2024, 5, 2), (9, 0, 0), 60);
        test::session(&mut db, "Coding", (2024, 5, 6), (9, 0, 0), 120);

        let days = last_n_days(&db, 7, day(2024, 5, 6)).unwrap();

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, day(2024, 4, 30));
        assert_eq!(days[6].date, day(2024, 5, 6));
        for pair in days.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        assert_eq!(
            days.iter().map(|d| d.seconds).collect::<Vec<_>>(),
            vec![0, 0, 60, 0, 0, 0, 120]
        );
    }

    #[test]
    fn last_n_days_on_empty_log() {
        let db = test::setup_db();

        let week = last_n_days(&db, 7, day(2024, 5, 6)).unwrap();
        assert_eq!(week.len(), 7);
        assert!(week.iter().all(|d| d.seconds == 0));

        assert_eq!(last_n_days(&db, 30, day(2024, 5, 6)).unwrap().len(), 30);
        assert!(last_n_days(&db, 0, day(2024, 5, 6)).unwrap().is_empty());
    }

    #[test]
    fn weekly_average_over_trailing_days() {
        let mut db = test::setup_db();
        // 14 days back, just outside a two week window
        test::session(&mut db, "Reading", (2024, 4, 22), (9, 0, 0), 9999);
        test::session(&mut db, "Reading", (2024, 4, 30), (9, 0, 0), 700);
        test::session(&mut db, "Reading", (2024, 5, 6), (9, 0, 0), 700);

        let avg1 = weekly_average(&db, 1, day(2024, 5, 6)).unwrap();
        assert!((avg1 - 200.).abs() < 1e-9);

        let avg2 = weekly_average(&db, 2, day(2024, 5, 6)).unwrap();
        assert!((avg2 - 100.).abs() < 1e-9);

        assert!(matches!(
            weekly_average(&db, 0, day(2024, 5, 6)),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn oversized_windows_rejected() {
        let db = test::setup_db();
        let today = day(2024, 5, 6);

        assert!(matches!(
            last_n_days(&db, 200_000_000, today),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            weekly_average(&db, u32::MAX, today),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            window_start(MAX_WINDOW_DAYS, NaiveDate::MIN),
            Err(Error::Validation { .. })
        ));

        assert_eq!(window_start(7, today).unwrap(), day(2024, 4, 30));
        assert_eq!(window_start(0, today).unwrap(), today);
        assert_eq!(last_n_days(&db, MAX_WINDOW_DAYS, today).unwrap().len(), MAX_WINDOW_DAYS as usize);
    }

    #[test]
    fn populated_summaries_add_up() {
        let mut db = test::setup_db();
        test::populate_db_w_data(&mut db);
        let all_time = 3 * POPULATED_SECS_PER_ACTIVITY;

        let daily = daily_summary(&db).unwrap();
        // 2023-12-12 .. 2024-03-04
        assert_eq!(daily.len(), 20 + 31 + 29 + 4);
        assert_eq!(daily.iter().map(|d| d.seconds).sum::<i64>(), all_time);

        let weekly = weekly_summary(&db).unwrap();
        assert_eq!(weekly.iter().map(|w| w.seconds).sum::<i64>(), all_time);
        assert!(weekly.iter().all(|w| w.week_start.weekday() == Weekday::Mon));
        assert_eq!(weekly[0].week_start, day(2023, 12, 11));

        let monthly = monthly_summary(&db).unwrap();
        assert_eq!(monthly.len(), 4);
        assert_eq!(monthly.iter().map(|m| m.seconds).sum::<i64>(), all_time);
        // February 2024: 29 days * 3 activities * 90 minutes
        assert_eq!(monthly[2].name, "Feb");
        assert_eq!(monthly[2].seconds, 29 * 3 * 90 * 60);
    }

    #[test]
    fn populated_category_totals() {
        let mut db = test::setup_db();
        test::populate_db_w_data(&mut db);

        let cats = category_totals(&db, day(2023, 1, 1), day(2024, 12, 31)).unwrap();

        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category, "Study");
        assert_eq!(cats[0].seconds, 2 * POPULATED_SECS_PER_ACTIVITY);
        assert_eq!(cats[1].category, "Work");
        assert_eq!(cats[1].seconds, POPULATED_SECS_PER_ACTIVITY);

        // January only: 31 days * 60 minutes for Coding
        let jan = category_totals(&db, day(2024, 1, 1), day(2024, 1, 31)).unwrap();
        assert_eq!(jan[1].seconds, 31 * 60 * 60);
    }

    #[test]
    fn populated_weekday_profile() {
        let mut db = test::setup_db();
        test::populate_db_w_data(&mut db);

        // the week of 2024-02-05 to 2024-02-11, 90 minutes * 3 every day
        let p = weekday_profile(&db, 7, day(2024, 2, 11)).unwrap();

        assert_eq!(p.len(), 7);
        assert_eq!(p[0].weekday, Weekday::Mon);
        assert!(p.iter().all(|x| x.min == 3 * 90 * 60 && x.max == 3 * 90 * 60));
    }

    #[test]
    fn first_entry_and_relevant_days() {
        let mut db = test::setup_db();
        assert_eq!(first_entry_date(&db).unwrap(), None);
        assert_eq!(relevant_days(&db, day(2024, 5, 6), 7).unwrap(), 0);

        test::session(&mut db, "Reading", (2024, 5, 4), (9, 0, 0), 60);

        assert_eq!(first_entry_date(&db).unwrap(), Some(day(2024, 5, 4)));
        assert_eq!(relevant_days(&db, day(2024, 5, 6), 7).unwrap(), 3);
        assert_eq!(relevant_days(&db, day(2024, 6, 6), 7).unwrap(), 7);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut db = test::setup_db();
        test::populate_db_w_data(&mut db);
        let today = day(2024, 3, 4);

        let a = last_n_days(&db, 30, today).unwrap();
        let b = last_n_days(&db, 30, today).unwrap();
        assert_eq!(a, b);
    }
}
