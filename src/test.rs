// module with logic shared across the crate's tests;
// every test works on its own in memory db, this module
//  a) is the place for shared test logic
//  b) makes sure tests operate on the same db layout and reference data

/*
 * WARNING; BE AWARE
 * integral changes here could lead to all tests failing
 * tests assume the categories/activities and data below to be here as is
 */

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db;

pub fn day(y : i32, m : u32, d : u32) -> NaiveDate
{
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(ymd : (i32, u32, u32), hms : (u32, u32, u32)) -> NaiveDateTime
{
    day(ymd.0, ymd.1, ymd.2).and_hms_opt(hms.0, hms.1, hms.2).unwrap()
}

/// tables only, no reference data; for tests tampering w/ the schema
pub fn initialize_db(conn : &mut Connection) -> ()
{
    conn.pragma_update(None, "foreign_keys", true).unwrap();
    db::init(conn).unwrap_or_else(|e| {
        panic!("Can't create tables on in memory test db: {e}")
    });
}

/// in memory db w/ two categories and three activities:
///   Study: Reading, Writing
///   Work:  Coding
pub fn setup_db() -> Connection
{
    let mut conn = db::open_in_memory().unwrap();

    db::setup::add_category(&mut conn, "Study").unwrap();
    db::setup::add_category(&mut conn, "Work").unwrap();

    db::setup::add_activity(&mut conn, "Reading", "Study").unwrap();
    db::setup::add_activity(&mut conn, "Writing", "Study").unwrap();
    db::setup::add_activity(&mut conn, "Coding", "Work").unwrap();

    conn
}

/// log one completed session of `seconds` starting at the given time
pub fn session(
    conn     : &mut Connection,
    activity : &str,
    ymd      : (i32, u32, u32),
    hms      : (u32, u32, u32),
    seconds  : i64,
    ) -> ()
{
    let beg = at(ymd, hms);
    let end = beg + Duration::seconds(seconds);

    db::events::start_at(conn, activity, beg).unwrap();
    db::events::pause_at(conn, activity, end).unwrap();
}

/// minutes logged per activity per day in the given month of the test data
pub fn minutes_for_month(month : u32) -> i64
{
    match month
    {
        12 => 30,
        1  => 60,
        2  => 90,
        3  => 120,
        _  => 0,
    }
}

// populates database with test data; tests assume this expected data to test
// their internal correctness; take that into account before changing anything
pub fn populate_db_w_data(conn : &mut Connection) -> ()
{
    // we start entries 2023-12-12, 08:00
    // every day Reading, Writing, Coding follow each other, same duration
    // per activity per day: Dec 30, Jan 60, Feb 90, Mar 120 minutes
    // we stop entries 2024-03-05 (2024-03-04 last day w/ entry), because
    // a) 2024 is a leap year, we can observe February working correctly
    // b) no DST change falls into this time frame for most regions

    let mut date = day(2023, 12, 12);
    let last = day(2024, 3, 4);

    while date <= last
    {
        let secs = minutes_for_month(date.month()) * 60;
        let mut beg = date.and_hms_opt(8, 0, 0).unwrap();

        for activity in ["Reading", "Writing", "Coding"]
        {
            let end = beg + Duration::seconds(secs);
            db::events::start_at(conn, activity, beg).unwrap();
            db::events::pause_at(conn, activity, end).unwrap();
            beg = end;
        }

        date += Duration::days(1);
    }
}

/// total seconds per activity over all of populate_db_w_data
// 2023-12: 20 * 30 =  600
// 2024-01: 31 * 60 = 1860
// 2024-02: 29 * 90 = 2610
// 2024-03: 04 *120 =  480
pub const POPULATED_SECS_PER_ACTIVITY : i64 = 5550 * 60;
