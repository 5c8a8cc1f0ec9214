//! the append-only START/PAUSE event log and session reconstruction
//!
//! policy: per activity, events alternate START, PAUSE, START, ...
//! a START while a session is open and a PAUSE without one are both
//! rejected with Error::State; the log is left untouched in either case

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use super::helpers::{fmt_date, fmt_ts, now, parse_ts};
use super::queries::SQL_TABLEN_LOG;
use super::setup::require_activity;
use super::{EventType, LogEvent, Session};
use crate::error::{Error, Result};

/// what to do with a session left open (app closed mid-session)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// pause it now; the time in between counts
    CloseNow,
    /// pause it at its own START timestamp; zero-length, the time is dropped
    Discard,
}

/// most recent event of an activity, if any
fn last_event(db: &Connection, activity: &str) -> Result<Option<LogEvent>> {
    let event = db
        .query_row(
            &format!(
                "SELECT id, activity, event, timestamp FROM {}
                 WHERE activity = ?1 ORDER BY id DESC LIMIT 1",
                SQL_TABLEN_LOG
            ),
            params![activity],
            row_to_event,
        )
        .optional()?;

    Ok(event)
}

pub(crate) fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<LogEvent> {
    let event: String = row.get(2)?;
    let timestamp: String = row.get(3)?;

    Ok(LogEvent {
        id: row.get(0)?,
        activity: row.get(1)?,
        event: EventType::parse(2, &event)?,
        timestamp: parse_ts(3, &timestamp)?,
    })
}

/// the open START of an activity, if its session is running
pub fn open_start(db: &Connection, activity: &str) -> Result<Option<LogEvent>> {
    Ok(last_event(db, activity)?.filter(|e| e.event == EventType::Start))
}

fn append(
    db: &mut Connection,
    activity: &str,
    event: EventType,
    timestamp: NaiveDateTime,
) -> Result<LogEvent> {
    let tx = db.transaction()?;

    require_activity(&tx, activity)?;

    let last = last_event(&tx, activity)?;
    let open = last.as_ref().filter(|e| e.event == EventType::Start);

    match (event, open) {
        (EventType::Start, Some(start)) => {
            warn!("start rejected, {activity} running since {}", start.timestamp);
            return Err(Error::State(format!(
                "'{activity}' is already running since {}",
                fmt_ts(&start.timestamp)
            )));
        }
        (EventType::Pause, None) => {
            warn!("pause rejected, {activity} is not running");
            return Err(Error::State(format!("'{activity}' is not running")));
        }
        (EventType::Pause, Some(start)) if timestamp < start.timestamp => {
            return Err(Error::validation(
                "pause",
                format!(
                    "{} lies before the session start {}",
                    fmt_ts(&timestamp),
                    fmt_ts(&start.timestamp)
                ),
            ));
        }
        _ => (),
    }

    // the log of an activity never runs backwards in time
    if let Some(last) = &last {
        if timestamp < last.timestamp {
            warn!("{event} rejected, {activity} has a later event #{}", last.id);
            return Err(Error::validation(
                "timestamp",
                format!(
                    "{} lies before the last {} of '{activity}' at {}",
                    fmt_ts(&timestamp),
                    last.event,
                    fmt_ts(&last.timestamp)
                ),
            ));
        }
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (activity, event, timestamp) VALUES (?1, ?2, ?3)",
            SQL_TABLEN_LOG
        ),
        params![activity, event.as_str(), fmt_ts(&timestamp)],
    )?;

    let id = tx.last_insert_rowid();
    tx.commit()?;

    debug!("logged {event} #{id} for {activity} at {timestamp}");

    Ok(LogEvent {
        id,
        activity: activity.to_string(),
        event,
        timestamp,
    })
}

/// log a START for `activity` at the current time
pub fn start(db: &mut Connection, activity: &str) -> Result<LogEvent> {
    start_at(db, activity, now())
}

pub fn start_at(db: &mut Connection, activity: &str, at: NaiveDateTime) -> Result<LogEvent> {
    append(db, activity, EventType::Start, at)
}

/// log a PAUSE for `activity` at the current time, closing its open session
pub fn pause(db: &mut Connection, activity: &str) -> Result<LogEvent> {
    pause_at(db, activity, now())
}

pub fn pause_at(db: &mut Connection, activity: &str, at: NaiveDateTime) -> Result<LogEvent> {
    append(db, activity, EventType::Pause, at)
}

/// pair up an ordered event stream into sessions
///
/// a PAUSE that doesn't follow a START is skipped, a START following a
/// START closes nothing and the earlier one is dropped; neither can be
/// written through this module but a hand edited db might contain them
pub fn pair_events(events: &[LogEvent]) -> Vec<Session> {
    let mut sessions = Vec::new();
    let mut open: Option<&LogEvent> = None;

    for ev in events {
        match (ev.event, open) {
            (EventType::Start, prev) => {
                if let Some(prev) = prev {
                    warn!("dropping unpaired START #{} of {}", prev.id, prev.activity);
                }
                open = Some(ev);
            }
            (EventType::Pause, Some(start)) => {
                sessions.push(Session {
                    activity: start.activity.clone(),
                    start: start.timestamp,
                    end: Some(ev.timestamp),
                });
                open = None;
            }
            (EventType::Pause, None) => {
                warn!("ignoring PAUSE #{} of {} w/o START", ev.id, ev.activity);
            }
        }
    }

    if let Some(start) = open {
        sessions.push(Session {
            activity: start.activity.clone(),
            start: start.timestamp,
            end: None,
        });
    }

    sessions
}

/// sessions of `activity` that started on a day in [from, to], oldest first;
/// a still running session is included with `end: None`
pub fn sessions(
    db: &Connection,
    activity: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Session>> {
    if from > to {
        return Err(Error::validation(
            "date range",
            format!("{from} lies after {to}"),
        ));
    }

    require_activity(db, activity)?;

    // a leading PAUSE belongs to a START before `from` and is skipped in
    // pair_events; events after `to` are needed to close the last session
    let mut stmt = db.prepare(&format!(
        "SELECT id, activity, event, timestamp FROM {}
         WHERE activity = ?1 AND date(timestamp) >= ?2
         ORDER BY id ASC",
        SQL_TABLEN_LOG
    ))?;

    let rows = stmt.query_map(params![activity, fmt_date(&from)], row_to_event)?;

    let mut events = Vec::new();
    for ev in rows {
        events.push(ev?);
    }

    let mut sessions = pair_events(&events);
    sessions.retain(|s| s.date() <= to);
    sessions.sort_by(|a, b| a.start.cmp(&b.start));

    Ok(sessions)
}

/// every session currently open, across all activities
pub fn open_sessions(db: &Connection) -> Result<Vec<Session>> {
    // last event per activity is a START
    let mut stmt = db.prepare(&format!(
        "SELECT l.id, l.activity, l.event, l.timestamp FROM {0} l
         WHERE l.id = (SELECT MAX(id) FROM {0} WHERE activity = l.activity)
           AND l.event = 'START'
         ORDER BY l.timestamp ASC",
        SQL_TABLEN_LOG
    ))?;

    let rows = stmt.query_map([], row_to_event)?;

    let mut open = Vec::new();
    for ev in rows {
        let ev = ev?;
        open.push(Session {
            activity: ev.activity,
            start: ev.timestamp,
            end: None,
        });
    }

    Ok(open)
}

/// the open START of `activity`, or a new START now when it isn't running;
/// the flag is true when an already open session was picked up
pub fn start_or_resume(db: &mut Connection, activity: &str) -> Result<(LogEvent, bool)> {
    require_activity(db, activity)?;

    match last_event(db, activity)? {
        Some(open) if open.event == EventType::Start => {
            info!("resuming {activity}, open since {}", open.timestamp);
            Ok((open, true))
        }
        // a wall clock that stepped back starts at the last PAUSE instead
        Some(last) => Ok((start_at(db, activity, now().max(last.timestamp))?, false)),
        None => Ok((start(db, activity)?, false)),
    }
}

/// pause the running session of `activity` now; if the wall clock stepped
/// back since its START the session is closed at zero length
pub fn pause_now(db: &mut Connection, activity: &str) -> Result<LogEvent> {
    let start = open_start(db, activity)?
        .ok_or_else(|| Error::State(format!("'{activity}' is not running")))?;

    pause_at(db, activity, now().max(start.timestamp))
}

/// close a session left open, e.g. by quitting mid-session
pub fn resolve_dangling(
    db: &mut Connection,
    activity: &str,
    resolution: Resolution,
) -> Result<LogEvent> {
    info!("resolving open session of {activity} via {resolution:?}");

    match resolution {
        Resolution::CloseNow => pause_now(db, activity),
        Resolution::Discard => {
            let start = open_start(db, activity)?
                .ok_or_else(|| Error::State(format!("'{activity}' is not running")))?;
            pause_at(db, activity, start.timestamp)
        }
    }
}

/// number of rows in the log
pub fn event_count(db: &Connection) -> Result<i64> {
    let count = db.query_row(
        &format!("SELECT COUNT(*) FROM {}", SQL_TABLEN_LOG),
        (),
        |row| row.get(0),
    )?;

    Ok(count)
}
