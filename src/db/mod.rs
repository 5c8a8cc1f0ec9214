//! handles most db specific functionality
//! (initialization, integrity checking, the records shared across modules)
//! categories/activities in setup, the event log in events,
//! stat functionality ousted to submodule stat

pub mod goal;
pub mod helpers;
pub mod events;
pub mod queries;
pub mod setup;
pub mod stat;

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{Error, Result};
use helpers::*;
use queries::*;

/// representing a row from categories table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub added: NaiveDate,
}

/// representing a row from activities table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Start,
    Pause,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Start => "START",
            EventType::Pause => "PAUSE",
        }
    }

    fn parse(idx: usize, s: &str) -> rusqlite::Result<Self> {
        match s {
            "START" => Ok(EventType::Start),
            "PAUSE" => Ok(EventType::Pause),
            other => Err(rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("unknown event type {other}").into(),
            )),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// representing a row from log table; never updated once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub id: i64,
    pub activity: String,
    pub event: EventType,
    pub timestamp: NaiveDateTime,
}

/// a START/PAUSE pair reconstructed from the log;
/// `end` is None while the session is still open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub activity: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl Session {
    /// seconds between START and PAUSE, None for an open session
    pub fn duration(&self) -> Option<i64> {
        self.end.map(|end| (end - self.start).num_seconds())
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

/// open (or create) the db file at `path`, initialize it if new, then check it
pub fn open(path: &Path) -> Result<Connection> {
    let mut db = Connection::open(path)?;
    prepare(&mut db)?;
    Ok(db)
}

/// same as open(), for throwaway dbs
pub fn open_in_memory() -> Result<Connection> {
    let mut db = Connection::open_in_memory()?;
    prepare(&mut db)?;
    Ok(db)
}

fn prepare(db: &mut Connection) -> Result<()> {
    // sqlite leaves foreign key enforcement off unless asked, per connection
    db.pragma_update(None, "foreign_keys", true)?;

    if !is_initialized(db)? {
        info!("initializing db w/ needed tables");
        init(db)?;
    }

    check(db)
}

/// whether the config table (created last) exists
pub fn is_initialized(db: &Connection) -> Result<bool> {
    let found: Option<String> = db
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
            params![SQL_TABLEN_CFG],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}

/// create all tables and triggers and seed the daily goal, all or nothing
pub fn init(db: &mut Connection) -> Result<()> {
    let tx = db.transaction()?;

    for (name, query) in SQL_TABLES.iter().chain(SQL_TRIGGERS.iter()) {
        debug!("creating {name}");
        tx.execute(query, ())?;
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (id, daily_goal_seconds) VALUES (1, ?1)",
            SQL_TABLEN_CFG
        ),
        params![goal::DEFAULT_GOAL_SECONDS],
    )?;

    tx.commit()?;
    Ok(())
}

/// check existing db for integrity, conforming to expected layout
pub fn check(db: &Connection) -> Result<()> {
    // compare creation schema versus one from sqlite_master

    let mut stmt = db.prepare("SELECT sql FROM sqlite_master WHERE type=?1 AND name=?2")?;

    let expected = SQL_TABLES
        .iter()
        .map(|t| ("table", t))
        .chain(SQL_TRIGGERS.iter().map(|t| ("trigger", t)));

    for (kind, (name, query)) in expected {
        let schema: Option<String> = stmt
            .query_row(params![kind, name], |row| row.get(0))
            .optional()?;

        let matches = schema
            .map(|s| clean(s) == clean(query.to_string()))
            .unwrap_or(false);

        if !matches {
            warn!("{kind} {name} failed integrity check");
            return Err(Error::Integrity { table: *name });
        }
    }

    debug!("integrity check passed");
    Ok(())
}
