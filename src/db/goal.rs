//! the daily countdown goal, a single row in the config table

use log::info;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::queries::SQL_TABLEN_CFG;
use crate::error::{Error, Result};

/// eight hours of productive time
pub const DEFAULT_GOAL_SECONDS: i64 = 8 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyGoal {
    pub seconds: i64,
}

impl Default for DailyGoal {
    fn default() -> Self {
        DailyGoal { seconds: DEFAULT_GOAL_SECONDS }
    }
}

pub fn goal(db: &Connection) -> Result<DailyGoal> {
    let seconds: i64 = db.query_row(
        &format!("SELECT daily_goal_seconds FROM {} WHERE id = 1", SQL_TABLEN_CFG),
        (),
        |row| row.get(0),
    )?;

    Ok(DailyGoal { seconds })
}

pub fn set_goal(db: &mut Connection, seconds: i64) -> Result<DailyGoal> {
    if seconds < 0 {
        return Err(Error::validation("daily goal", format!("{seconds} is negative")));
    }

    db.execute(
        &format!(
            "INSERT INTO {} (id, daily_goal_seconds) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET daily_goal_seconds = excluded.daily_goal_seconds",
            SQL_TABLEN_CFG
        ),
        params![seconds],
    )?;

    info!("daily goal set to {seconds}s");
    Ok(DailyGoal { seconds })
}
