//! categories and activities; reference data edited from the setup menu
//!
//! deletion policy: a category can't be deleted while an activity uses it,
//! an activity can't be deleted once it has log events (the log is
//! append-only, so there is nothing to cascade into); renames cascade

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use super::helpers::{fmt_date, today, DATE_FORMAT};
use super::queries::*;
use super::{Activity, Category};
use crate::error::{is_fk_violation, is_unique_violation, Error, Result};

/// longest name accepted for categories and activities
pub const MAX_NAME_LEN: usize = 64;

/// trimmed, non-empty, bounded name
pub fn validate_name(what: &'static str, name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::validation(what, "name can't be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(
            what,
            format!("name can't exceed {MAX_NAME_LEN} characters"),
        ));
    }

    Ok(name.to_string())
}

pub fn category_exists(db: &Connection, name: &str) -> Result<bool> {
    exists(db, SQL_TABLEN_CAT, name)
}

pub fn activity_exists(db: &Connection, name: &str) -> Result<bool> {
    exists(db, SQL_TABLEN_ACT, name)
}

fn exists(db: &Connection, table: &str, name: &str) -> Result<bool> {
    let found: Option<i64> = db
        .query_row(
            &format!("SELECT 1 FROM {} WHERE name = ?1", table),
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}

pub(crate) fn require_category(db: &Connection, name: &str) -> Result<()> {
    if !category_exists(db, name)? {
        return Err(Error::Reference(format!("no category named '{name}'")));
    }
    Ok(())
}

pub(crate) fn require_activity(db: &Connection, name: &str) -> Result<()> {
    if !activity_exists(db, name)? {
        return Err(Error::Reference(format!("no activity named '{name}'")));
    }
    Ok(())
}

// sqlite's own constraint failures, for whatever slips past the explicit checks
fn map_constraint(e: Error, what: &'static str, name: &str) -> Error {
    match &e {
        Error::Storage(db_err) if is_unique_violation(db_err) => {
            Error::validation(what, format!("'{name}' already exists"))
        }
        Error::Storage(db_err) if is_fk_violation(db_err) => {
            Error::Reference(format!("{what} '{name}' is still referenced"))
        }
        _ => e,
    }
}

/*
 * categories
 */

pub fn categories(db: &Connection) -> Result<Vec<Category>> {
    let mut stmt = db.prepare(&format!(
        "SELECT name, added FROM {} ORDER BY name ASC",
        SQL_TABLEN_CAT
    ))?;

    let rows = stmt.query_map([], |row| {
        let added: String = row.get(1)?;
        Ok(Category {
            name: row.get(0)?,
            added: chrono::NaiveDate::parse_from_str(&added, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        })
    })?;

    let mut categories = Vec::new();
    for cat in rows {
        categories.push(cat?);
    }

    Ok(categories)
}

pub fn add_category(db: &mut Connection, name: &str) -> Result<Category> {
    let name = validate_name("category", name)?;
    let added = today();

    let tx = db.transaction()?;

    if category_exists(&tx, &name)? {
        return Err(Error::validation("category", format!("'{name}' already exists")));
    }

    tx.execute(
        &format!("INSERT INTO {} (name, added) VALUES (?1, ?2)", SQL_TABLEN_CAT),
        params![name, fmt_date(&added)],
    )
    .map_err(|e| map_constraint(e.into(), "category", &name))?;

    tx.commit()?;

    info!("added category {name}");
    Ok(Category { name, added })
}

/// rename a category; its activities follow via ON UPDATE CASCADE
pub fn rename_category(db: &mut Connection, old: &str, new: &str) -> Result<()> {
    let new = validate_name("category", new)?;

    let tx = db.transaction()?;

    require_category(&tx, old)?;
    if old != new && category_exists(&tx, &new)? {
        return Err(Error::validation("category", format!("'{new}' already exists")));
    }

    tx.execute(
        &format!("UPDATE {} SET name = ?1 WHERE name = ?2", SQL_TABLEN_CAT),
        params![new, old],
    )
    .map_err(|e| map_constraint(e.into(), "category", &new))?;

    tx.commit()?;

    info!("renamed category {old} to {new}");
    Ok(())
}

/// delete a category; rejected while any activity still references it
pub fn delete_category(db: &mut Connection, name: &str) -> Result<()> {
    let tx = db.transaction()?;

    require_category(&tx, name)?;

    let users: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE category = ?1", SQL_TABLEN_ACT),
        params![name],
        |row| row.get(0),
    )?;

    if users > 0 {
        warn!("refused to delete category {name}, {users} activities use it");
        return Err(Error::Reference(format!(
            "category '{name}' is still used by {users} activit{}",
            if users == 1 { "y" } else { "ies" }
        )));
    }

    tx.execute(
        &format!("DELETE FROM {} WHERE name = ?1", SQL_TABLEN_CAT),
        params![name],
    )
    .map_err(|e| map_constraint(e.into(), "category", name))?;

    tx.commit()?;

    info!("deleted category {name}");
    Ok(())
}

/*
 * activities
 */

fn query_activities(db: &Connection, category: Option<&str>) -> Result<Vec<Activity>> {
    let mut stmt = db.prepare(&format!(
        "SELECT name, category FROM {}
         WHERE ?1 IS NULL OR category = ?1
         ORDER BY category ASC, name ASC",
        SQL_TABLEN_ACT
    ))?;

    let rows = stmt.query_map(params![category], |row| {
        Ok(Activity {
            name: row.get(0)?,
            category: row.get(1)?,
        })
    })?;

    let mut activities = Vec::new();
    for act in rows {
        activities.push(act?);
    }

    Ok(activities)
}

/// all activities, grouped by category
pub fn activities(db: &Connection) -> Result<Vec<Activity>> {
    query_activities(db, None)
}

pub fn activities_in_category(db: &Connection, category: &str) -> Result<Vec<Activity>> {
    require_category(db, category)?;
    query_activities(db, Some(category))
}

pub fn add_activity(db: &mut Connection, name: &str, category: &str) -> Result<Activity> {
    let name = validate_name("activity", name)?;

    let tx = db.transaction()?;

    require_category(&tx, category)?;
    if activity_exists(&tx, &name)? {
        return Err(Error::validation("activity", format!("'{name}' already exists")));
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (name, category, added) VALUES (?1, ?2, ?3)",
            SQL_TABLEN_ACT
        ),
        params![name, category, fmt_date(&today())],
    )
    .map_err(|e| map_constraint(e.into(), "activity", &name))?;

    tx.commit()?;

    info!("added activity {name} ({category})");
    Ok(Activity {
        name,
        category: category.to_string(),
    })
}

/// rename an activity; its log events follow via ON UPDATE CASCADE
pub fn rename_activity(db: &mut Connection, old: &str, new: &str) -> Result<()> {
    let new = validate_name("activity", new)?;

    let tx = db.transaction()?;

    require_activity(&tx, old)?;
    if old != new && activity_exists(&tx, &new)? {
        return Err(Error::validation("activity", format!("'{new}' already exists")));
    }

    tx.execute(
        &format!("UPDATE {} SET name = ?1 WHERE name = ?2", SQL_TABLEN_ACT),
        params![new, old],
    )
    .map_err(|e| map_constraint(e.into(), "activity", &new))?;

    tx.commit()?;

    info!("renamed activity {old} to {new}");
    Ok(())
}

pub fn set_activity_category(db: &mut Connection, name: &str, category: &str) -> Result<()> {
    let tx = db.transaction()?;

    require_activity(&tx, name)?;
    require_category(&tx, category)?;

    tx.execute(
        &format!("UPDATE {} SET category = ?1 WHERE name = ?2", SQL_TABLEN_ACT),
        params![category, name],
    )
    .map_err(|e| map_constraint(e.into(), "activity", name))?;

    tx.commit()?;

    info!("moved activity {name} to {category}");
    Ok(())
}

/// delete an activity; rejected once it has any log events
pub fn delete_activity(db: &mut Connection, name: &str) -> Result<()> {
    let tx = db.transaction()?;

    require_activity(&tx, name)?;

    let events: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE activity = ?1", SQL_TABLEN_LOG),
        params![name],
        |row| row.get(0),
    )?;

    if events > 0 {
        warn!("refused to delete activity {name}, {events} log events reference it");
        return Err(Error::Reference(format!(
            "activity '{name}' has {events} logged events"
        )));
    }

    tx.execute(
        &format!("DELETE FROM {} WHERE name = ?1", SQL_TABLEN_ACT),
        params![name],
    )
    .map_err(|e| map_constraint(e.into(), "activity", name))?;

    tx.commit()?;

    info!("deleted activity {name}");
    Ok(())
}
