pub const SQL_TABLEN_CAT : &str = "tt_categories";
// PRIMARY implies NOT NULL and UNIQUE
pub const SQL_CREATE_CAT : &str =
"CREATE TABLE tt_categories (
    name TEXT PRIMARY KEY NOT NULL,
    added TEXT NOT NULL
    )";

pub const SQL_TABLEN_ACT : &str = "tt_activities";
// CAREFUL: other tables reference activities table BY NAME!
pub const SQL_CREATE_ACT : &str =
"CREATE TABLE tt_activities (
    name TEXT PRIMARY KEY NOT NULL,
    category TEXT NOT NULL,
    added TEXT NOT NULL,
    FOREIGN KEY (category) REFERENCES tt_categories(name)
        ON UPDATE CASCADE ON DELETE RESTRICT
    )";

pub const SQL_TABLEN_LOG : &str = "tt_log";
pub const SQL_CREATE_LOG : &str =
"CREATE TABLE tt_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    activity TEXT NOT NULL,
    event TEXT NOT NULL CHECK (event IN ('START', 'PAUSE')),
    timestamp TEXT NOT NULL,
    FOREIGN KEY (activity) REFERENCES tt_activities(name)
        ON UPDATE CASCADE ON DELETE RESTRICT
    )";

// log rows are append-only; renaming an activity still has to cascade into
// the `activity` column, so only the remaining columns are locked
pub const SQL_TRIGN_LOG_UPD : &str = "tt_log_no_update";
pub const SQL_CREATE_LOG_UPD : &str =
"CREATE TRIGGER tt_log_no_update
    BEFORE UPDATE OF id, event, timestamp ON tt_log
    BEGIN
        SELECT RAISE(ABORT, 'tt_log is append-only');
    END";

pub const SQL_TRIGN_LOG_DEL : &str = "tt_log_no_delete";
pub const SQL_CREATE_LOG_DEL : &str =
"CREATE TRIGGER tt_log_no_delete
    BEFORE DELETE ON tt_log
    BEGIN
        SELECT RAISE(ABORT, 'tt_log is append-only');
    END";

pub const SQL_TABLEN_CFG : &str = "tt_config";
// single row table, id pinned to 1
pub const SQL_CREATE_CFG : &str =
"CREATE TABLE tt_config (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    daily_goal_seconds INTEGER NOT NULL CHECK (daily_goal_seconds >= 0)
    )";

/// (name, creation query) of every table, in creation order
pub const SQL_TABLES : [(&str, &str); 4] = [
    (SQL_TABLEN_CAT, SQL_CREATE_CAT),
    (SQL_TABLEN_ACT, SQL_CREATE_ACT),
    (SQL_TABLEN_LOG, SQL_CREATE_LOG),
    (SQL_TABLEN_CFG, SQL_CREATE_CFG),
];

pub const SQL_TRIGGERS : [(&str, &str); 2] = [
    (SQL_TRIGN_LOG_UPD, SQL_CREATE_LOG_UPD),
    (SQL_TRIGN_LOG_DEL, SQL_CREATE_LOG_DEL),
];
