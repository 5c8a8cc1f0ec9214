use std::io::{self, Write};

use chrono::NaiveDate;
use log::{debug, info, warn};
use rusqlite::Connection;
use serde::Serialize;

pub mod chart;
pub mod clock;
pub mod db;
pub mod error;
pub mod tracker;
#[cfg(test)]
mod test;

pub use error::{Error, Result};

use clock::{fmt_clock, to_clock};
use db::goal::{self, DailyGoal};
use db::stat::{self, CategoryTotal, Countdown, DayTotal};
use db::{events, helpers, setup, Session};
use tracker::Toggle;

/// menu handlers fail only on storage/io trouble; user mistakes are printed
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// state threaded through the menus instead of module level globals
pub struct App
{
    pub db       : Connection,
    pub goal     : DailyGoal,
    /// activity tracked last, preselected next time
    pub selected : Option<String>,
}

impl App
{
    pub fn new(db : Connection) -> Result<App>
    {
        let goal = goal::goal(&db)?;
        Ok(App { db, goal, selected : None })
    }
}

/// validation, reference and state errors are shown and the menu carries on;
/// storage errors go up to main as a visible failure
fn report<T>(res : Result<T>) -> AppResult<Option<T>>
{
    match res
    {
        Ok(v) => Ok(Some(v)),
        Err(e @ (Error::Storage(_) | Error::Integrity { .. })) => Err(e.into()),
        Err(e) =>
        {
            println!("  ! {}", e);
            Ok(None)
        }
    }
}

/// print `msg`, return the trimmed input line; end of input reads as "q"
pub fn prompt(msg : &str) -> io::Result<String>
{
    print!("{}", msg);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0
    {
        return Ok("q".to_string());
    }

    Ok(line.trim().to_string())
}

fn rule()
{
    println!("---------------------------------------------------------------");
}

/// countdown, stopwatch and goal progress on one line;
/// past the goal the countdown shows the overshoot w/ a leading '+'
pub fn timer_line(goal : i64, logged : i64, stopwatch : i64) -> String
{
    let cd = Countdown::new(DailyGoal { seconds : goal }, logged);

    let countdown = if cd.overshoot > 0
    {
        format!("+{}", fmt_clock(cd.overshoot as u64))
    }
    else
    {
        fmt_clock(cd.remaining as u64)
    };

    format!("countdown {:>10}   stopwatch {}   {}",
            countdown,
            fmt_clock(stopwatch.max(0) as u64),
            chart::progress_bar(cd.progress(), 20))
}

pub fn print_acts_get_choice(app : &App) -> AppResult<Option<String>>
{
    let activities = setup::activities(&app.db)?;

    if activities.is_empty()
    {
        println!("No activities are configured, add some in setup");
        return Ok(None);
    }

    rule();
    println!("#\tActivity\tCategory");

    for (index, activity) in activities.iter().enumerate()
    {
        println!("{}\t{}\t{}", index + 1, activity.name, activity.category);
    }

    rule();

    println!("Enter one of the listed numbers");
    if let Some(sel) = &app.selected
    {
        println!("  Enter alone for {}", sel);
    }
    println!("  'q' to go back to main");
    println!();

    loop
    {
        let input = prompt("Your input: ")?;

        if input == "q" { return Ok(None); }

        if input.is_empty()
        {
            if let Some(sel) = &app.selected
            {
                if activities.iter().any(|a| &a.name == sel)
                {
                    return Ok(Some(sel.clone()));
                }
            }
            continue;
        }

        // parse to index, break if valid
        if let Ok(n) = input.parse::<usize>()
        {
            if let Some(activity) = n.checked_sub(1).and_then(|i| activities.get(i))
            {
                return Ok(Some(activity.name.clone()));
            }
        }
    }
}

/// running loop when tracker is tracking an activity;
/// every start/pause is written to the log right away
pub fn track(app : &mut App) -> AppResult<()>
{
    let Some(activity) = print_acts_get_choice(app)? else { return Ok(()) };
    app.selected = Some(activity.clone());

    let goal = app.goal.seconds;
    let today = helpers::today();
    // completed sessions of today, before this run
    let mut logged = stat::remaining_today(&app.db, app.goal, today)?.logged;
    let mut stopwatch : i64 = 0;

    println!("Daily goal: {}, logged today: {}",
             fmt_clock(goal.max(0) as u64), fmt_clock(logged.max(0) as u64));
    println!("Press Enter to switch between running/paused");
    println!("Press q-Enter to end");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop
    {
        // a session kept open at launch is picked up here and closed below
        let Some((start, resumed)) = report(events::start_or_resume(&mut app.db, &activity))?
            else { break };

        let offset = resumed_offset(&start, resumed, helpers::now());
        if resumed
        {
            println!("Resuming {}, running since {}", activity, start.timestamp);
        }
        else
        {
            println!("Started {} at {}", activity, start.timestamp.format("%H:%M:%S"));
        }

        let (base_logged, base_sw) = (logged + offset, stopwatch + offset);
        let looped = tracker::workloop(&mut input, move |elapsed| {
            let secs = elapsed.as_secs() as i64;
            print!("  {}\r", timer_line(goal, base_logged + secs, base_sw + secs));
            if let Err(e) = io::stdout().flush()
            {
                debug!("timer display flush failed: {e}");
            }
        });

        // close the session even if reading input failed
        let pause = report(events::pause_now(&mut app.db, &activity))?;
        let (toggle, _) = looped?;
        let Some(pause) = pause else { break };

        let secs = (pause.timestamp - start.timestamp).num_seconds();
        let before = logged;
        logged += secs;
        stopwatch += secs;

        println!();
        println!("Paused. Session: {}, today: {}",
                 fmt_clock(secs.max(0) as u64), fmt_clock(logged.max(0) as u64));

        if before < goal && logged >= goal
        {
            info!("daily goal reached");
            println!("You reached your goal of {} of productive time!",
                     fmt_clock(goal.max(0) as u64));
        }

        if toggle == Toggle::Quit { break; }

        println!("Enter to resume, q-Enter to end");
        if tracker::wait_for_toggle(&mut input)? == Toggle::Quit { break; }
    }

    let cd = Countdown::new(app.goal, logged);

    println!();
    println!("Tracked this run:\t{}", fmt_clock(stopwatch.max(0) as u64));
    println!("Logged today:\t\t{}", fmt_clock(cd.logged.max(0) as u64));
    println!("Remaining today:\t{}", fmt_clock(cd.remaining as u64));
    if cd.overshoot > 0
    {
        println!("Overshoot:\t\t{}", fmt_clock(cd.overshoot as u64));
    }

    Ok(())
}

/// seconds an open session had already run when it was resumed
fn resumed_offset(start : &db::LogEvent, resumed : bool, now : chrono::NaiveDateTime) -> i64
{
    if !resumed { return 0; }
    (now - start.timestamp).num_seconds().max(0)
}

fn day_rows(days : &[DayTotal]) -> Vec<(String, i64)>
{
    days.iter()
        .map(|d| (format!("{} {}", d.weekday, d.date), d.seconds))
        .collect()
}

/// graphs tab; bar charts of recent days, categories and weekdays
pub fn graphs(app : &mut App) -> AppResult<()>
{
    loop
    {
        println!();
        println!("Graphs: ");
        println!();
        println!("  (7) last 7 days");
        println!("  (30) last 30 days");
        println!("  (c)ategories, last 30 days");
        println!("  (w)eekdays, last year");
        println!("  (q)uit (back to main menu)");
        println!();

        let opt = prompt("Your option: ")?;
        let today = helpers::today();

        match opt.as_str()
        {
            "7" | "30" =>
            {
                let n : u32 = if opt == "7" { 7 } else { 30 };
                let days = stat::last_n_days(&app.db, n, today)?;
                let avg = stat::weekly_average(&app.db, (n + 6) / 7, today)?;
                let cd = stat::remaining_today(&app.db, app.goal, today)?;

                rule();
                print!("{}", chart::bar_chart(&day_rows(&days), chart::BAR_WIDTH));
                rule();
                println!("avg/day over the last {} weeks: {}",
                         (n + 6) / 7, fmt_clock(avg.round() as u64));
                println!("today: {} of {} {}",
                         fmt_clock(cd.logged as u64), fmt_clock(cd.goal as u64),
                         chart::progress_bar(cd.progress(), 20));
            }
            "c" =>
            {
                let from = stat::window_start(30, today)?;
                let cats = stat::category_totals(&app.db, from, today)?;

                if cats.is_empty()
                {
                    println!("Nothing logged in the last 30 days");
                    continue;
                }

                let rows : Vec<(String, i64)> = cats.into_iter()
                    .map(|c| (c.category, c.seconds))
                    .collect();

                rule();
                print!("{}", chart::bar_chart(&rows, chart::BAR_WIDTH));
                rule();
            }
            "w" =>
            {
                // days before the first entry would only add zeros
                let window = stat::relevant_days(&app.db, today, 365)?;
                let profile = stat::weekday_profile(&app.db, window, today)?;

                if profile.is_empty()
                {
                    println!("No entries yet");
                    continue;
                }

                rule();
                println!("Day\tdays\tmin\t\tmean\t\tmax");
                for p in &profile
                {
                    println!("{}\t{}\t{}\t{}\t{}",
                             p.weekday, p.days,
                             fmt_clock(p.min as u64),
                             fmt_clock(p.mean.round() as u64),
                             fmt_clock(p.max as u64));
                }
                rule();

                let rows : Vec<(String, i64)> = profile.iter()
                    .map(|p| (p.weekday.to_string(), p.mean.round() as i64))
                    .collect();
                print!("{}", chart::bar_chart(&rows, chart::BAR_WIDTH));
                rule();
            }
            "q" => break,
            _ => (),
        }
    }

    Ok(())
}

/// log tab; totals per day, week or month over the whole history
pub fn log_tab(app : &mut App) -> AppResult<()>
{
    loop
    {
        println!();
        println!("Log: ");
        println!();
        println!("  (d)aily");
        println!("  (w)eekly");
        println!("  (m)onthly");
        println!("  (q)uit (back to main menu)");
        println!();

        let opt = prompt("Your option: ")?;

        match opt.as_str()
        {
            "d" =>
            {
                rule();
                println!("Date\t\tDay\tTotal");
                for d in stat::daily_summary(&app.db)?
                {
                    println!("{}\t{}\t{}", d.date, d.weekday, fmt_clock(d.seconds as u64));
                }
                rule();
            }
            "w" =>
            {
                rule();
                println!("Week of\t\tWk\tTotal");
                for w in stat::weekly_summary(&app.db)?
                {
                    println!("{}\t{:02}\t{}",
                             w.week_start, w.isoweek, fmt_clock(w.seconds as u64));
                }
                rule();
            }
            "m" =>
            {
                rule();
                println!("Month\t\tTotal\t\tavg/day");
                for m in stat::monthly_summary(&app.db)?
                {
                    println!("{} {:02} {}\t{}\t{}",
                             m.year, m.month, m.name,
                             fmt_clock(m.seconds as u64),
                             fmt_clock((m.seconds / m.days.max(1) as i64) as u64));
                }
                rule();
            }
            "q" => break,
            _ => (),
        }
    }

    Ok(())
}

fn print_setup(app : &App) -> AppResult<()>
{
    rule();
    println!("Daily goal: {}", to_clock(app.goal.seconds)?);
    println!();

    for cat in setup::categories(&app.db)?
    {
        println!("{} (since {})", cat.name, cat.added);
        for act in setup::activities_in_category(&app.db, &cat.name)?
        {
            println!("    {}", act.name);
        }
    }
    rule();

    Ok(())
}

/// parse `hh:mm:ss` into a valid countdown goal
pub fn parse_goal(input : &str) -> Result<i64>
{
    let secs = clock::from_clock(input)?;
    clock::goal_from_hms(secs / 3600, secs % 3600 / 60, secs % 60)
}

/// configure db; (goal, categories, activities)
pub fn conf(app : &mut App) -> AppResult<()>
{
    loop
    {
        println!();
        println!("Options: ");
        println!();
        println!("  (l)ist current setup");
        println!("  (g)oal, set daily countdown");
        println!("  (c)ategory add, (r)ename, (x) delete");
        println!("  (a)ctivity add, (e)dit, (d)elete");
        println!("  (q)uit (back to main menu)");
        println!();

        let opt = prompt("Your option: ")?;

        match opt.as_str()
        {
            "l" => print_setup(app)?,
            "g" =>
            {
                let input = prompt("Enter daily goal (hh:mm:ss, at most 24h): ")?;
                if let Some(secs) = report(parse_goal(&input))?
                {
                    if let Some(g) = report(goal::set_goal(&mut app.db, secs))?
                    {
                        app.goal = g;
                        println!("Daily goal set to {}", fmt_clock(secs as u64));
                    }
                }
            }
            "c" =>
            {
                let name = prompt("Enter category name: ")?;
                report(setup::add_category(&mut app.db, &name))?;
            }
            "r" =>
            {
                let old = prompt("Category to rename: ")?;
                let new = prompt("New name: ")?;
                report(setup::rename_category(&mut app.db, &old, &new))?;
            }
            "x" =>
            {
                let name = prompt("Category to delete: ")?;
                report(setup::delete_category(&mut app.db, &name))?;
            }
            "a" =>
            {
                let name = prompt("Enter activity name: ")?;
                let cat = prompt("Category of the activity: ")?;
                report(setup::add_activity(&mut app.db, &name, &cat))?;
            }
            "e" =>
            {
                let Some(name) = print_acts_get_choice(app)? else { continue };
                let new = prompt("New name (Enter to keep): ")?;
                let cat = prompt("New category (Enter to keep): ")?;

                let mut current = name;
                if !new.is_empty()
                {
                    if report(setup::rename_activity(&mut app.db, &current, &new))?.is_some()
                    {
                        if app.selected.as_deref() == Some(current.as_str())
                        {
                            app.selected = Some(new.trim().to_string());
                        }
                        current = new.trim().to_string();
                    }
                }
                if !cat.is_empty()
                {
                    report(setup::set_activity_category(&mut app.db, &current, &cat))?;
                }
            }
            "d" =>
            {
                let Some(name) = print_acts_get_choice(app)? else { continue };
                if report(setup::delete_activity(&mut app.db, &name))?.is_some()
                    && app.selected.as_deref() == Some(name.as_str())
                {
                    app.selected = None;
                }
            }
            "q" => break,
            _ => (),
        }
    }

    Ok(())
}

/// flag sessions left open (app closed mid-session) and let the user decide
pub fn check_dangling(app : &mut App) -> AppResult<()>
{
    for s in events::open_sessions(&app.db)?
    {
        warn!("open session of {} since {}", s.activity, s.start);

        rule();
        println!("{} is still running since {}", s.activity, s.start);
        println!("  (k)eep it running, next pause closes it");
        println!("  (c)lose it now, the time in between counts");
        println!("  (d)iscard the time since it started");

        let resolution = loop
        {
            match prompt("Your option: ")?.as_str()
            {
                "k" | "q" => break None,
                "c" => break Some(events::Resolution::CloseNow),
                "d" => break Some(events::Resolution::Discard),
                _ => (),
            }
        };

        if let Some(r) = resolution
        {
            report(events::resolve_dangling(&mut app.db, &s.activity, r))?;
        }
    }

    Ok(())
}

/// everything a chart needs, as plain data
#[derive(Debug, Serialize)]
pub struct Snapshot
{
    pub today          : NaiveDate,
    pub countdown      : Countdown,
    pub days           : Vec<DayTotal>,
    /// mean seconds per day over the last 7 days
    pub avg_last_week  : f64,
    pub categories     : Vec<CategoryTotal>,
    pub open_sessions  : Vec<Session>,
}

/// totals of the `days` days ending `today`, see Snapshot
pub fn snapshot(db : &Connection, days : u32, today : NaiveDate) -> Result<Snapshot>
{
    if days == 0
    {
        return Err(Error::validation("days", "needs at least one day"));
    }

    let goal = goal::goal(db)?;
    let from = stat::window_start(days, today)?;

    Ok(Snapshot {
        today,
        countdown     : stat::remaining_today(db, goal, today)?,
        days          : stat::last_n_days(db, days, today)?,
        avg_last_week : stat::weekly_average(db, 1, today)?,
        categories    : stat::category_totals(db, from, today)?,
        open_sessions : events::open_sessions(db)?,
    })
}

/// end of program routine
pub fn quit() -> !
{
    std::process::exit(0);
}
