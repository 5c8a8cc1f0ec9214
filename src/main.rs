use std::error;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dailytimer::db;
use dailytimer::db::helpers;
use dailytimer::db::stat::MAX_WINDOW_DAYS;
use dailytimer::App;
use directories::ProjectDirs;
use log::{info, LevelFilter};

const DB_NAME: &str = "dailytimer.db";

#[derive(Parser, Debug)]
#[command(name = "dailytimer", version, long_about = None)]
#[command(about = "Countdown toward a daily goal plus a stopwatch logging activities")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, help = "Database file. By default dailytimer.db in the OS config folder")]
    db: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v info, -vv debug)")]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print countdown and recent totals as JSON")]
    Export {
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)),
            help = "Number of days ending today"
        )]
        days: u32,
    },
}

fn enable_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// retrieve OS specific configuration folder (eg `~/.config` for unix)
fn default_db_path() -> Result<PathBuf, Box<dyn error::Error>> {
    let projdir = ProjectDirs::from("dev", "sintheta", "dailytimer")
        .ok_or("Could not retrieve OS specific configuration folder!")?;

    Ok(projdir.config_dir().join(DB_NAME))
}

fn main() -> Result<(), Box<dyn error::Error>> {
    let args = Args::parse();
    enable_logging(args.verbose);

    let dbpath = match args.db {
        Some(p) => p,
        None => default_db_path()?,
    };

    if let Some(dir) = dbpath.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            info!("folder doesn't exist, creating: {:?}", dir);
            fs::create_dir_all(dir)?;
        }
    }

    // creates, initializes and checks the db as needed
    let db = db::open(&dbpath)?;

    if let Some(Command::Export { days }) = args.command {
        let snap = dailytimer::snapshot(&db, days, helpers::today())?;
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    println!();
    println!("Daily timer");
    println!("Version : {}", env!("CARGO_PKG_VERSION"));
    println!("Database used: {:?}", dbpath);

    let mut app = App::new(db)?;
    dailytimer::check_dangling(&mut app)?;

    loop {
        println!();
        println!("-----------------");
        println!("--- Main Menu --- ");
        println!("-----------------");
        println!("Available options");
        println!();
        println!("  1) track");
        println!("  2) graphs");
        println!("  3) log");
        println!();
        println!("  4) setup (goal, categories, activities)");
        println!("  5) exit");
        println!();
        print!("Your option: ");
        io::stdout().flush()?;

        let mut option = String::new();
        if io::stdin().read_line(&mut option)? == 0 {
            dailytimer::quit();
        }

        println!();

        match option.trim() {
            "1" => dailytimer::track(&mut app)?,
            "2" => dailytimer::graphs(&mut app)?,
            "3" => dailytimer::log_tab(&mut app)?,
            "4" => dailytimer::conf(&mut app)?,
            "5" | "q" => dailytimer::quit(),
            _ => (),
        }
    }
}
