//! Batch entry point for Tracks core jobs.
//!
//! # Usage
//! - `tracks_cli --version` prints the core version.
//! - `tracks_cli <db_path>` activates ready deferred todos for every account.
//!
//! Set `TRACKS_LOG_DIR` to an absolute path to write rolling logs.

use log::info;
use std::error::Error;
use std::process::ExitCode;
use tracks_core::db::open_db;
use tracks_core::{
    default_log_level, init_logging, AccountRepository, DeferredActivationScheduler,
    SqliteAccountRepository, SqliteTodoRepository, SystemClock,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag] if flag == "--version" => {
            println!("tracks_core version={}", tracks_core::core_version());
            ExitCode::SUCCESS
        }
        [db_path] => match activate_deferred(db_path) {
            Ok(0) => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(2),
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: tracks_cli <db_path> | --version");
            ExitCode::from(64)
        }
    }
}

/// Returns the number of todos that failed to activate.
fn activate_deferred(db_path: &str) -> Result<usize, Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("TRACKS_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }

    let conn = open_db(db_path)?;
    let accounts = SqliteAccountRepository::try_new(&conn)?.list_accounts()?;
    let scheduler = DeferredActivationScheduler::new(SqliteTodoRepository::try_new(&conn)?);

    let mut activated = 0;
    let mut failed = 0;
    for account in &accounts {
        let report = scheduler.activate_ready_now(account, &SystemClock)?;
        activated += report.activated.len();
        failed += report.failed.len();
    }

    info!(
        "event=batch_activate module=cli status=ok accounts={} activated={activated} failed={failed}",
        accounts.len()
    );
    println!("accounts={} activated={activated} failed={failed}", accounts.len());
    Ok(failed)
}
