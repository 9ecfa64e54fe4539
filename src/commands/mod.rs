//! Command implementations for joblock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Commands write their report to `out` and return errors
//! for `main` to map onto exit codes.

use crate::cli::{Cli, Command, KeyArgs, LockAction, LockClearArgs, LockCommand};
use joblock::config::Config;
use joblock::error::{JoblockError, Result};
use joblock::events::{Event, EventAction, EventLog};
use joblock::locks::{self, LockInfo};
use joblock::JobArg;
use serde_json::json;
use std::io::Write;

/// Write one line of command output, turning I/O failures into command errors.
macro_rules! say {
    ($out:expr) => {
        writeln!($out).map_err(output_error)?
    };
    ($out:expr, $($arg:tt)*) => {
        writeln!($out, $($arg)*).map_err(output_error)?
    };
}

fn output_error(e: std::io::Error) -> JoblockError {
    JoblockError::UserError(format!("failed to write output: {}", e))
}

/// Resolve the configuration and run the parsed command.
pub fn dispatch(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    run(&config, cli.command, out)
}

/// Run a command against an already-loaded configuration.
pub fn run(config: &Config, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Key(args) => cmd_key(config, args, out),
        Command::Lock(lock_cmd) => dispatch_lock(config, lock_cmd, out),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(config: &Config, lock_cmd: LockCommand, out: &mut dyn Write) -> Result<()> {
    match lock_cmd.action {
        LockAction::List => cmd_lock_list(config, out),
        LockAction::Show(args) => cmd_lock_show(config, &args.key, out),
        LockAction::Clear(args) => cmd_lock_clear(config, args, out),
    }
}

fn cmd_key(config: &Config, args: KeyArgs, out: &mut dyn Write) -> Result<()> {
    let job_args: Vec<JobArg> = match &args.json {
        Some(json) => serde_json::from_str(json).map_err(|e| {
            JoblockError::UserError(format!(
                "--json must be a JSON array of strings, numbers, booleans or nulls: {}",
                e
            ))
        })?,
        None => args.args.iter().map(|a| JobArg::parse_lossy(a)).collect(),
    };

    let key = config.key_scheme().derive(&args.job, &job_args);
    say!(out, "{}", key);
    Ok(())
}

fn cmd_lock_list(config: &Config, out: &mut dyn Write) -> Result<()> {
    let store = config.open_store()?;
    let locks = locks::list_locks(&store, config)?;

    if locks.is_empty() {
        say!(out, "No held locks.");
        return Ok(());
    }

    say!(out, "Held locks ({}):", locks.len());
    say!(out);

    for lock in &locks {
        write_lock_details(config, lock, out)?;
        say!(out);
    }

    // Summary
    let stale_count = locks.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        say!(
            out,
            "Note: {} lock(s) are stale. If their workers are gone, use `joblock lock clear <key> --force`.",
            stale_count
        );
    }

    Ok(())
}

fn cmd_lock_show(config: &Config, key: &str, out: &mut dyn Write) -> Result<()> {
    let store = config.open_store()?;
    let lock = locks::show_lock(&store, key, config)?;
    write_lock_details(config, &lock, out)
}

fn cmd_lock_clear(config: &Config, args: LockClearArgs, out: &mut dyn Write) -> Result<()> {
    // Require --force flag
    if !args.force {
        return Err(JoblockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock while its job is still queued or running lets a duplicate in.\n\
             Only clear locks if you are certain the job is no longer queued or running.\n\n\
             To clear the lock, run:\n  joblock lock clear {} --force",
            args.key
        )));
    }

    let store = config.open_store()?;
    let cleared = locks::clear_lock(&store, &args.key, config)?;

    if let Some(path) = &config.event_log {
        let event = Event::new(EventAction::LockClear, cleared.key.as_str()).with_details(json!({
            "locked_at": cleared.record.value(),
            "age_minutes": cleared.record.age().map(|age| age.num_minutes()),
            "was_stale": cleared.is_stale,
            "force": args.force,
        }));

        // Best-effort logging: the lock is already gone, so don't fail the command.
        if let Err(e) = EventLog::new(path).append(&event) {
            eprintln!("Warning: failed to log lock_clear event: {}", e);
        }
    }

    say!(out, "Cleared lock: {}", cleared.key);
    say!(out);
    say!(out, "Lock details:");
    say!(out, "  Locked at:  {}", cleared.record.value());
    say!(out, "  Age:        {}", cleared.record.age_string());
    if cleared.is_stale {
        say!(out, "  Status:     was STALE");
    }

    Ok(())
}

fn write_lock_details(config: &Config, lock: &LockInfo, out: &mut dyn Write) -> Result<()> {
    say!(out, "  {}:", lock.key);
    say!(out, "    Locked at:  {}", lock.record.value());
    say!(out, "    Age:        {}", lock.record.age_string());
    if lock.is_stale {
        say!(
            out,
            "    Status:     STALE (exceeds {} min threshold)",
            config.stale_after_minutes
        );
    }
    Ok(())
}
