//! CLI argument parsing for joblock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// joblock: inspect and recover the locks that keep duplicate background jobs out of
/// the queue.
///
/// A job's lock is taken when it is enqueued and removed when it finishes or fails.
/// A worker that dies in between leaves the lock behind, and further enqueues of that
/// job are refused until it is cleared with `joblock lock clear`.
#[derive(Parser, Debug)]
#[command(name = "joblock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: $JOBLOCK_CONFIG, then ./joblock.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for joblock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the lock key a job would use.
    ///
    /// Arguments are read as scalars: `null`, `true`/`false`, numbers, or strings.
    Key(KeyArgs),

    /// Lock management commands.
    ///
    /// List, inspect or clear held job locks.
    Lock(LockCommand),
}

/// Arguments for the `key` command.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Job name.
    pub job: String,

    /// Job arguments, in order.
    #[arg(allow_hyphen_values = true, conflicts_with = "json")]
    pub args: Vec<String>,

    /// Job arguments as a JSON array of scalars, e.g. '["acct-1", 7]'.
    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List all held locks.
    ///
    /// Shows each key under the configured prefix with its acquisition time and age.
    List,

    /// Show a single lock.
    Show(LockShowArgs),

    /// Clear a stuck lock.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock show` command.
#[derive(Parser, Debug)]
pub struct LockShowArgs {
    /// Full lock key, e.g. "lock:Report-acct-1".
    pub key: String,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Full lock key, e.g. "lock:Report-acct-1".
    pub key: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
