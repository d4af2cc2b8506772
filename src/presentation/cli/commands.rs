//! CLI arguments using clap

use clap::Parser;
use std::path::PathBuf;

/// Delphi - bootable media OS identification
///
/// Prints the OS family of an installation medium, `Unknown` for bootable
/// media no signature matches, or `Invalid` for anything else.
#[derive(Parser, Debug)]
#[command(name = "delphi")]
#[command(version)]
#[command(about = "Identify the operating system on bootable media", long_about = None)]
pub struct Cli {
    /// Disk images or devices to identify
    pub paths: Vec<PathBuf>,

    /// Signature database file or directory (repeatable, replaces the default search path)
    #[arg(long = "db", value_name = "DIR|FILE")]
    pub databases: Vec<PathBuf>,

    /// Skip the signature definitions compiled into the binary
    #[arg(long)]
    pub no_builtin: bool,

    /// Print a JSON identification report instead of a token
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
