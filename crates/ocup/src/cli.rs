use std::path::PathBuf;

use clap::Parser;

/// Download and install the latest OpenCode release.
#[derive(Parser, Debug)]
#[command(name = "ocup")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Update the installation next to ocup:\n",
    "    $ ocup\n\n",
    "  Reinstall the latest release into a specific directory:\n",
    "    $ ocup --force --path ~/.local/bin\n",
))]
pub struct Cli {
    /// Install even when the current version is already up to date.
    #[arg(short, long)]
    pub force: bool,

    /// Do not fetch or show release notes.
    #[arg(short, long = "skip-notes")]
    pub skip_notes: bool,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Extract into this directory instead of ocup's own.
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Write debug-level entries to the log file.
    #[arg(short, long)]
    pub verbose: bool,
}
