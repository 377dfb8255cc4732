pub mod digest;
pub mod init;
pub mod reconcile;
pub mod status;
pub mod validate;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "settle", about = "Purchase-to-ledger reconciliation and feed digests.")]
pub struct Cli {
    /// Config file path (default: ~/.config/settle/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config file and .env.example.
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Check the config file and environment, reporting every problem.
    Validate,
    /// Match a purchase export against ledger transactions.
    Reconcile {
        /// Path to the purchase CSV export
        #[arg(long)]
        purchases: String,
        /// Source tag written into matched memos
        #[arg(long, default_value = "amazon")]
        source: String,
        /// Ledger register CSV to match against instead of the budget API
        #[arg(long)]
        transactions: Option<String>,
        /// How many days of ledger history to fetch
        #[arg(long)]
        days: Option<i64>,
        /// Score and report, but write no memos and no state
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Fetch feeds, drop near-duplicate headlines, print a digest.
    Digest {
        /// Read saved feed JSON files instead of fetching configured feeds
        #[arg(long)]
        input: Vec<String>,
        /// Only include items from the last N days
        #[arg(long)]
        days: Option<i64>,
        /// Print the digest without emailing it
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Show config location and match-state summary.
    Status,
    /// Generate shell completions.
    Completions {
        /// Shell: bash, zsh, fish, elvish, powershell
        shell: Shell,
    },
}
