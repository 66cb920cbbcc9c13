use clap::{Args, Parser, Subcommand};

use sealnote_core::VERSION;

/// Sealnote - encrypted notes in a folder you can sync
#[derive(Parser)]
#[command(name = "sealnote")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Notes directory (overrides the config file)
    #[arg(long, global = true, env = "SEALNOTE_NOTES_DIR", value_name = "DIR")]
    pub notes_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up a password and notes directory (or join an existing synced one)
    Init(InitArgs),

    /// Add a note
    Add(AddArgs),

    /// Replace the content of a note
    Edit(EditArgs),

    /// Show a single note
    Show(ShowArgs),

    /// List notes, newest first
    List(ListArgs),

    /// Search note content (case-insensitive)
    Search(SearchArgs),

    /// Move a note to the trash
    Trash(IdArgs),

    /// Restore a trashed or archived note
    Restore(IdArgs),

    /// Archive a note
    Archive(IdArgs),

    /// Permanently delete trashed notes
    Purge(PurgeArgs),

    /// Re-read the notes directory and report what changed
    Refresh(JsonArgs),

    /// Keep the store unlocked and follow changes made by sync tools
    Watch(WatchArgs),

    /// Upgrade a legacy password setup to salted key derivation
    Migrate,

    /// Show configuration and key setup (no password needed)
    Status(JsonArgs),
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Notes directory to create or join
    #[arg(value_name = "DIR")]
    pub path: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,

    /// Argon2 passes (advanced)
    #[arg(long, value_name = "N")]
    pub kdf_iterations: Option<u32>,

    /// Argon2 memory in KiB (advanced)
    #[arg(long, value_name = "KIB")]
    pub kdf_memory_kib: Option<u32>,

    /// Argon2 lanes (advanced)
    #[arg(long, value_name = "N")]
    pub kdf_parallelism: Option<u32>,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Note content (reads stdin when omitted)
    #[arg(value_name = "TEXT")]
    pub content: Option<String>,

    /// Output the created note as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// New content (reads stdin when omitted)
    #[arg(value_name = "TEXT")]
    pub content: Option<String>,

    /// Output the updated note as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Category to list: active, archived, trash or all
    #[arg(long, default_value = "active")]
    pub category: String,

    /// Maximum number of notes
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `search` command
#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for; empty matches everything
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Include trashed notes
    #[arg(long)]
    pub include_trash: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A single note ID
#[derive(Args)]
pub struct IdArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output the note as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `purge` command
#[derive(Args)]
pub struct PurgeArgs {
    /// Note ID (must be in the trash)
    #[arg(value_name = "ID", required_unless_present = "all")]
    pub id: Option<String>,

    /// Purge every note in the trash
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

/// Output-only arguments
#[derive(Args)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `watch` command
#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many seconds (runs until interrupted when omitted)
    #[arg(long, value_name = "SECONDS")]
    pub seconds: Option<u64>,
}
