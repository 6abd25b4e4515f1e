//! Clap derive structures for the `bankwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Depends on clap alone so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bankwatch -- browse and manage bank device-monitoring hierarchies
#[derive(Debug, Parser)]
#[command(
    name = "bankwatch",
    version,
    about = "Browse and manage bank device-monitoring hierarchies",
    long_about = "Materializes the customer → zone → branch → device hierarchy stored in\n\
        the entity store as a navigable tree, with breadcrumbs, derived child\n\
        tables, and a dashboard summary.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Store profile to use
    #[arg(long, short = 'p', env = "BANKWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Entity store URL (overrides profile)
    #[arg(long, short = 'u', env = "BANKWATCH_URL", global = true)]
    pub url: Option<String>,

    /// Store API key
    #[arg(long, env = "BANKWATCH_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Act as this user id (scopes the hierarchy to the user's customer)
    #[arg(long, env = "BANKWATCH_USER", global = true)]
    pub user: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BANKWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BANKWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "BANKWATCH_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the hierarchy as a tree
    #[command(alias = "t")]
    Tree(TreeArgs),

    /// Show the ancestor path (breadcrumb) of an entity
    Path(PathArgs),

    /// Inspect and manage entities at any level
    #[command(alias = "e", alias = "ent")]
    Entities(EntitiesArgs),

    /// List and add customers
    #[command(alias = "cust")]
    Customers(CustomersArgs),

    /// Device, branch, and customer counts
    Summary(SummaryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tree / Path ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Start from this entity instead of the roots
    pub root: Option<String>,

    /// Keep only branches with a name matching this term
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Stop descending below this many levels
    #[arg(long, short = 'd')]
    pub depth: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Entity ID
    pub id: String,
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    #[command(subcommand)]
    pub command: EntitiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntitiesCommand {
    /// List entities, flat
    #[command(alias = "ls")]
    List(EntityListArgs),

    /// Show one entity with its metadata
    Get {
        /// Entity ID
        id: String,
    },

    /// Show the children table of an entity
    #[command(alias = "ch")]
    Children(ChildrenArgs),

    /// Add a child entity under a parent
    Add(AddEntityArgs),

    /// Rename an entity or change its metadata
    Edit(EditEntityArgs),

    /// Delete an entity that has no children
    #[command(alias = "rm")]
    Delete {
        /// Entity ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct EntityListArgs {
    /// Only this tier (customer, zone, nbg, ro, branch, device)
    #[arg(long = "type", short = 't')]
    pub entity_type: Option<String>,

    /// Case-insensitive name filter
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChildrenArgs {
    /// Parent entity ID
    pub id: String,

    /// Filter rows by any cell
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort by this column
    #[arg(long)]
    pub sort: Option<SortColumn>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortColumn {
    Name,
    Type,
    Status,
    LastActive,
    Children,
}

#[derive(Debug, Args)]
pub struct AddEntityArgs {
    /// Parent entity ID
    #[arg(long)]
    pub parent: String,

    /// Entity name
    #[arg(long)]
    pub name: String,

    /// Tier of the new entity (defaults to the parent's child tier)
    #[arg(long = "type", short = 't')]
    pub entity_type: Option<String>,

    /// Metadata field, repeatable (e.g. --meta ip_address=10.0.0.5)
    #[arg(long = "meta", short = 'm', value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Read metadata from a JSON file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EditEntityArgs {
    /// Entity ID
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// Metadata field to set, repeatable
    #[arg(long = "meta", short = 'm', value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Replace metadata with the contents of a JSON file
    #[arg(long, short = 'F', conflicts_with = "meta")]
    pub from_file: Option<PathBuf>,
}

// ── Customers ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomersCommand {
    /// List visible customers
    #[command(alias = "ls")]
    List,

    /// Add a customer with its hierarchy levels
    Add {
        /// Customer name
        #[arg(long)]
        name: String,

        /// Intermediate levels between customer and device
        #[arg(long, value_delimiter = ',', default_value = "zone,branch")]
        levels: Vec<String>,

        /// Metadata field, repeatable (e.g. --meta country=IN)
        #[arg(long = "meta", short = 'm', value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },
}

// ── Summary ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Keep running and print the summary every time it is recomputed
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Recompute period in seconds (with --watch; defaults to the profile's)
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
