//! Clap derive structures for the `parental` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// parental -- manage OpenWrt parental-control policy from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "parental",
    version,
    about = "Manage OpenWrt parental-control groups, clients and devices",
    long_about = "Reads and edits the parental-control policy of an OpenWrt router\n\
        through its ubus JSON-RPC endpoint.\n\n\
        Edits are applied to a local copy of the policy and written back\n\
        with a single save_config call, after which the policy is reloaded.",
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
    /// Router profile to use
    #[arg(long, short = 'p', env = "PARENTAL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router base URL (overrides profile)
    #[arg(long, short = 'e', env = "PARENTAL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// rpcd session token (defaults to the anonymous session)
    #[arg(long, global = true, hide_env = true)]
    pub session: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PARENTAL_OUTPUT",
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
    #[arg(long, short = 'k', env = "PARENTAL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PARENTAL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Devices seen on the network (merged discovery view)
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage policy groups
    #[command(alias = "grp", alias = "g")]
    Groups(GroupsArgs),

    /// Manage clients under parental control
    #[command(alias = "cl")]
    Clients(ClientsArgs),

    /// View and change global settings
    #[command(alias = "set")]
    Settings(SettingsArgs),

    /// Service health checks
    Health,

    /// Recent activity log
    Activity,

    /// Activity share per managed client
    Usage,

    /// Push group DNS profiles to the external filter
    Sync,

    /// Regenerate and reload the firewall rules
    Apply,

    /// Poll the router and print a status line on every change
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List discovered devices
    #[command(alias = "ls")]
    List {
        /// Only devices not yet under parental control
        #[arg(long)]
        unmanaged: bool,
    },

    /// Show one device
    Get { mac: String },

    /// Put a discovered device under parental control
    Promote {
        mac: String,
        /// Group to assign
        #[arg(long, short = 'g')]
        group: String,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List policy groups
    #[command(alias = "ls")]
    List,

    /// Show one group and its members
    Get { id: String },

    /// Create a group
    #[command(alias = "create")]
    Add {
        /// Display name; the identifier is derived from it
        name: String,
        #[command(flatten)]
        fields: GroupFields,
    },

    /// Change a group's identifier (member clients follow)
    Rename { id: String, new_id: String },

    /// Change group fields
    Update {
        id: String,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: GroupFields,
    },

    /// Delete a group (member clients become unassigned)
    #[command(alias = "rm")]
    Remove { id: String },

    /// Pause every client in the group
    Pause {
        id: String,
        /// How long, e.g. "30m" or "2h"
        #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
        duration: Duration,
    },

    /// Block every client in the group
    Block { id: String },

    /// Unblock every client in the group
    Unblock { id: String },
}

#[derive(Debug, Default, Args)]
pub struct GroupFields {
    /// DNS filtering profile
    #[arg(long)]
    pub dns_profile: Option<String>,

    /// Daily quota in minutes (empty string clears it)
    #[arg(long)]
    pub quota: Option<String>,

    /// Schedule line, repeatable (replaces the whole schedule)
    #[arg(long = "schedule", value_name = "RULE")]
    pub schedule: Vec<String>,

    /// Remove every schedule line
    #[arg(long, conflicts_with = "schedule")]
    pub clear_schedule: bool,
}

// ── Clients ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClientsArgs {
    #[command(subcommand)]
    pub command: ClientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List managed clients
    #[command(alias = "ls")]
    List,

    /// Show one client
    Get { mac: String },

    /// Manage a client by MAC address
    Add {
        mac: String,
        #[arg(long, short = 'n', default_value = "")]
        name: String,
        #[arg(long, short = 'g', default_value = "")]
        group: String,
    },

    /// Move a client to another group
    Assign { mac: String, group: String },

    /// Change a client's display name
    Rename { mac: String, name: String },

    /// Stop managing a client
    #[command(alias = "rm")]
    Remove { mac: String },

    /// Suspend a client's access
    Pause {
        mac: String,
        /// How long, e.g. "30m" or "2h"
        #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
        duration: Duration,
    },

    /// Block a client
    Block { mac: String },

    /// Unblock a client
    Unblock { mac: String },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show every global setting
    #[command(alias = "ls")]
    List,

    /// Change a global setting
    Set { key: String, value: String },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval, e.g. "10s" (overrides profile)
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (session tokens masked)
    Show,

    /// Create a profile interactively
    Init,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
