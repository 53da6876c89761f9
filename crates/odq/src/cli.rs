//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the odq CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// odq - Run filtered, sorted OData collection queries
#[derive(Parser, Debug)]
#[command(name = "odq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override the service root (default: from config)
    #[arg(long, global = true, env = "ODQ_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query an entity set and print the rows
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Print the request URL for a query without sending it
    Url(QueryArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Arguments shared by `query` and `url`
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Entity set to query (e.g., "People")
    pub entity_set: String,

    /// Filter expression (e.g., "Age ge 18 and Name startswith 'A'")
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Sort specification, "Field" or "Field desc" (repeatable)
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub sort: Vec<String>,

    /// Maximum number of rows (default: configured page size)
    #[arg(short, long)]
    pub top: Option<u32>,

    /// Number of rows to skip
    #[arg(long)]
    pub skip: Option<u32>,

    /// Leave `$count=true` out of the request (the service must still report a count)
    #[arg(long)]
    pub no_count: bool,

    /// Navigation property to expand (repeatable)
    #[arg(short = 'x', long, action = clap::ArgAction::Append)]
    pub expand: Vec<String>,

    /// Alternate backend registered in config
    #[arg(short, long)]
    pub backend: Option<String>,
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (base_address, page_size, timeout_secs, alternate.<name>)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Show config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_with_all_options() {
        let cli = Cli::parse_from([
            "odq",
            "query",
            "People",
            "--filter",
            "Age ge 18",
            "-s",
            "Name desc",
            "-s",
            "Age",
            "--top",
            "10",
            "--skip",
            "20",
            "--no-count",
            "-x",
            "Department",
            "--backend",
            "archive",
        ]);
        let Commands::Query(args) = cli.command else {
            panic!("Expected Query command");
        };
        assert_eq!(args.entity_set, "People");
        assert_eq!(args.filter.as_deref(), Some("Age ge 18"));
        assert_eq!(args.sort, vec!["Name desc", "Age"]);
        assert_eq!(args.top, Some(10));
        assert_eq!(args.skip, Some(20));
        assert!(args.no_count);
        assert_eq!(args.expand, vec!["Department"]);
        assert_eq!(args.backend.as_deref(), Some("archive"));
    }

    #[test]
    fn test_query_alias() {
        let cli = Cli::parse_from(["odq", "q", "Orders"]);
        assert!(matches!(cli.command, Commands::Query(ref args) if args.entity_set == "Orders"));
    }

    #[test]
    fn test_url_command() {
        let cli = Cli::parse_from(["odq", "url", "Orders", "-t", "5"]);
        let Commands::Url(args) = cli.command else {
            panic!("Expected Url command");
        };
        assert_eq!(args.top, Some(5));
        assert!(!args.no_count);
    }

    #[test]
    fn test_query_requires_entity_set() {
        assert!(Cli::try_parse_from(["odq", "query"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["odq", "--json", "--no-color", "url", "People", "-v"]);
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["odq", "-v", "-q", "url", "People"]).is_err());
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::parse_from(["odq", "config", "set", "page_size", "50"]);
        if let Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        } = cli.command
        {
            assert_eq!(key, "page_size");
            assert_eq!(value, "50");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn test_config_without_subcommand() {
        let cli = Cli::parse_from(["odq", "config"]);
        assert!(matches!(cli.command, Commands::Config { command: None }));
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["odq", "completions", "zsh"]);
        if let Commands::Completions { shell } = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}
