pub mod commands;
pub mod error;
pub mod output;
pub mod prompt;
pub mod ux;

use crate::config::DEFAULT_CONFIG_FILE;
pub use clap::{Parser, Subcommand};

use std::path::PathBuf;


pub const DEFAULT_ENVIRONMENT: &str = "dev";


#[derive(Parser)]
#[command(name = "migrate-tool", version, about = "Database migration tool with single-file up/down migrations.")]
pub struct Cli {
    #[arg(
        long = "config",
        global = true,
        help = "Config file [default: ./migrate-tool.yaml]",
        env = "MIGRATE_TOOL_CONFIG",
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "env",
        global = true,
        help = "Environment name from the config file [default: dev]",
        env = "MIGRATE_TOOL_ENV",
    )]
    pub env: Option<String>,

    #[arg(
        long,
        global = true,
        action = clap::ArgAction::SetTrue,
        help = "Skip confirmation prompts (for CI/CD)."
    )]
    pub auto_approve: bool,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Set level of verbosity. [default: INFO]\n\t-v: DEBUG\n\t-vv: TRACE\n--quiet takes precedence over --verbose."
    )]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::SetTrue,
        help = "Disable all information logs (only ERROR level logs are shown).\n--quiet takes precedence over --verbose."
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        action = clap::ArgAction::SetTrue,
        help = "Enable JSON output format. Human readable output is disabled when this flag is set."
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn env_name(&self) -> &str {
        self.env.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending migrations.")]
    Up {
        #[arg(long, default_value_t = 0, help = "Number of migrations to apply (0 = all).")]
        steps: u64,
    },

    #[command(about = "Roll back migrations.")]
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back (0 also rolls back 1).")]
        steps: u64,
    },

    #[command(about = "Migrate up or down to a specific version. 0 rolls everything back.")]
    Goto {
        version: u64,
    },

    #[command(about = "Force set the migration version without running any migrations.
USE WITH CAUTION: intended for recovering from a dirty state after a failed migration.
-1 clears the version.")]
    Force {
        #[arg(allow_negative_numbers = true)]
        version: i64,
    },

    #[command(about = "Show current version, dirty state and pending count.")]
    Status {},

    #[command(about = "List migrations with their applied status.")]
    History {
        #[arg(long, default_value_t = 10, help = "Number of migrations to show.")]
        limit: usize,
    },

    #[command(about = "Validate the config file and migration files.
Checks every environment, or only the one given with --env.")]
    Validate {},

    #[command(about = "Create a new migration file with the next version.")]
    Create {
        name: String,

        #[arg(long, default_value = "sql", help = "File extension. Only sql is accepted.")]
        ext: String,
    },

    #[command(about = "Configuration management.")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the current configuration with sensitive values masked.")]
    Show {},
}

impl std::fmt::Display for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Commands::Up { .. } => "up",
            Commands::Down { .. } => "down",
            Commands::Goto { .. } => "goto",
            Commands::Force { .. } => "force",
            Commands::Status { .. } => "status",
            Commands::History { .. } => "history",
            Commands::Validate { .. } => "validate",
            Commands::Create { .. } => "create",
            Commands::Config { command: ConfigCommands::Show { .. } } => "config show",
        };
        write!(f, "{name}")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("migrate-tool").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", args, e))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn step_defaults() {
        match parse(&["up"]).command {
            Commands::Up { steps } => assert_eq!(steps, 0),
            _ => panic!("Expected up"),
        }
        match parse(&["down"]).command {
            Commands::Down { steps } => assert_eq!(steps, 1),
            _ => panic!("Expected down"),
        }
        match parse(&["history"]).command {
            Commands::History { limit } => assert_eq!(limit, 10),
            _ => panic!("Expected history"),
        }
    }

    #[test]
    fn force_accepts_negative_one() {
        match parse(&["force", "-1"]).command {
            Commands::Force { version } => assert_eq!(version, -1),
            _ => panic!("Expected force"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["goto", "3", "--env", "prod", "--auto-approve", "--json"]);
        assert_eq!(cli.env_name(), "prod");
        assert!(cli.auto_approve);
        assert!(cli.json);
        assert_eq!(cli.command.to_string(), "goto");
    }

    #[test]
    fn command_names() {
        let cases: &[(&[&str], &str)] = &[
            (&["status"], "status"),
            (&["validate"], "validate"),
            (&["create", "add_users"], "create"),
            (&["config", "show"], "config show"),
            (&["force", "2"], "force"),
        ];

        for (args, name) in cases {
            assert_eq!(parse(args).command.to_string(), *name, "Name for {:?}", args);
        }
    }

    #[test]
    fn goto_rejects_negative_versions() {
        assert!(Cli::try_parse_from(["migrate-tool", "goto", "-1"]).is_err());
    }
}
