mod cli;
mod config;
mod db;
mod migration;
mod source;
mod transition;

use clap::Parser;
use cli::{commands, error::AppError, output, ux, Commands, ConfigCommands};
use transition::Operation;


async fn run_command(args: &cli::Cli) -> Result<output::CommandData, AppError> {
    let config_path = args.config_path();
    let env_name = args.env_name();

    match &args.command {
        Commands::Up { steps } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::transition(env_name, &env, Operation::Up { steps: *steps }, args.auto_approve).await
        }
        Commands::Down { steps } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::transition(env_name, &env, Operation::Down { steps: *steps }, args.auto_approve).await
        }
        Commands::Goto { version } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::transition(env_name, &env, Operation::Goto { target: *version }, args.auto_approve).await
        }
        Commands::Force { version } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::transition(env_name, &env, Operation::Force { version: *version }, args.auto_approve).await
        }
        Commands::Status { } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::status(env_name, &env).await
        }
        Commands::History { limit } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::history(env_name, &env, *limit).await
        }
        Commands::Validate { } => commands::validate(&config_path, args.env.as_deref()),
        Commands::Create { name, ext } => {
            let env = commands::select_environment(&config_path, env_name)?;
            commands::create(&env, name, ext)
        }
        Commands::Config { command: ConfigCommands::Show { } } => commands::config_show(&config_path),
    }
}


/// Entry point for the migrate-tool CLI.
///
/// Every command resolves one environment from the config file (`--env`,
/// default `dev`), except `validate`, which checks all of them unless
/// `--env` is given. Transitions (`up`, `down`, `goto`, `force`) are
/// confirmed interactively unless `--auto-approve` is set.
/// Errors exit with status 1; a cancelled transition exits with 0.
#[tokio::main]
async fn main() {
    let args: cli::Cli = cli::Cli::parse();

    if let Err(e) = ux::setup_logging(args.verbose, args.quiet, args.json) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let result = run_command(&args).await;
    let output = output::CommandOutput::from_result(args.command.to_string(), result);

    if args.json {
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{}", AppError::from(e));
                std::process::exit(1);
            }
        }
    } else {
        ux::render_human_output(&output, &ux::Palette::detect());
    }

    if let output::CommandStatus::Error = output.status {
        std::process::exit(1);
    }
}
