mod commands;
mod helpers;

use clap::Parser;
use dojo_core::domain::DojoError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_dojo_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let full_args = std::iter::once("dojotool".to_string())
        .chain(args)
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "dojotool", about = "PseudoDojo pseudopotential table tooling")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Validate a dojo directory or djson table and report findings
    Validate(commands::ValidateArgs),
    /// Print the table summary and dojo_info metadata
    Info(commands::InfoArgs),
    /// Write (and optionally open) the validation notebook for a pseudo
    Notebook(commands::NotebookArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Validate(args) => commands::run_validate_command(args),
        CliCommand::Info(args) => commands::run_info_command(args),
        CliCommand::Notebook(args) => commands::run_notebook_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Table(DojoError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_dojo_error(&self) -> DojoError {
        match self {
            Self::Usage(message) => DojoError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Table(error) => error.clone(),
            Self::Internal(error) => DojoError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
