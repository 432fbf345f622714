use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "coffer-server")]
#[command(about = "Coffer vault sync server")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run database migrations and exit
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Server,
    Migrate,
}

impl From<Cli> for RunMode {
    fn from(cli: Cli) -> Self {
        match cli.command {
            None => Self::Server,
            Some(Command::Migrate) => Self::Migrate,
        }
    }
}

pub fn parse_args() -> RunMode {
    Cli::parse().into()
}
