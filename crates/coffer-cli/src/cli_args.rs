use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::auth::args::*;
pub use crate::modules::entries::args::*;

#[derive(Parser)]
#[command(name = "coffer")]
#[command(about = "Coffer vault client")]
pub struct Cli {
    #[arg(long, env = "COFFER_ADDR")]
    pub addr: Option<String>,
    #[arg(long, env = "COFFER_HOME")]
    pub home: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Create an account on the server")]
    Register(CredentialsArgs),
    #[command(about = "Log in and cache an access token")]
    Login(CredentialsArgs),
    #[command(about = "Forget the cached access token")]
    Logout,
    #[command(about = "Add an entry to the local vault")]
    Add(AddArgs),
    #[command(about = "Replace an entry's payload")]
    Update(UpdateArgs),
    #[command(about = "Delete an entry")]
    Rm(IdArgs),
    #[command(about = "Print one decrypted entry")]
    Show(IdArgs),
    #[command(about = "List local entries")]
    Ls,
    #[command(about = "Push local changes, then pull server state")]
    Sync,
}
