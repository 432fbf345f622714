use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Args)]
pub struct AddArgs {
    #[command(subcommand)]
    pub payload: PayloadCommand,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    #[command(subcommand)]
    pub payload: PayloadCommand,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Subcommand)]
pub enum PayloadCommand {
    Password(PasswordArgs),
    Note(NoteArgs),
    Card(CardArgs),
    Binary(BinaryArgs),
}

impl PayloadCommand {
    pub fn entry(&self) -> &EntryArgs {
        match self {
            Self::Password(args) => &args.entry,
            Self::Note(args) => &args.entry,
            Self::Card(args) => &args.entry,
            Self::Binary(args) => &args.entry,
        }
    }
}

#[derive(Args, Clone)]
pub struct EntryArgs {
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long = "meta", value_name = "NAME=VALUE", value_parser = parse_meta_pair)]
    pub meta: Vec<(String, String)>,
}

#[derive(Args)]
pub struct PasswordArgs {
    #[command(flatten)]
    pub entry: EntryArgs,
    #[arg(long)]
    pub login: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Args)]
pub struct NoteArgs {
    #[command(flatten)]
    pub entry: EntryArgs,
    #[arg(long)]
    pub text: String,
}

#[derive(Args)]
pub struct CardArgs {
    #[command(flatten)]
    pub entry: EntryArgs,
    #[arg(long)]
    pub holder: String,
    #[arg(long)]
    pub number: String,
    #[arg(long)]
    pub expiry: String,
    #[arg(long)]
    pub cvv: String,
}

#[derive(Args)]
pub struct BinaryArgs {
    #[command(flatten)]
    pub entry: EntryArgs,
    #[arg(long)]
    pub file: PathBuf,
}

pub fn parse_meta_pair(value: &str) -> Result<(String, String), String> {
    let (name, meta_value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{value}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("meta name must not be empty".to_string());
    }
    Ok((name.to_string(), meta_value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_pairs_split_on_first_equals() {
        assert_eq!(
            parse_meta_pair("url=https://a.test/?x=1"),
            Ok(("url".to_string(), "https://a.test/?x=1".to_string()))
        );
        assert!(parse_meta_pair("novalue").is_err());
        assert!(parse_meta_pair("=x").is_err());
    }
}
