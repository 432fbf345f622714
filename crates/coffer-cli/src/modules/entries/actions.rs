use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use coffer_core::{CardData, EntryData, Meta, PasswordData};
use serde_json::json;
use uuid::Uuid;

use super::args::{AddArgs, IdArgs, PayloadCommand, UpdateArgs};
use super::store::{EntrySummary, VaultEntry};
use crate::modules::system::{ClientError, CommandContext};

pub(crate) fn parse_id(value: &str) -> Result<Uuid, ClientError> {
    Uuid::parse_str(value.trim()).map_err(|_| ClientError::invalid("id_invalid"))
}

fn build_payload(payload: PayloadCommand) -> anyhow::Result<EntryData> {
    Ok(match payload {
        PayloadCommand::Password(args) => EntryData::Password(PasswordData {
            login: args.login,
            password: args.password,
            url: args.url,
        }),
        PayloadCommand::Note(args) => EntryData::Note(args.text),
        PayloadCommand::Card(args) => EntryData::Card(CardData {
            holder: args.holder,
            number: args.number,
            expiry: args.expiry,
            cvv: args.cvv,
        }),
        PayloadCommand::Binary(args) => {
            let bytes = std::fs::read(&args.file).map_err(|err| {
                anyhow::anyhow!("failed to read {}: {err}", args.file.display())
            })?;
            EntryData::Binary(bytes)
        }
    })
}

pub(crate) async fn handle_add(args: AddArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let entry = args.payload.entry().clone();
    let key = entry.key.unwrap_or_default();
    let meta: Meta = entry.meta.into_iter().collect();
    let data = build_payload(args.payload)?;
    let created = ctx.vault.create(&key, meta, &data).await?;
    println!("{}", created.id);
    Ok(())
}

pub(crate) async fn handle_update(args: UpdateArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let entry = args.payload.entry().clone();
    if entry.key.is_some() {
        return Err(ClientError::invalid("key_immutable").into());
    }
    let meta = if entry.meta.is_empty() {
        None
    } else {
        Some(entry.meta.into_iter().collect::<Meta>())
    };
    let data = build_payload(args.payload)?;
    let updated = ctx.vault.update(id, meta, &data).await?;
    println!("{} v{}", updated.id, updated.version);
    Ok(())
}

pub(crate) async fn handle_rm(args: IdArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    ctx.vault.delete(id).await?;
    println!("{id}");
    Ok(())
}

pub(crate) async fn handle_show(args: IdArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let entry = ctx.vault.get(id).await?;
    println!("{}", serde_json::to_string_pretty(&render_entry(&entry))?);
    Ok(())
}

pub(crate) async fn handle_ls(ctx: &CommandContext) -> anyhow::Result<()> {
    let entries = ctx.vault.list().await?;
    print_entry_table(&entries);
    Ok(())
}

fn render_entry(entry: &VaultEntry) -> serde_json::Value {
    let data = match &entry.data {
        EntryData::Password(password) => json!({
            "login": password.login,
            "password": password.password,
            "url": password.url,
        }),
        EntryData::Note(text) => json!({ "text": text }),
        EntryData::Card(card) => json!({
            "holder": card.holder,
            "number": card.number,
            "expiry": card.expiry,
            "cvv": card.cvv,
        }),
        EntryData::Binary(bytes) => json!({ "base64": STANDARD.encode(bytes) }),
    };
    json!({
        "id": entry.id,
        "key": entry.key,
        "type": entry.data.entry_type().as_str(),
        "meta": entry.meta,
        "data": data,
        "version": entry.version,
        "global_version": entry.global_version,
        "created_at": entry.created_at.to_rfc3339(),
        "updated_at": entry.updated_at.to_rfc3339(),
    })
}

fn print_entry_table(entries: &[EntrySummary]) {
    let key_width = entries
        .iter()
        .map(|entry| entry.key.len())
        .max()
        .unwrap_or(0)
        .max("KEY".len());

    println!(
        "{:<36}  {:<8}  {:<key_width$}  {:>7}  STATE",
        "ID",
        "TYPE",
        "KEY",
        "VERSION",
        key_width = key_width
    );
    for entry in entries {
        let state = if entry.global_version == 0 {
            "new"
        } else if entry.pending {
            "modified"
        } else {
            "synced"
        };
        println!(
            "{:<36}  {:<8}  {:<key_width$}  {:>7}  {}",
            entry.id,
            entry.entry_type.as_str(),
            entry.key,
            entry.version,
            state,
            key_width = key_width
        );
    }
}
