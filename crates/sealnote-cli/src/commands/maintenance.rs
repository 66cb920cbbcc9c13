use std::path::Path;

use sealnote_core::keys::KeyMethod;
use sealnote_core::storage::is_record_file;
use sealnote_core::{NoteStore, SealnoteError, UnlockOutcome};

use crate::app::{resolve_config_path, unlock_with_retry, AppContext};
use crate::cli::JsonArgs;
use crate::errors::CliError;

/// Upgrade a legacy installation; a no-op once salted.
pub fn handle_migrate(ctx: &AppContext) -> anyhow::Result<()> {
    let keys = ctx.key_manager()?;
    match keys.method()? {
        None => return Err(SealnoteError::NotInitialized.into()),
        Some(KeyMethod::Salted) => {
            if !ctx.quiet() {
                println!("Already using salted key derivation.");
            }
            return Ok(());
        }
        Some(KeyMethod::Legacy) => {}
    }

    let notes_dir = ctx.notes_dir()?;
    if !notes_dir.exists() {
        return Err(CliError::not_found(
            format!("Notes directory not found: {}", notes_dir.display()),
            "Hint: Check --notes-dir or the [vault] section of the config file.",
        )
        .into());
    }
    let store = NoteStore::open(&notes_dir, ctx.config()?.store_options())?;
    let outcome = unlock_with_retry(&keys, &store, ctx.interactive(), true)?;
    store.close();

    if !ctx.quiet() {
        match outcome {
            UnlockOutcome::Migrated { reencrypted, .. } => println!(
                "Upgraded to salted key derivation; re-encrypted {} note(s).",
                reencrypted
            ),
            _ => println!("Already using salted key derivation."),
        }
    }
    Ok(())
}

fn count_records(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| is_record_file(&entry.path()))
                .count()
        })
        .unwrap_or(0)
}

/// Report configuration and key setup without asking for the password.
pub fn handle_status(ctx: &AppContext, args: &JsonArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        if args.json {
            let value = serde_json::json!({
                "initialized": false,
                "config_path": config_path,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("Not initialized (no config at {}).", config_path.display());
            println!("Run `sealnote init` to get started.");
        }
        return Ok(());
    }

    let notes_dir = ctx.notes_dir()?;
    let keys = ctx.key_manager()?;
    let method = keys.method()?;
    let shared_salt = keys.shared_salt_path().is_some_and(|path| path.exists());
    let pending_migration = keys.pending_path().exists();
    let records = count_records(&notes_dir);

    if args.json {
        let value = serde_json::json!({
            "initialized": true,
            "config_path": config_path,
            "notes_dir": notes_dir,
            "notes_dir_exists": notes_dir.exists(),
            "key_method": method,
            "shared_salt": shared_salt,
            "pending_migration": pending_migration,
            "records": records,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Config:            {}", config_path.display());
    println!("Notes directory:   {}", notes_dir.display());
    println!(
        "Key method:        {}",
        method.map_or_else(|| "none".to_string(), |m| m.to_string())
    );
    println!("Shared salt:       {}", if shared_salt { "present" } else { "missing" });
    if pending_migration {
        println!("Pending migration: yes (unlock to finish it)");
    }
    println!("Note files:        {}", records);
    if method == Some(KeyMethod::Legacy) {
        println!("\nHint: Run `sealnote migrate` to upgrade to salted key derivation.");
    }
    Ok(())
}
