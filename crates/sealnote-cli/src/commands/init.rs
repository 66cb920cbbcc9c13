use std::path::PathBuf;

use secrecy::ExposeSecret;

use sealnote_core::crypto::KdfParams;
use sealnote_core::{KeyManager, NoteStore, UnlockOutcome};

use crate::app::{key_dir_for, read_new_password, resolve_config_path, unlock_with_retry, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_notes_dir, write_config, SealnoteConfig};
use crate::errors::CliError;

fn kdf_params(args: &InitArgs) -> KdfParams {
    let defaults = KdfParams::default();
    KdfParams::new(
        args.kdf_iterations.unwrap_or(defaults.iterations),
        args.kdf_memory_kib.unwrap_or(defaults.memory_kib),
        args.kdf_parallelism.unwrap_or(defaults.parallelism),
    )
}

/// Set a password for a new notes directory, or join one created on another device.
///
/// The config file is written only after the key step succeeds.
pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Use --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let notes_dir = match args.path.as_deref().or(ctx.cli().notes_dir.as_deref()) {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => default_notes_dir()?,
    };
    std::fs::create_dir_all(&notes_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create notes directory {}: {}",
            notes_dir.display(),
            e
        )
    })?;

    let kdf = kdf_params(args);
    let config = SealnoteConfig::new(&notes_dir, kdf);
    let keys = KeyManager::new(key_dir_for(&config_path), kdf).with_shared_dir(&notes_dir);

    if let Some(method) = keys.method()? {
        if !ctx.quiet() {
            println!("Keeping the existing {} password setup.", method);
        }
    } else if keys.is_first_time_setup() {
        let password = read_new_password(ctx.interactive())?;
        keys.store_password(password.expose_secret())?;
    } else {
        // The directory already carries a shared salt: prove the password
        // against the synced records before keeping a local key config.
        let store = NoteStore::open(&notes_dir, config.store_options())?;
        let outcome = unlock_with_retry(&keys, &store, ctx.interactive(), true)?;
        let loaded = outcome.report().loaded;
        store.close();
        if let UnlockOutcome::Bootstrapped(_) = outcome {
            if !ctx.quiet() {
                println!("Joined existing notes directory ({} note(s)).", loaded);
            }
        }
    }

    write_config(&config_path, &config)?;

    if !ctx.quiet() {
        println!("Notes directory: {}", notes_dir.display());
        println!("Config written to {}", config_path.display());
        println!("\nNext: sealnote add \"My first note\"");
    }
    Ok(())
}
