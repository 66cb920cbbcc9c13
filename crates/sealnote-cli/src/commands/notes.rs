use sealnote_core::{Category, Note};

use crate::app::AppContext;
use crate::cli::{AddArgs, EditArgs, IdArgs, ListArgs, PurgeArgs, SearchArgs, ShowArgs};
use crate::helpers::{parse_category_filter, read_content};
use crate::output::{note_json, notes_json, print_note, print_note_list};

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a note that a command just changed.
fn emit_changed(ctx: &AppContext, note: &Note, json: bool, verb: &str) -> anyhow::Result<()> {
    if json {
        return print_json(&note_json(note));
    }
    if ctx.quiet() {
        println!("{}", note.id);
    } else {
        println!("{} note {}", verb, note.id);
    }
    Ok(())
}

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let content = read_content(args.content.clone())?;
    let store = ctx.unlock_store()?;
    let note = store.create(&content)?;
    store.close();
    emit_changed(ctx, &note, args.json, "Added")
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let content = read_content(args.content.clone())?;
    let store = ctx.unlock_store()?;
    let note = store.update(&args.id, &content)?;
    store.close();
    emit_changed(ctx, &note, args.json, "Updated")
}

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let note = store.get(&args.id)?;
    store.close();
    if args.json {
        return print_json(&note_json(&note));
    }
    print_note(&note);
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let filter = parse_category_filter(&args.category)?;
    let store = ctx.unlock_store()?;
    let mut notes = match filter {
        Some(category) => store.list_category(category)?,
        None => store.list()?,
    };
    store.close();
    if let Some(limit) = args.limit {
        notes.truncate(limit);
    }

    if args.json {
        return print_json(&serde_json::Value::Array(notes_json(&notes)));
    }
    print_note_list(&notes, ctx.quiet());
    Ok(())
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let mut notes = store.search(&args.query)?;
    store.close();
    if !args.include_trash {
        notes.retain(|note| note.category != Category::Trash);
    }

    if args.json {
        return print_json(&serde_json::Value::Array(notes_json(&notes)));
    }
    print_note_list(&notes, ctx.quiet());
    Ok(())
}

pub fn handle_trash(ctx: &AppContext, args: &IdArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let note = store.trash(&args.id)?;
    store.close();
    emit_changed(ctx, &note, args.json, "Trashed")
}

pub fn handle_restore(ctx: &AppContext, args: &IdArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let note = store.restore(&args.id)?;
    store.close();
    emit_changed(ctx, &note, args.json, "Restored")
}

pub fn handle_archive(ctx: &AppContext, args: &IdArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let note = store.archive(&args.id)?;
    store.close();
    emit_changed(ctx, &note, args.json, "Archived")
}

/// Permanently delete one trashed note, or the whole trash with `--all`.
pub fn handle_purge(ctx: &AppContext, args: &PurgeArgs) -> anyhow::Result<()> {
    let store = ctx.unlock_store()?;
    let result = match args.id.as_deref() {
        Some(id) if !args.all => store.purge(id).map(|()| {
            if !ctx.quiet() {
                println!("Purged note {}", id);
            }
        }),
        _ => store.empty_trash().map(|count| {
            if !ctx.quiet() {
                println!("Purged {} note(s) from the trash.", count);
            }
        }),
    };
    store.close();
    Ok(result?)
}
