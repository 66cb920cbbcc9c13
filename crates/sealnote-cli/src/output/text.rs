//! Text and table output formatting for notes and reports.

use chrono::{DateTime, Local, Utc};
use comfy_table::{presets, ContentArrangement, Table};

use sealnote_core::storage::{RefreshReport, ReloadReport};
use sealnote_core::Note;

use crate::helpers::preview;

const PREVIEW_MAX: usize = 60;

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Print a single note with its header fields.
pub fn print_note(note: &Note) {
    println!("ID:       {}", note.id);
    match note.previous_category {
        Some(previous) => println!("Category: {} (from {})", note.category, previous),
        None => println!("Category: {}", note.category),
    }
    println!("Created:  {}", local_time(&note.created_at));
    println!("Updated:  {}", local_time(&note.updated_at));
    println!();
    println!("{}", note.content);
}

/// Print a list of notes as a table. Quiet mode prints IDs only.
pub fn print_note_list(notes: &[Note], quiet: bool) {
    if quiet {
        for note in notes {
            println!("{}", note.id);
        }
        return;
    }
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Updated", "Category", "Preview"]);
    for note in notes {
        table.add_row(vec![
            note.id.clone(),
            local_time(&note.updated_at),
            note.category.to_string(),
            preview(&note.content, PREVIEW_MAX),
        ]);
    }
    println!("{}", table);
}

pub fn print_reload(report: &ReloadReport) {
    println!(
        "Loaded {} note(s); {} unreadable, {} quarantined, {} dropped from memory.",
        report.loaded, report.failed, report.quarantined, report.removed
    );
}

pub fn print_refresh(report: &RefreshReport) {
    if !report.changed() && report.failed == 0 {
        println!("Already up to date ({} unchanged).", report.unchanged);
        return;
    }
    println!(
        "Added {}, updated {}, removed {}, unchanged {}, unreadable {}.",
        report.added, report.updated, report.removed, report.unchanged, report.failed
    );
}
