use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use sealnote_core::{Note, NoteStore};

use crate::app::AppContext;
use crate::cli::{JsonArgs, WatchArgs};
use crate::helpers::preview;
use crate::output::{print_refresh, print_reload};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const PREVIEW_MAX: usize = 50;

/// Unlock (a full reload) and then run a merge pass over the directory.
pub fn handle_refresh(ctx: &AppContext, args: &JsonArgs) -> anyhow::Result<()> {
    let options = ctx.config()?.store_options();
    let (store, outcome) = ctx.unlock_store_with(options)?;
    let refresh = store.refresh()?;
    store.close();

    if args.json {
        let value = serde_json::json!({
            "reload": outcome.report(),
            "refresh": refresh,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if !ctx.quiet() {
        print_reload(outcome.report());
        print_refresh(&refresh);
    }
    Ok(())
}

fn snapshot(store: &NoteStore) -> anyhow::Result<HashMap<String, (DateTime<Utc>, Note)>> {
    Ok(store
        .list()?
        .into_iter()
        .map(|note| (note.id.clone(), (note.updated_at, note)))
        .collect())
}

/// Keep the store unlocked with the directory watcher running and print
/// every change it applies.
pub fn handle_watch(ctx: &AppContext, args: &WatchArgs) -> anyhow::Result<()> {
    let options = ctx.config()?.watch_options();
    let (store, outcome) = ctx.unlock_store_with(options)?;
    if !ctx.quiet() {
        println!(
            "Watching {} ({} note(s)). Press Ctrl-C to stop.",
            store.dir().display(),
            outcome.report().loaded
        );
    }

    let deadline = args
        .seconds
        .map(|seconds| Instant::now() + Duration::from_secs(seconds));
    let mut previous = snapshot(&store)?;

    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        thread::sleep(POLL_INTERVAL);

        let current = snapshot(&store)?;
        debug!(notes = current.len(), "polled store");
        for (id, (updated_at, note)) in &current {
            match previous.get(id) {
                None => println!("+ {}  {}", id, preview(&note.content, PREVIEW_MAX)),
                Some((before, _)) if before != updated_at => {
                    println!("~ {}  {}", id, preview(&note.content, PREVIEW_MAX))
                }
                Some(_) => {}
            }
        }
        for id in previous.keys() {
            if !current.contains_key(id) {
                println!("- {}", id);
            }
        }
        previous = current;
    }

    store.close();
    Ok(())
}
