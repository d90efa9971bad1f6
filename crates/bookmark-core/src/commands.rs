use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::actions::ActionOutcome;
use crate::cli::{ShellCommand, parse_line};
use crate::error::StoreError;
use crate::item::ItemId;
use crate::render::Renderer;
use crate::session::Session;

/// Reads commands line by line until EOF. A failing command is reported
/// and the loop moves on; only I/O failures end it early.
#[instrument(skip_all)]
pub fn run_script<R: BufRead, W: Write>(
    session: &mut Session,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<usize> {
    let mut failures = 0_usize;

    for (index, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                    let rendered = clap_err.render().to_string();
                    if matches!(
                        clap_err.kind(),
                        clap::error::ErrorKind::DisplayHelp
                            | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    ) {
                        write!(out, "{rendered}")?;
                        continue;
                    }
                    // clap already prefixes its message with "error:"
                    failures += 1;
                    warn!(line = index + 1, "could not parse command");
                    writeln!(out, "{}", rendered.trim_end())?;
                    continue;
                }
                failures += 1;
                warn!(line = index + 1, error = %err, "could not parse command");
                writeln!(out, "error: {err:#}")?;
                continue;
            }
        };

        if let Err(err) = dispatch(session, renderer, out, command) {
            if err.downcast_ref::<std::io::Error>().is_some() {
                return Err(err);
            }
            failures += 1;
            warn!(line = index + 1, error = %err, "command failed");
            writeln!(out, "error: {err:#}")?;
        }
    }

    info!(failures, revision = session.store().revision(), "script finished");
    Ok(failures)
}

#[instrument(skip(session, renderer, out))]
pub fn dispatch<W: Write>(
    session: &mut Session,
    renderer: &Renderer,
    out: &mut W,
    command: ShellCommand,
) -> anyhow::Result<()> {
    debug!("dispatching command");

    match command {
        ShellCommand::Ls => cmd_ls(session, renderer, out),
        ShellCommand::Cd { folder } => cmd_cd(session, renderer, out, &folder),
        ShellCommand::Up => {
            session.navigate_up()?;
            renderer.print_location(out, session)
        }
        ShellCommand::Pwd => renderer.print_location(out, session),
        ShellCommand::Tree => renderer.print_tree(out, session.store()),
        ShellCommand::Mkdir { name } => {
            let folder = session.create_folder(&name.join(" "))?;
            writeln!(out, "Created folder {}.", folder.id)?;
            Ok(())
        }
        ShellCommand::Add { name, url } => {
            let bookmark = session.create_bookmark(&name, &url)?;
            writeln!(out, "Created bookmark {}.", bookmark.id)?;
            Ok(())
        }
        ShellCommand::Rename { id, name } => {
            session.rename(&id, &name.join(" "))?;
            writeln!(out, "Renamed {id}.")?;
            Ok(())
        }
        ShellCommand::Rm { ids } => {
            let removed = session.delete(&to_ids(ids))?;
            writeln!(out, "Deleted {}.", plural(removed, "item"))?;
            Ok(())
        }
        ShellCommand::Mv { id, folder } => {
            session.move_item(&id, &folder)?;
            writeln!(out, "Moved {id} to {folder}.")?;
            Ok(())
        }
        ShellCommand::Cp { id, folder } => {
            let copy = session.copy_item(&id, &folder)?;
            writeln!(out, "Copied {id} to {folder} as {copy}.")?;
            Ok(())
        }
        ShellCommand::Select { ids } => cmd_select(session, out, &ids),
        ShellCommand::SelectAll => {
            session.select_all();
            writeln!(out, "Selected {}.", plural(session.selection().len(), "item"))?;
            Ok(())
        }
        ShellCommand::Unselect => {
            session.clear_selection();
            writeln!(out, "Selection cleared.")?;
            Ok(())
        }
        ShellCommand::Copy { ids } => {
            let ids = targets(session, ids, "copy")?;
            let count = session.copy_items(&ids);
            writeln!(out, "Copied {} to the clipboard.", plural(count, "item"))?;
            Ok(())
        }
        ShellCommand::Cut { ids } => {
            let ids = targets(session, ids, "cut")?;
            let count = session.cut_items(&ids);
            writeln!(out, "Cut {} to the clipboard.", plural(count, "item"))?;
            Ok(())
        }
        ShellCommand::Paste => match session.paste()? {
            Some(outcome) => {
                writeln!(
                    out,
                    "Pasted {} ({}).",
                    plural(outcome.ids.len(), "item"),
                    outcome.action.as_str()
                )?;
                Ok(())
            }
            None => {
                writeln!(out, "Clipboard is empty.")?;
                Ok(())
            }
        },
        ShellCommand::Find { query } => cmd_find(session, renderer, out, &query.join(" ")),
        ShellCommand::Filter { filter } => {
            session.set_search_filter(filter);
            writeln!(out, "Filter: {}.", filter.as_str())?;
            Ok(())
        }
        ShellCommand::Sort { mode } => {
            session.set_sort_mode(mode);
            writeln!(
                out,
                "Sort: {} {}.",
                mode.as_str(),
                session.sort_direction().as_str()
            )?;
            Ok(())
        }
        ShellCommand::Reverse => {
            let direction = session.toggle_sort_direction();
            writeln!(
                out,
                "Sort: {} {}.",
                session.sort_mode().as_str(),
                direction.as_str()
            )?;
            Ok(())
        }
        ShellCommand::Menu { id } => {
            let options = session.menu_options(&id)?;
            renderer.print_menu(out, &options)
        }
        ShellCommand::Do { action, id } => {
            let outcome = session.dispatch(action, id.as_deref())?;
            describe_outcome(out, &outcome)
        }
        ShellCommand::Info { id } => {
            let item = session
                .store()
                .get(&id)
                .ok_or_else(|| StoreError::NotFound(ItemId::from(id.as_str())))?;
            renderer.print_item_info(out, item)
        }
        ShellCommand::Favicon { id } => {
            if !session.store().contains(&id) {
                return Err(StoreError::NotFound(ItemId::from(id)).into());
            }
            let url = session.favicon_url(&id);
            if url.is_empty() {
                writeln!(out, "No favicon.")?;
            } else {
                writeln!(out, "{url}")?;
            }
            Ok(())
        }
    }
}

fn cmd_ls<W: Write>(session: &Session, renderer: &Renderer, out: &mut W) -> anyhow::Result<()> {
    let items = session.current_items();
    renderer.print_listing(out, session, &items)
}

fn cmd_cd<W: Write>(
    session: &mut Session,
    renderer: &Renderer,
    out: &mut W,
    folder: &str,
) -> anyhow::Result<()> {
    match folder {
        ".." => session.navigate_up()?,
        "/" => session.navigate_to(crate::item::ROOT_ID)?,
        other => session.navigate_to(other)?,
    }
    renderer.print_location(out, session)
}

fn cmd_select<W: Write>(session: &mut Session, out: &mut W, ids: &[String]) -> anyhow::Result<()> {
    for id in ids {
        if session.toggle_selection(id)? {
            writeln!(out, "Selected {id}.")?;
        } else {
            writeln!(out, "Unselected {id}.")?;
        }
    }
    Ok(())
}

fn cmd_find<W: Write>(
    session: &mut Session,
    renderer: &Renderer,
    out: &mut W,
    query: &str,
) -> anyhow::Result<()> {
    session.set_search_query(query);
    if !session.is_searching() {
        writeln!(out, "Search cleared.")?;
        return Ok(());
    }
    let results = session.search_results();
    renderer.print_listing(out, session, &results)
}

fn describe_outcome<W: Write>(out: &mut W, outcome: &ActionOutcome) -> anyhow::Result<()> {
    match outcome {
        ActionOutcome::Navigated { folder } => writeln!(out, "Opened folder {folder}.")?,
        ActionOutcome::ConfirmOpen { url, .. } => writeln!(out, "Open {url}? (confirm)")?,
        ActionOutcome::OpenInNewTab { url, .. } => writeln!(out, "Open {url} in a new tab.")?,
        ActionOutcome::RenameRequested { id } => writeln!(out, "Enter a new name for {id}.")?,
        ActionOutcome::Deleted { count } => writeln!(out, "Deleted {}.", plural(*count, "item"))?,
        ActionOutcome::Copied { count } => {
            writeln!(out, "Copied {} to the clipboard.", plural(*count, "item"))?
        }
        ActionOutcome::Cut { count } => {
            writeln!(out, "Cut {} to the clipboard.", plural(*count, "item"))?
        }
        ActionOutcome::Nothing => writeln!(out, "Nothing to do.")?,
    }
    Ok(())
}

fn targets(session: &Session, ids: Vec<String>, verb: &str) -> anyhow::Result<Vec<ItemId>> {
    if !ids.is_empty() {
        return Ok(to_ids(ids));
    }
    if session.selection().is_empty() {
        return Err(anyhow!("nothing to {verb}: pass ids or select items first"));
    }
    Ok(session.selection().ids())
}

fn to_ids(ids: Vec<String>) -> Vec<ItemId> {
    ids.into_iter().map(ItemId::from).collect()
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
