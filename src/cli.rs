use std::io::{self, BufRead, Write};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use itertools::Itertools;
use log::info;
use thiserror::Error;

use crate::{
    domain::{Category, Note, NoteChanges, ValidationError, validate_title},
    notebook::Notebook,
    storage::{NoteStore, StoreError},
};

const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOTHING_SELECTED: &str = "No note selected!";

#[derive(Parser, Debug)]
#[command(name = "noteapp")]
#[command(about = "Short categorized notes kept in a local JSON file", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Add a note")]
    Add {
        #[arg(help = "Note title (at most 50 characters)")]
        title: String,

        #[arg(long, short, value_enum, default_value_t = Category::Misc)]
        category: Category,

        #[arg(long, default_value = "", help = "Note text")]
        content: String,
    },

    #[command(about = "List all notes")]
    List,

    #[command(about = "Show one note")]
    Show {
        #[arg(help = "Position from `list`")]
        position: usize,
    },

    #[command(about = "Edit a note; omitted fields stay as they are")]
    Edit {
        #[arg(help = "Position from `list`")]
        position: usize,

        #[arg(long, help = "New title")]
        title: Option<String>,

        #[arg(long, short, value_enum, help = "New category")]
        category: Option<Category>,

        #[arg(long, help = "New text")]
        content: Option<String>,
    },

    #[command(about = "Remove a note")]
    Remove {
        #[arg(help = "Position from `list`")]
        position: usize,

        #[arg(long, short, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "List the available categories")]
    Categories,

    #[command(about = "Print the notes file location")]
    Path,

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum, help = "Shell type")]
        shell: Shell,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    execute(
        cli.command,
        &NoteStore::default_location(),
        &mut input,
        &mut out,
    )
}

/// Runs one command against `store`, reading confirmations from `input`.
/// The notes file is only opened by commands that work on notes.
pub fn execute(
    command: Command,
    store: &NoteStore,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Add {
            title,
            category,
            content,
        } => add_note(&mut open(store)?, &title, category, &content, out),
        Command::List => list_notes(&open(store)?, out),
        Command::Show { position } => show_note(&open(store)?, position, out),
        Command::Edit {
            position,
            title,
            category,
            content,
        } => edit_note(&mut open(store)?, position, title, category, content, out),
        Command::Remove { position, yes } => {
            remove_note(&mut open(store)?, position, yes, input, out)
        }
        Command::Categories => list_categories(out),
        Command::Path => {
            writeln!(out, "{}", store.path().display())?;
            Ok(())
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "noteapp", out);
            Ok(())
        }
    }
}

fn open(store: &NoteStore) -> Result<Notebook, CliError> {
    Ok(Notebook::open(store.clone())?)
}

fn add_note(
    notebook: &mut Notebook,
    title: &str,
    category: Category,
    content: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let title = validate_title(title)?;
    let index = notebook.add(Note::new(title, category, content.trim()))?;
    info!("event=note_add status=ok index={}", index);

    writeln!(out, "Added note {}: {} ({})", index + 1, title, category)?;
    Ok(())
}

fn list_notes(notebook: &Notebook, out: &mut impl Write) -> Result<(), CliError> {
    if notebook.project().is_empty() {
        writeln!(out, "No notes yet.")?;
        return Ok(());
    }

    let listing = notebook
        .project()
        .iter()
        .enumerate()
        .map(|(index, note)| format!("{}. {}", index + 1, list_label(note)))
        .join("\n");
    writeln!(out, "{}", listing)?;
    Ok(())
}

fn show_note(notebook: &Notebook, position: usize, out: &mut impl Write) -> Result<(), CliError> {
    let Some(note) = position_to_index(position).and_then(|index| notebook.project().get(index))
    else {
        writeln!(out, "{}", NOTHING_SELECTED)?;
        return Ok(());
    };

    writeln!(out, "Title: {}", note.title())?;
    writeln!(out, "Category: {}", note.category())?;
    writeln!(
        out,
        "Created: {}",
        note.created_at().format(TIMESTAMP_DISPLAY_FORMAT)
    )?;
    writeln!(
        out,
        "Updated: {}",
        note.updated_at().format(TIMESTAMP_DISPLAY_FORMAT)
    )?;
    if !note.content().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", note.content())?;
    }
    Ok(())
}

fn edit_note(
    notebook: &mut Notebook,
    position: usize,
    title: Option<String>,
    category: Option<Category>,
    content: Option<String>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let title = title
        .as_deref()
        .map(validate_title)
        .transpose()?
        .map(str::to_string);
    let changes = NoteChanges {
        title,
        category,
        content: content.map(|content| content.trim().to_string()),
    };

    let edited = match position_to_index(position) {
        Some(index) => notebook.edit(index, changes)?,
        None => false,
    };
    if !edited {
        writeln!(out, "{}", NOTHING_SELECTED)?;
        return Ok(());
    }

    info!("event=note_edit status=ok position={}", position);
    writeln!(out, "Updated note {}", position)?;
    Ok(())
}

fn remove_note(
    notebook: &mut Notebook,
    position: usize,
    yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let Some((index, title)) = position_to_index(position).and_then(|index| {
        notebook
            .project()
            .get(index)
            .map(|note| (index, note.title().to_string()))
    }) else {
        writeln!(out, "{}", NOTHING_SELECTED)?;
        return Ok(());
    };

    if !yes {
        let prompt = format!("Do you really want to remove this note: {}?", title);
        if !confirm(&prompt, input, out)? {
            writeln!(out, "Kept note {}", position)?;
            return Ok(());
        }
    }

    if notebook.remove(index)?.is_some() {
        info!("event=note_remove status=ok position={}", position);
        writeln!(out, "Removed note {}: {}", position, title)?;
    }
    Ok(())
}

fn list_categories(out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "{}", Category::ALL.iter().join("\n"))?;
    Ok(())
}

fn list_label(note: &Note) -> String {
    format!("{} ({})", note.title(), note.category())
}

/// Positions shown to the user start at 1; `0` selects nothing.
fn position_to_index(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

fn confirm(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
