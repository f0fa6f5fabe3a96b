// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanbook — scan pages or import PDFs into a personal library.
//
// Entry point. Initialises logging, opens the backend services, and runs one
// command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use scanbook_ai::AiAction;
use scanbook_core::error::{Result, ScanbookError};
use scanbook_core::human_errors::humanize_error;
use scanbook_core::types::{BookId, NoteId};
use scanbook_document::{Intake, SelectedFile};

use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "scanbook")]
#[command(version)]
#[command(about = "Scan pages or import PDFs into your library, with notes and reading help", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn images (or a single PDF) into a book in the library
    Scan {
        /// Image files, or one PDF to import as-is
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Number of pages to capture from the camera after the files. Needs a
        /// native camera backend; the desktop build has none.
        #[arg(long, value_name = "N", default_value_t = 0)]
        camera: u32,

        /// Book title (defaults to the PDF's file name, or "Untitled Scan")
        #[arg(long, default_value = "")]
        title: String,

        /// Book author
        #[arg(long, default_value = "")]
        author: String,
    },

    /// Build a PDF from images without adding it to the library
    Export {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output file or directory (default: scan-<millis>.pdf here)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// List books, newest first
    Books {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Only books whose title or author contains this text
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,
    },

    /// Page notes
    Notes {
        #[command(subcommand)]
        command: NotesCommand,
    },

    /// Print the text of one page
    Text {
        book_id: BookId,
        /// 1-based page number
        page: u32,
    },

    /// Ask the reading assistant about one page
    Ask {
        book_id: BookId,
        /// 1-based page number
        page: u32,

        #[arg(value_parser = ["summarize", "explain", "answer"])]
        action: String,

        /// Question for `answer`
        #[arg(short, long)]
        question: Option<String>,
    },
}

#[derive(Subcommand)]
enum NotesCommand {
    /// Notes of a book, by page
    List { book_id: BookId },

    /// Attach a note to a page
    Add {
        book_id: BookId,
        page: u32,
        content: String,
    },

    /// Delete a note
    Delete { note_id: NoteId },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut services = AppServices::init()?;
    tracing::debug!(store = ?services.active_store(), "library store selected");

    let code = match cli.command {
        Command::Scan {
            files,
            camera,
            title,
            author,
        } => {
            let mut scanner = services.scanner();
            let mut title = title;
            if let Intake::Pdf(stem) = scanner.add_files(read_files(&files)?)? {
                if title.trim().is_empty() {
                    title = stem;
                }
            }

            if camera > 0 {
                if let Err(err) = services.capture_pages(&mut scanner, camera) {
                    if scanner.pages().is_empty() && scanner.imported_pdf().is_none() {
                        return Err(err);
                    }
                    report(&err);
                }
            }

            let book = services.store_book(scanner, &title, &author)?;
            println!("Saved \"{}\" by {} ({})", book.title, book.author, book.id);
            ExitCode::SUCCESS
        }

        Command::Export { files, output } => {
            let mut scanner = services.scanner();
            scanner.add_files(read_files(&files)?)?;
            let path = services.quick_export(scanner, output.as_deref())?;
            println!("{}", path.display());
            ExitCode::SUCCESS
        }

        Command::Books { json, search } => {
            let books = match search.as_deref() {
                Some(query) => services.search_books(query)?,
                None => services.books()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else if books.is_empty() {
                if search.is_some() {
                    println!("No matching books.");
                } else {
                    println!("No books yet.");
                }
            } else {
                for book in &books {
                    println!(
                        "{}  {}  {} by {}",
                        book.id,
                        book.created_at.format("%Y-%m-%d"),
                        book.title,
                        book.author
                    );
                }
            }
            ExitCode::SUCCESS
        }

        Command::Notes { command } => {
            match command {
                NotesCommand::List { book_id } => {
                    for note in services.notes(&book_id)? {
                        println!("p.{:<4} {}  {}", note.page_number, note.id, note.content);
                    }
                }
                NotesCommand::Add {
                    book_id,
                    page,
                    content,
                } => match services.add_note(&book_id, page, &content)? {
                    Some(note) => println!("{}", note.id),
                    None => println!("Nothing to save."),
                },
                NotesCommand::Delete { note_id } => services.delete_note(&note_id)?,
            }
            ExitCode::SUCCESS
        }

        Command::Text { book_id, page } => {
            println!("{}", services.page_text(&book_id, page)?);
            ExitCode::SUCCESS
        }

        Command::Ask {
            book_id,
            page,
            action,
            question,
        } => {
            let action = AiAction::parse(&action, question.as_deref())?;
            match services.ask(&book_id, page, &action) {
                Ok(reply) => {
                    println!("{reply}");
                    ExitCode::SUCCESS
                }
                Err(ScanbookError::Ai(detail)) => {
                    tracing::error!(%detail, %action, "assistant failed");
                    eprintln!("{}", action.failure_message());
                    ExitCode::FAILURE
                }
                Err(err) => return Err(err),
            }
        }
    };

    if let Some(status) = services.status_message() {
        eprintln!("{status}");
    }
    Ok(code)
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    paths.iter().map(|path| SelectedFile::read(path)).collect()
}

/// Print a failure the way a reader should see it.
fn report(err: &ScanbookError) {
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
}
