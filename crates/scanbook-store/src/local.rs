// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local book and note store backed by SQLite.
//
// Holds metadata only. The PDF and cover bytes live in the document vault
// and are referenced by path from `file_path` and `cover_url`.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use scanbook_core::error::{Result, ScanbookError};
use scanbook_core::types::{BookId, BookRecord, NoteId, NoteRecord, timestamp};

use crate::store::BookStore;

/// SQLite schema for books and notes. Column names follow the REST API.
const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        cover_url TEXT NOT NULL DEFAULT '',
        file_path TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL REFERENCES books(id),
        page_number INTEGER NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        highlight_data TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS notes_by_book ON notes (book_id, page_number);
"#;

/// Book store in a local SQLite file.
///
/// All methods are synchronous; `rusqlite` does no I/O in the background.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open (or create) the database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| ScanbookError::Database(format!("open: {e}")))?;

        // WAL survives an interrupted write without losing the library.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| ScanbookError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| ScanbookError::Database(format!("create tables: {e}")))?;

        info!("library database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScanbookError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| ScanbookError::Database(format!("create tables: {e}")))?;

        debug!("in-memory library database opened");
        Ok(Self { conn })
    }
}

impl BookStore for LocalStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    #[instrument(skip(self))]
    fn list_books(&self) -> Result<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, author, cover_url, file_path, created_at
                 FROM books ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| ScanbookError::Database(format!("prepare list_books: {e}")))?;

        let books = stmt
            .query_map([], row_to_book)
            .map_err(|e| ScanbookError::Database(format!("query list_books: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ScanbookError::Database(format!("collect rows: {e}")))?;

        debug!(count = books.len(), "listed books");
        Ok(books)
    }

    #[instrument(skip(self, book), fields(book_id = %book.id))]
    fn save_book(&self, book: &BookRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO books (id, title, author, cover_url, file_path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    book.id.to_string(),
                    book.title,
                    book.author,
                    book.cover_url,
                    book.file_path,
                    sortable(&book.created_at),
                ],
            )
            .map_err(|e| ScanbookError::Database(format!("insert book: {e}")))?;

        info!(title = %book.title, "book saved locally");
        Ok(())
    }

    #[instrument(skip(self), fields(book_id = %book_id))]
    fn list_notes(&self, book_id: &BookId) -> Result<Vec<NoteRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, book_id, page_number, content, highlight_data, created_at
                 FROM notes WHERE book_id = ?1 ORDER BY page_number ASC, created_at ASC",
            )
            .map_err(|e| ScanbookError::Database(format!("prepare list_notes: {e}")))?;

        let notes = stmt
            .query_map(params![book_id.to_string()], row_to_note)
            .map_err(|e| ScanbookError::Database(format!("query list_notes: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ScanbookError::Database(format!("collect rows: {e}")))?;

        debug!(count = notes.len(), "listed notes");
        Ok(notes)
    }

    #[instrument(skip(self, note), fields(note_id = %note.id, page = note.page_number))]
    fn save_note(&self, note: &NoteRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO notes (id, book_id, page_number, content, highlight_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    note.id.to_string(),
                    note.book_id.to_string(),
                    note.page_number,
                    note.content,
                    note.highlight_data,
                    sortable(&note.created_at),
                ],
            )
            .map_err(|e| ScanbookError::Database(format!("insert note: {e}")))?;

        debug!("note saved locally");
        Ok(())
    }

    #[instrument(skip(self), fields(note_id = %note_id))]
    fn delete_note(&self, note_id: &NoteId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![note_id.to_string()])
            .map_err(|e| ScanbookError::Database(format!("delete note: {e}")))?;

        debug!(rows, "note delete applied");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Fixed-width UTC timestamps sort correctly as text.
fn sortable(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    timestamp::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}

/// Column order must match the SELECT in `list_books`.
fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookRecord> {
    let id_str: String = row.get(0)?;
    let created_at_str: String = row.get(5)?;

    let id = uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;

    Ok(BookRecord {
        id: BookId(id),
        title: row.get(1)?,
        author: row.get(2)?,
        cover_url: row.get(3)?,
        file_path: row.get(4)?,
        created_at: parse_timestamp(5, &created_at_str)?,
    })
}

/// Column order must match the SELECT in `list_notes`.
fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRecord> {
    let id_str: String = row.get(0)?;
    let book_id_str: String = row.get(1)?;
    let highlight_data: Option<String> = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    let id = uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let book_id = uuid::Uuid::parse_str(&book_id_str).map_err(|e| conversion_error(1, e))?;

    Ok(NoteRecord {
        id: NoteId(id),
        book_id: BookId(book_id),
        page_number: row.get(2)?,
        content: row.get(3)?,
        highlight_data: highlight_data.unwrap_or_default(),
        created_at: parse_timestamp(5, &created_at_str)?,
    })
}
