// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The persistence seam shared by the local and remote stores.

use scanbook_core::error::Result;
use scanbook_core::types::{BookId, BookRecord, NoteId, NoteRecord};

/// Book and note records.
///
/// Implementations differ in where the data lives, not in what they return:
/// books newest first, a book's notes by ascending page number.
pub trait BookStore {
    /// Short name for logs ("sqlite", "remote").
    fn name(&self) -> &str;

    fn list_books(&self) -> Result<Vec<BookRecord>>;

    fn save_book(&self, book: &BookRecord) -> Result<()>;

    fn list_notes(&self, book_id: &BookId) -> Result<Vec<NoteRecord>>;

    fn save_note(&self, note: &NoteRecord) -> Result<()>;

    /// Deleting a note that does not exist succeeds.
    fn delete_note(&self, note_id: &NoteId) -> Result<()>;
}
