// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Library: the remote store while it answers, the local store otherwise.
//
// Records written locally while the server is away stay local; nothing is
// synchronised back.

use tracing::{debug, info, instrument, warn};

use scanbook_core::error::{Result, ScanbookError};
use scanbook_core::types::{BookId, BookRecord, NoteId, NoteRecord};

use crate::health::{CircuitState, RemoteHealth};
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::store::BookStore;

/// Which store operations currently go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveStore {
    Remote,
    Local,
}

/// Book and note access with remote-first, local-fallback behaviour.
pub struct Library {
    local: LocalStore,
    remote: Option<RemoteStore>,
    health: RemoteHealth,
}

impl Library {
    pub fn new(local: LocalStore, remote: Option<RemoteStore>) -> Self {
        Self {
            local,
            remote,
            health: RemoteHealth::new(),
        }
    }

    /// Local-only library.
    pub fn local_only(local: LocalStore) -> Self {
        Self::new(local, None)
    }

    /// Check the remote store and decide which store is active.
    #[instrument(skip(self))]
    pub fn connect(&mut self) -> ActiveStore {
        let Some(remote) = &self.remote else {
            info!("no remote store configured, using local store");
            return ActiveStore::Local;
        };

        match remote.ping() {
            Ok(()) => {
                self.health.record_success();
                ActiveStore::Remote
            }
            Err(err) => {
                warn!(error = %err, "remote store unavailable, using local store");
                self.health.trip(&err.to_string());
                ActiveStore::Local
            }
        }
    }

    /// The store the next operation will try first.
    pub fn active(&self) -> ActiveStore {
        match (&self.remote, self.health.state()) {
            (Some(_), CircuitState::Closed | CircuitState::HalfOpen) => ActiveStore::Remote,
            _ => ActiveStore::Local,
        }
    }

    /// User-facing note while the remote store is being bypassed.
    pub fn status_message(&self) -> Option<String> {
        self.remote.as_ref().and_then(|_| self.health.status_message())
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    // -- Records --------------------------------------------------------------

    pub fn list_books(&mut self) -> Result<Vec<BookRecord>> {
        self.with_fallback("list_books", |store| store.list_books())
    }

    /// Books whose title or author contains `query`, ignoring case, in
    /// listing order. A blank query returns every book.
    pub fn search_books(&mut self, query: &str) -> Result<Vec<BookRecord>> {
        let mut books = self.list_books()?;
        books.retain(|book| book.matches(query));
        debug!(query, hits = books.len(), "library searched");
        Ok(books)
    }

    pub fn save_book(&mut self, book: &BookRecord) -> Result<()> {
        self.with_fallback("save_book", |store| store.save_book(book))
    }

    pub fn list_notes(&mut self, book_id: &BookId) -> Result<Vec<NoteRecord>> {
        self.with_fallback("list_notes", |store| store.list_notes(book_id))
    }

    pub fn save_note(&mut self, note: &NoteRecord) -> Result<()> {
        self.with_fallback("save_note", |store| store.save_note(note))
    }

    pub fn delete_note(&mut self, note_id: &NoteId) -> Result<()> {
        self.with_fallback("delete_note", |store| store.delete_note(note_id))
    }

    /// Look a book up by id.
    pub fn find_book(&mut self, book_id: &BookId) -> Result<BookRecord> {
        self.list_books()?
            .into_iter()
            .find(|book| book.id == *book_id)
            .ok_or_else(|| ScanbookError::NotFound(format!("book {book_id}")))
    }

    /// Run `op` against the remote store if it is usable, and against the
    /// local store if it is not or the attempt fails on the network. Other
    /// remote errors are returned unchanged.
    fn with_fallback<T>(
        &mut self,
        op: &'static str,
        run: impl Fn(&dyn BookStore) -> Result<T>,
    ) -> Result<T> {
        if let Some(remote) = &self.remote {
            if self.health.allow_request() {
                match run(remote) {
                    Ok(value) => {
                        self.health.record_success();
                        return Ok(value);
                    }
                    Err(err) if err.is_network() => {
                        warn!(op, store = remote.name(), error = %err, "remote store failed, falling back to local store");
                        self.health.record_failure(&err.to_string());
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        debug!(op, store = self.local.name(), "using local store");
        run(&self.local)
    }
}
