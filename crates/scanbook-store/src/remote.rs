// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book store client for the library REST API.
//
//   GET    /api/books               all books, newest first
//   POST   /api/books               create a book
//   GET    /api/books/{id}/notes    notes of a book, by page
//   POST   /api/notes               create a note
//   DELETE /api/notes/{id}          delete a note

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::{debug, info, instrument};

use scanbook_core::error::{Result, ScanbookError};
use scanbook_core::types::{BookId, BookRecord, NoteId, NoteRecord};

use crate::store::BookStore;

/// HTTP client for a remote library server.
pub struct RemoteStore {
    base_url: String,
    client: Client,
    timeout_secs: u64,
}

impl RemoteStore {
    /// Client for the server at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScanbookError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cheap reachability check used to pick the active store.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub fn ping(&self) -> Result<()> {
        self.send(self.client.get(self.url("/api/books")))?;
        info!("remote store reachable");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, turning transport failures and non-2xx answers into
    /// network errors.
    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().map_err(|e| {
            if e.is_connect() {
                ScanbookError::Network(format!("cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                ScanbookError::Network(format!("request timed out after {}s", self.timeout_secs))
            } else {
                ScanbookError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ScanbookError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.client.get(self.url(path)))?
            .json()
            .map_err(|e| ScanbookError::Network(format!("invalid response from {path}: {e}")))
    }
}

impl BookStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self))]
    fn list_books(&self) -> Result<Vec<BookRecord>> {
        let books: Vec<BookRecord> = self.get_json("/api/books")?;
        debug!(count = books.len(), "listed remote books");
        Ok(books)
    }

    #[instrument(skip(self, book), fields(book_id = %book.id))]
    fn save_book(&self, book: &BookRecord) -> Result<()> {
        self.send(self.client.post(self.url("/api/books")).json(book))?;
        info!(title = %book.title, "book saved remotely");
        Ok(())
    }

    #[instrument(skip(self), fields(book_id = %book_id))]
    fn list_notes(&self, book_id: &BookId) -> Result<Vec<NoteRecord>> {
        self.get_json(&format!("/api/books/{book_id}/notes"))
    }

    #[instrument(skip(self, note), fields(note_id = %note.id))]
    fn save_note(&self, note: &NoteRecord) -> Result<()> {
        self.send(self.client.post(self.url("/api/notes")).json(note))?;
        debug!("note saved remotely");
        Ok(())
    }

    #[instrument(skip(self), fields(note_id = %note_id))]
    fn delete_note(&self, note_id: &NoteId) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/api/notes/{note_id}"))))?;
        debug!("note deleted remotely");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nothing listens on port 1, so connections are refused immediately.
    const DEAD_SERVER: &str = "http://127.0.0.1:1";

    #[test]
    fn trims_trailing_slash() {
        let store = RemoteStore::new("http://localhost:3000/", 5).expect("client");
        assert_eq!(store.base_url(), "http://localhost:3000");
        assert_eq!(store.url("/api/books"), "http://localhost:3000/api/books");
    }

    #[test]
    fn unreachable_server_is_a_network_error() {
        let store = RemoteStore::new(DEAD_SERVER, 2).expect("client");
        let err = store.list_books().expect_err("no server");
        assert!(err.is_network(), "got {err:?}");
        assert!(store.ping().expect_err("no server").is_network());
    }

    #[test]
    fn writes_fail_as_network_errors_too() {
        let store = RemoteStore::new(DEAD_SERVER, 2).expect("client");
        let book = BookRecord::new("t", "a", "", "");
        assert!(store.save_book(&book).expect_err("no server").is_network());
        assert!(store.delete_note(&NoteId::new()).expect_err("no server").is_network());
    }
}
