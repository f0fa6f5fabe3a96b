// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: opens the library, the document vault and the
// reading assistant, and exposes the operations the command line runs.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use scanbook_ai::{AiAction, GeminiClient, ReadingAssistant, TextGenerator};
use scanbook_bridge::{CameraSession, PlatformBridge, StreamRequest};
use scanbook_core::AppConfig;
use scanbook_core::error::{Result, ScanbookError};
use scanbook_core::types::{BookId, BookRecord, DEFAULT_TITLE, NoteId, NoteRecord};
use scanbook_document::scan::scanner::ScanPresets;
use scanbook_document::{PdfAssembler, PdfReader, Scanner};
use scanbook_store::{ActiveStore, DocumentVault, Library, LocalStore, RemoteStore};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "library.db";

/// Everything a command needs, opened once at startup.
pub struct AppServices<G: TextGenerator = GeminiClient> {
    library: Library,
    vault: DocumentVault,
    assistant: ReadingAssistant<G>,
    camera: Box<dyn PlatformBridge>,
    config: AppConfig,
}

impl AppServices<GeminiClient> {
    /// Open the services in the user's data directory.
    ///
    /// A missing or unreadable config file means defaults; the defaults are
    /// written back so there is a file to edit.
    pub fn init() -> Result<Self> {
        let dir = data_dir::data_dir()?;
        info!(path = %dir.display(), "initialising app services");

        let config = match load_config(&dir) {
            Some(config) => config,
            None => {
                let config = AppConfig::default();
                if let Err(e) = persist_config(&dir, &config) {
                    warn!(error = %e, "could not write default config");
                }
                config
            }
        };

        let generator = GeminiClient::from_config(&config)?;
        Self::open(&dir, config, generator)
    }
}

impl<G: TextGenerator> AppServices<G> {
    /// Open the services rooted at `dir` with an explicit config and model.
    pub fn open(dir: &Path, config: AppConfig, generator: G) -> Result<Self> {
        let local = LocalStore::open(dir.join(DATABASE_FILE))?;
        let remote = config
            .remote_api_url
            .as_deref()
            .map(|url| RemoteStore::new(url, config.remote_timeout_secs))
            .transpose()?;

        let mut library = Library::new(local, remote);
        let active = library.connect();
        debug!(?active, "library ready");

        Ok(Self {
            library,
            vault: DocumentVault::open(dir)?,
            assistant: ReadingAssistant::new(generator),
            camera: scanbook_bridge::platform_bridge(),
            config,
        })
    }

    /// Which store the library is using right now.
    pub fn active_store(&self) -> ActiveStore {
        self.library.active()
    }

    /// Set while the library server is being bypassed.
    pub fn status_message(&self) -> Option<String> {
        self.library.status_message()
    }

    // -- Scanning -------------------------------------------------------------

    /// A fresh scanning session using the configured presets.
    pub fn scanner(&self) -> Scanner {
        Scanner::new(ScanPresets {
            capture: self.config.capture,
            upload: self.config.upload,
            preview: self.config.thumbnail,
        })
    }

    /// Take `count` stills from the device camera into `scanner`.
    ///
    /// Stills taken before a failure stay in the scanner. The camera is
    /// released when this returns.
    #[instrument(skip(self, scanner))]
    pub fn capture_pages(&self, scanner: &mut Scanner, count: u32) -> Result<()> {
        info!(platform = self.camera.platform_name(), "starting camera");
        let mut session = CameraSession::new(self.camera.as_ref(), StreamRequest::default());
        session.start()?;
        for _ in 0..count {
            scanner.capture(&mut session)?;
        }
        Ok(())
    }

    /// Build the document, keep its bytes and cover in the vault, and
    /// record the book.
    #[instrument(skip(self, scanner))]
    pub fn store_book(&mut self, scanner: Scanner, title: &str, author: &str) -> Result<BookRecord> {
        let mut assembler = PdfAssembler::new(self.config.paper_size);
        let pdf_title = title.trim();
        assembler.set_title(if pdf_title.is_empty() { DEFAULT_TITLE } else { pdf_title });

        let document = scanner.finish(&assembler, self.config.cover_scale)?;
        let file_path = self.vault.store_document(&document.bytes)?;
        let cover_path = self.vault.store_cover(&document.cover.jpeg)?;

        let book = BookRecord::new(
            title,
            author,
            cover_path.display().to_string(),
            file_path.display().to_string(),
        );
        self.library.save_book(&book)?;
        info!(
            book_id = %book.id,
            pages = document.page_count,
            origin = ?document.origin,
            "book stored"
        );
        Ok(book)
    }

    /// Build the document and write it as a standalone PDF, without adding
    /// it to the library.
    ///
    /// `destination` may be a file path or a directory; a directory (or no
    /// destination, meaning the working directory) gets `scan-<millis>.pdf`.
    #[instrument(skip_all)]
    pub fn quick_export(&self, scanner: Scanner, destination: Option<&Path>) -> Result<PathBuf> {
        let assembler = PdfAssembler::new(self.config.paper_size);
        let document = scanner.finish(&assembler, self.config.cover_scale)?;

        let name = format!("scan-{}.pdf", Utc::now().timestamp_millis());
        let path = match destination {
            Some(dest) if dest.is_dir() => dest.join(name),
            Some(dest) => dest.to_path_buf(),
            None => PathBuf::from(name),
        };
        std::fs::write(&path, &document.bytes)?;
        info!(path = %path.display(), pages = document.page_count, "document exported");
        Ok(path)
    }

    // -- Library --------------------------------------------------------------

    pub fn books(&mut self) -> Result<Vec<BookRecord>> {
        self.library.list_books()
    }

    /// Books whose title or author contains `query`, newest first.
    pub fn search_books(&mut self, query: &str) -> Result<Vec<BookRecord>> {
        self.library.search_books(query)
    }

    pub fn notes(&mut self, book_id: &BookId) -> Result<Vec<NoteRecord>> {
        self.library.list_notes(book_id)
    }

    /// Attach a note to a page. Blank notes are ignored and give `None`.
    pub fn add_note(
        &mut self,
        book_id: &BookId,
        page_number: u32,
        content: &str,
    ) -> Result<Option<NoteRecord>> {
        let content = content.trim();
        if content.is_empty() {
            debug!("blank note ignored");
            return Ok(None);
        }
        if page_number == 0 {
            return Err(ScanbookError::InvalidRequest(
                "page numbers start at 1".into(),
            ));
        }
        self.library.find_book(book_id)?;

        let note = NoteRecord::new(*book_id, page_number, content);
        self.library.save_note(&note)?;
        Ok(Some(note))
    }

    pub fn delete_note(&mut self, note_id: &NoteId) -> Result<()> {
        self.library.delete_note(note_id)
    }

    // -- Reading --------------------------------------------------------------

    /// Load a book's PDF from the vault.
    pub fn open_book(&mut self, book_id: &BookId) -> Result<(BookRecord, PdfReader)> {
        let book = self.library.find_book(book_id)?;
        let bytes = self.vault.load(&book.file_path)?;
        let reader = PdfReader::from_bytes(&bytes)?;
        Ok((book, reader))
    }

    /// Plain text of one page (1-based), words joined by single spaces.
    ///
    /// Pages without a text layer are transcribed from their image. An image
    /// that can't be decoded gives an empty string.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub fn page_text(&mut self, book_id: &BookId, page_number: u32) -> Result<String> {
        let (_, reader) = self.open_book(book_id)?;
        let text = join_words(&reader.extract_page_text(page_number)?);
        if !text.is_empty() {
            return Ok(text);
        }

        match reader.page_image_jpeg(page_number) {
            Ok(Some(jpeg)) => {
                info!(page_number, "page has no text layer, transcribing its image");
                self.assistant.transcribe_page(&jpeg)
            }
            Ok(None) => Ok(text),
            Err(err) => {
                warn!(page_number, error = %err, "page image unreadable, no text to show");
                Ok(text)
            }
        }
    }

    /// Run a reading action over one page.
    pub fn ask(&mut self, book_id: &BookId, page_number: u32, action: &AiAction) -> Result<String> {
        let text = self.page_text(book_id, page_number)?;
        self.assistant.run(action, &text)
    }
}

fn join_words(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// -- Config file persistence -------------------------------------------------

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let data = std::fs::read_to_string(data_dir.join(CONFIG_FILE)).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "config file unreadable, using defaults");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(data_dir.join(CONFIG_FILE), json)?;
    Ok(())
}
