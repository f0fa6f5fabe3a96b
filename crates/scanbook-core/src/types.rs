// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanbook library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(pub Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Title used when the user leaves the title blank.
pub const DEFAULT_TITLE: &str = "Untitled Scan";

/// Author used when the user leaves the author blank.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// A stored book. Field names match the REST API's JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Where the cover thumbnail lives.
    #[serde(default)]
    pub cover_url: String,
    /// Where the PDF document lives.
    #[serde(default)]
    pub file_path: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl BookRecord {
    /// Build a new record, substituting defaults for blank metadata.
    pub fn new(
        title: &str,
        author: &str,
        cover_url: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        let title = title.trim();
        let author = author.trim();
        Self {
            id: BookId::new(),
            title: if title.is_empty() { DEFAULT_TITLE } else { title }.to_string(),
            author: if author.is_empty() { DEFAULT_AUTHOR } else { author }.to_string(),
            cover_url: cover_url.into(),
            file_path: file_path.into(),
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive substring match on title or author. A blank query
    /// matches every book.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
    }
}

/// A note attached to one page of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub book_id: BookId,
    /// 1-based page number.
    pub page_number: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub highlight_data: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl NoteRecord {
    pub fn new(book_id: BookId, page_number: u32, content: impl Into<String>) -> Self {
        Self {
            id: NoteId::new(),
            book_id,
            page_number,
            content: content.into(),
            highlight_data: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Bmp,
    Webp,
    Gif,
}

impl DocumentType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Sniff the type from leading magic bytes.
    pub fn from_magic(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if data.starts_with(b"GIF8") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// PDF points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Standard paper sizes for assembled documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (width, height).
    ///
    /// US sizes are defined in inches, so they come out exact rather than
    /// via their rounded millimetre figures.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            _ => {
                let (w, h) = self.dimensions_mm();
                (w as f32 * PT_PER_MM, h as f32 * PT_PER_MM)
            }
        }
    }
}

/// Where an assembled document's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOrigin {
    /// Built from a sequence of captured or uploaded images.
    Assembled,
    /// An uploaded PDF passed through verbatim.
    PassThrough,
}

/// Viewer zoom factor, clamped to the range the reader supports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom(f32);

impl Zoom {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const STEP: f32 = 0.2;

    pub fn new(factor: f32) -> Self {
        Self(factor.clamp(Self::MIN, Self::MAX))
    }

    pub fn factor(&self) -> f32 {
        self.0
    }

    pub fn zoom_in(self) -> Self {
        Self::new(self.0 + Self::STEP)
    }

    pub fn zoom_out(self) -> Self {
        Self::new(self.0 - Self::STEP)
    }

    /// Rounded percentage for display.
    pub fn percent(&self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(1.5)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps are written as RFC 3339 but read leniently: SQLite's
/// `CURRENT_TIMESTAMP` format (`YYYY-MM-DD HH:MM:SS`, UTC) is accepted too.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Parse either RFC 3339 or SQLite's default timestamp format.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, SQLITE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_metadata_gets_defaults() {
        let book = BookRecord::new("  ", "", "cover.jpg", "doc.pdf");
        assert_eq!(book.title, DEFAULT_TITLE);
        assert_eq!(book.author, DEFAULT_AUTHOR);
    }

    #[test]
    fn search_matches_title_or_author() {
        let book = BookRecord::new("The Art of Fermentation", "Sandor Katz", "", "");
        assert!(book.matches("fermENT"));
        assert!(book.matches(" katz "));
        assert!(book.matches(""));
        assert!(!book.matches("sourdough"));
    }

    #[test]
    fn book_json_uses_rest_field_names() {
        let book = BookRecord::new("Dune", "Herbert", "c", "f");
        let json = serde_json::to_value(&book).expect("serialize");
        assert_eq!(json["title"], "Dune");
        assert_eq!(json["cover_url"], "c");
        assert_eq!(json["file_path"], "f");
        assert_eq!(json["id"], book.id.to_string());
    }

    #[test]
    fn note_accepts_sqlite_timestamp_and_null_highlight() {
        let book_id = BookId::new();
        let raw = format!(
            r#"{{"id":"{}","book_id":"{}","page_number":3,"content":"hi","highlight_data":null,"created_at":"2024-05-01 10:20:30"}}"#,
            NoteId::new(),
            book_id
        );
        let note: NoteRecord = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(note.book_id, book_id);
        assert_eq!(note.page_number, 3);
        assert!(note.highlight_data.is_empty());
        assert_eq!(note.created_at.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }

    #[test]
    fn magic_bytes_detect_pdf_and_jpeg() {
        assert_eq!(DocumentType::from_magic(b"%PDF-1.5\n"), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(DocumentType::Jpeg));
        assert_eq!(DocumentType::from_magic(b"hello"), None);
    }

    #[test]
    fn a4_in_points() {
        let (w, h) = PaperSize::A4.dimensions_pt();
        assert!((w - 595.28).abs() < 0.1);
        assert!((h - 841.89).abs() < 0.1);
    }

    #[test]
    fn us_sizes_are_exact_points() {
        assert_eq!(PaperSize::Letter.dimensions_pt(), (612.0, 792.0));
        assert_eq!(PaperSize::Legal.dimensions_pt(), (612.0, 1008.0));
    }

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(Zoom::default().percent(), 150);
        assert_eq!(Zoom::new(10.0).factor(), Zoom::MAX);
        let mut zoom = Zoom::new(0.6);
        zoom = zoom.zoom_out().zoom_out();
        assert_eq!(zoom.factor(), Zoom::MIN);
    }
}
