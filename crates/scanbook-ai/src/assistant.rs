// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reading assistant: summaries, explanations, answers and transcriptions
// for the page the reader is looking at.

use tracing::{info, instrument, warn};

use scanbook_core::error::{Result, ScanbookError};

use crate::actions::AiAction;
use crate::generator::{Part, TextGenerator};

const TRANSCRIBE_PROMPT: &str =
    "Extract all text from this image. Maintain the layout as much as possible.";

pub struct ReadingAssistant<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> ReadingAssistant<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Run `action` over the extracted text of a page.
    ///
    /// A page with no text is rejected before anything is sent. Model
    /// failures are returned once; the caller shows
    /// [`AiAction::failure_message`].
    #[instrument(skip(self, page_text), fields(action = %action, chars = page_text.len()))]
    pub fn run(&self, action: &AiAction, page_text: &str) -> Result<String> {
        let text = page_text.trim();
        if text.is_empty() {
            return Err(ScanbookError::InvalidRequest(
                "this page has no text to work with".into(),
            ));
        }

        let prompt = action.prompt(text);
        match self.generator.generate(&[Part::Text(&prompt)]) {
            Ok(reply) => {
                info!(chars = reply.len(), "assistant replied");
                Ok(reply)
            }
            Err(err) => {
                warn!(error = %err, "assistant request failed");
                Err(err)
            }
        }
    }

    /// Read the text off a scanned page image.
    #[instrument(skip_all, fields(bytes = jpeg.len()))]
    pub fn transcribe_page(&self, jpeg: &[u8]) -> Result<String> {
        if jpeg.is_empty() {
            return Err(ScanbookError::InvalidRequest("empty page image".into()));
        }
        let text = self
            .generator
            .generate(&[Part::Text(TRANSCRIBE_PROMPT), Part::Jpeg(jpeg)])?;
        info!(chars = text.len(), "page transcribed");
        Ok(text)
    }
}
