// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reader actions and their prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

use scanbook_core::error::{Result, ScanbookError};

/// What the reader asked the assistant to do with a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "question", rename_all = "lowercase")]
pub enum AiAction {
    Summarize,
    Explain,
    /// Answer a question using the page as context.
    Answer(String),
}

impl AiAction {
    /// Build an action from its name, e.g. from the command line. `answer`
    /// needs a non-blank question.
    pub fn parse(kind: &str, question: Option<&str>) -> Result<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "summarize" | "summarise" => Ok(Self::Summarize),
            "explain" => Ok(Self::Explain),
            "answer" | "ask" => match question.map(str::trim) {
                Some(q) if !q.is_empty() => Ok(Self::Answer(q.to_string())),
                _ => Err(ScanbookError::InvalidRequest(
                    "answer needs a question".into(),
                )),
            },
            other => Err(ScanbookError::InvalidRequest(format!(
                "unknown action '{other}' (expected summarize, explain or answer)"
            ))),
        }
    }

    /// The prompt sent to the model for `text`.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            Self::Summarize => format!(
                "Summarize the following text concisely, focusing on key takeaways:\n\n{text}"
            ),
            Self::Explain => {
                format!("Explain this paragraph in simple terms for a student:\n\n{text}")
            }
            Self::Answer(question) => format!(
                "Based on the following context, answer the question: \"{question}\"\n\nContext:\n{text}"
            ),
        }
    }

    /// What the reader sees when the model call fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Answer(_) => "Failed to answer.",
            _ => "AI failed to process. Please try again.",
        }
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summarize => f.write_str("summarize"),
            Self::Explain => f.write_str("explain"),
            Self::Answer(_) => f.write_str("answer"),
        }
    }
}
