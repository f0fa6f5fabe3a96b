// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanbook-ai — Page text in, generated text out.
//
// `TextGenerator` is the seam to the model provider; `GeminiClient` is the
// HTTP implementation. `ReadingAssistant` turns reader actions into prompts.

pub mod actions;
pub mod assistant;
pub mod gemini;
pub mod generator;

pub use actions::AiAction;
pub use assistant::ReadingAssistant;
pub use gemini::GeminiClient;
pub use generator::{Part, TextGenerator};
