// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider-neutral text generation interface.

use scanbook_core::error::Result;

/// One piece of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'a> {
    Text(&'a str),
    /// A JPEG image, sent inline.
    Jpeg(&'a [u8]),
}

/// Something that can complete a prompt.
///
/// Implementations make a single attempt; failures come back as
/// `ScanbookError::Ai` and are not retried.
pub trait TextGenerator {
    fn generate(&self, parts: &[Part<'_>]) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;

    use scanbook_core::error::{Result, ScanbookError};

    use super::{Part, TextGenerator};

    /// Records prompts and replies with a canned answer (or fails).
    pub struct MockGenerator {
        reply: Option<String>,
        pub prompts: RefCell<Vec<String>>,
        pub images: RefCell<usize>,
    }

    impl MockGenerator {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: RefCell::new(Vec::new()),
                images: RefCell::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                prompts: RefCell::new(Vec::new()),
                images: RefCell::new(0),
            }
        }
    }

    impl TextGenerator for MockGenerator {
        fn generate(&self, parts: &[Part<'_>]) -> Result<String> {
            for part in parts {
                match part {
                    Part::Text(text) => self.prompts.borrow_mut().push(text.to_string()),
                    Part::Jpeg(_) => *self.images.borrow_mut() += 1,
                }
            }
            self.reply
                .clone()
                .ok_or_else(|| ScanbookError::Ai("mock failure".into()))
        }
    }
}
