// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: image intake from files and the camera, the ordered
// sequence of pending pages, and the scanner that ties them to assembly.

pub mod scanner;
pub mod sequence;
pub mod source;

pub use scanner::{Intake, Scanner};
pub use sequence::{PageSequence, PendingPage};
pub use source::{Selection, SelectedFile};
