// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page placement, page composition, document assembly, and
// read-back inspection.

pub mod compose;
pub mod layout;
pub mod reader;
pub mod writer;

pub use compose::PageComposer;
pub use layout::PageLayoutEngine;
pub use reader::PdfReader;
pub use writer::DocumentAssembler;
