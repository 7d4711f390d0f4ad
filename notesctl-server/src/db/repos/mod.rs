//! Repository implementations for database access
//!
//! Every read path maps rows through `scanner`, so a malformed row
//! surfaces as an error instead of being skipped.

pub mod notes;
pub mod scanner;

pub use notes::{NoteRepo, PreparedStatements};
pub use scanner::{scan_note, scan_notes};
