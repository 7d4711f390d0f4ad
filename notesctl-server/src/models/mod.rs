//! Domain models
//!
//! Request input is validated when these types are built;
//! invalid input returns ValidationError, not panic.

pub mod listing;
pub mod note;
pub mod validation;

pub use listing::{clamp_limit, Cursor, ListParams, ListStrategy, NotePage, DEFAULT_LIMIT, MAX_LIMIT};
pub use note::{format_timestamp, Note, NoteContent, NoteId, NoteTitle};
pub use validation::ValidationError;
