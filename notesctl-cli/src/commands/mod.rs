//! Command implementations for notesctl CLI

pub mod serve;

pub use serve::run_serve;
