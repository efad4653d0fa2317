//! Resume ingestion — upload, text extraction and field extraction.

pub mod extractor;
pub mod handlers;
pub mod prompts;
pub mod text;
