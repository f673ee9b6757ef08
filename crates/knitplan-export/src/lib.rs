//! knitplan-export: Pure format serializers (sans-IO)
//!
//! Converts generated patterns into output documents. Currently supports
//! plain text.

pub mod text;

pub use text::{TextMetadata, piece_to_text, rows_from_text, to_text};
