// Parsers for the legacy comma-separated chart input

pub mod legacy;
pub mod lexer;

pub use legacy::parse_legacy_axes;
