pub mod aggregate;
pub mod enrich;
pub mod filter;
pub mod grounding;
pub mod parse;
