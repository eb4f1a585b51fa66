//! Ingestion core for Indonesian statutes: classify page lines, fold them
//! into article/paragraph items, validate structure, and cut token-bounded
//! chunks for embedding.

pub mod chunker;
pub mod embedding;
pub mod error;
pub mod model;
pub mod parser;
pub mod rules;
pub mod util;
pub mod validation;
