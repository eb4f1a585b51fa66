pub mod chunk;
pub mod parse;
pub mod status;
